//! 领域服务

pub mod ranking;

pub use ranking::rank_by_distance;
