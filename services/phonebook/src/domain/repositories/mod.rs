//! Repository trait 定义

mod phone_number_repository;
mod user_repository;

pub use phone_number_repository::{PhoneNumberRepository, UpsertOutcome};
pub use user_repository::UserRepository;
