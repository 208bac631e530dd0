//! 持久化实现

mod memory;
mod migrations;
mod postgres_phone_number_repository;
mod postgres_user_repository;

pub use memory::{InMemoryPhoneNumberRepository, InMemoryUserRepository};
pub use migrations::{migrations, run_migrations};
pub use postgres_phone_number_repository::PostgresPhoneNumberRepository;
pub use postgres_user_repository::PostgresUserRepository;
