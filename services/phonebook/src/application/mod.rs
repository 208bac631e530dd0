//! 应用层

pub mod account_handler;
pub mod catalog_handler;
pub mod commands;
pub mod csv_import;
pub mod queries;

pub use account_handler::{AccountHandler, EnsureAdminOutcome, Session};
pub use catalog_handler::{CatalogHandler, PhoneNumberPage};
pub use commands::{ChangePasswordCommand, CostInput, LoginCommand, PhoneNumberForm};
pub use csv_import::{CsvImporter, ImportError, ImportSummary, RowOutcome, parse_csv};
pub use queries::{ListQuery, SearchQuery};
