//! 实体

mod dashboard_user;
mod phone_number;

pub use dashboard_user::DashboardUser;
pub use phone_number::{NewPhoneNumber, PhoneNumber, PhoneNumberId};
