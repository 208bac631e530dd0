//! DashboardUser 实体

use chrono::{DateTime, Utc};

use crate::domain::value_objects::{HashedPassword, Username};

/// 后台操作员
#[derive(Debug, Clone)]
pub struct DashboardUser {
    pub id: i64,
    pub username: Username,
    pub password_hash: HashedPassword,
    /// 修改密码时递增，使已签发的会话全部失效
    pub session_version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
