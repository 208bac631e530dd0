//! 操作员 Repository trait

use async_trait::async_trait;
use phonebook_errors::AppResult;

use crate::domain::entities::DashboardUser;
use crate::domain::value_objects::{HashedPassword, Username};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<DashboardUser>>;

    async fn find_by_username(&self, username: &Username) -> AppResult<Option<DashboardUser>>;

    /// 创建操作员；用户名已存在返回 Conflict
    async fn create(&self, username: &Username, password_hash: &HashedPassword) -> AppResult<DashboardUser>;

    /// 更新密码并递增 session_version，返回新的版本号
    async fn update_password(&self, id: i64, password_hash: &HashedPassword) -> AppResult<i32>;
}
