//! 操作员账号：登录、会话校验、修改密码、初始化管理员

use std::sync::Arc;

use phonebook_auth_core::TokenService;
use phonebook_errors::{AppError, AppResult, FieldErrors};
use tracing::{info, warn};

use crate::application::commands::{ChangePasswordCommand, LoginCommand};
use crate::domain::entities::DashboardUser;
use crate::domain::repositories::UserRepository;
use crate::domain::value_objects::{HashedPassword, Password, PasswordPolicy, Username};

pub const LOGIN_FAILED: &str = "Please enter a correct username and password.";

/// 登录成功后签发的会话
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub expires_in: i64,
    pub user: DashboardUser,
}

#[derive(Debug, Clone)]
pub enum EnsureAdminOutcome {
    Created(DashboardUser),
    AlreadyExists,
}

pub struct AccountHandler {
    users: Arc<dyn UserRepository>,
    token_service: Arc<TokenService>,
    policy: PasswordPolicy,
}

impl AccountHandler {
    pub fn new(users: Arc<dyn UserRepository>, token_service: Arc<TokenService>) -> Self {
        Self {
            users,
            token_service,
            policy: PasswordPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: PasswordPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// 用户名或密码错误统一返回同一条 `__all__` 错误
    pub async fn login(&self, command: &LoginCommand) -> AppResult<Session> {
        let failed = || AppError::from(FieldErrors::single("__all__", LOGIN_FAILED));

        let Ok(username) = Username::new(command.username.trim()) else {
            return Err(failed());
        };
        let Some(user) = self.users.find_by_username(&username).await? else {
            warn!(username = %username, "Login failed: unknown user");
            return Err(failed());
        };
        if !user.password_hash.verify(&command.password)? {
            warn!(username = %username, "Login failed: wrong password");
            return Err(failed());
        }

        let token = self
            .token_service
            .issue(user.id, user.username.as_str(), user.session_version)?;
        info!(user_id = user.id, username = %user.username, "Operator signed in");

        Ok(Session {
            token,
            expires_in: self.token_service.expires_in(),
            user,
        })
    }

    /// 校验会话令牌，并确认签发后密码未被修改
    pub async fn authenticate(&self, token: &str) -> AppResult<DashboardUser> {
        let claims = self.token_service.validate(token)?;
        let user = self
            .users
            .find_by_id(claims.user_id()?)
            .await?
            .ok_or_else(|| AppError::unauthorized("Unknown session user"))?;

        if user.session_version != claims.ver {
            return Err(AppError::unauthorized("Session has been revoked"));
        }
        Ok(user)
    }

    /// 修改密码后 session_version 递增，所有已签发会话失效
    pub async fn change_password(&self, user: &DashboardUser, command: &ChangePasswordCommand) -> AppResult<()> {
        let mut errors = command.check_fields();

        if !command.current_password.is_empty() && !user.password_hash.verify(&command.current_password)? {
            errors.add("current_password", "Current password is incorrect.");
        }
        if !command.new_password.is_empty() {
            if let Err(e) = Password::validate(&command.new_password, Some(user.username.as_str()), &self.policy) {
                errors.add("new_password", e.to_string());
            }
        }
        if !errors.is_empty() {
            return Err(errors.into());
        }

        let hash = HashedPassword::from_plain(&command.new_password, Some(user.username.as_str()), &self.policy)?;
        let version = self.users.update_password(user.id, &hash).await?;
        info!(user_id = user.id, session_version = version, "Operator password changed");
        Ok(())
    }

    /// 不存在时创建操作员；已存在的账号保持不变
    pub async fn ensure_admin(&self, username: &str, password: &str) -> AppResult<EnsureAdminOutcome> {
        let username = Username::new(username).map_err(|e| AppError::validation(e.to_string()))?;

        if self.users.find_by_username(&username).await?.is_some() {
            info!(username = %username, "Operator already exists, leaving it untouched");
            return Ok(EnsureAdminOutcome::AlreadyExists);
        }

        let hash = HashedPassword::from_plain(password, Some(username.as_str()), &self.policy)?;
        match self.users.create(&username, &hash).await {
            Ok(user) => {
                info!(user_id = user.id, username = %user.username, "Operator created");
                Ok(EnsureAdminOutcome::Created(user))
            }
            Err(e) if e.is_conflict() => Ok(EnsureAdminOutcome::AlreadyExists),
            Err(e) => Err(e),
        }
    }
}
