//! phonebook-config - 配置加载库
//!
//! 加载顺序：`{dir}/default.toml` → `{dir}/{APP_ENV}.toml` → `PHONEBOOK_` 前缀的环境变量。
//! 环境变量用 `__` 分隔层级，例如 `PHONEBOOK_DATABASE__URL`。

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use thiserror::Error;

/// 会话密钥最小长度（字节）
pub const MIN_SESSION_SECRET_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Load(Box::new(err))
    }
}

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

/// 遥测配置
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// 仪表盘会话配置
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// JWT 签名密钥
    pub secret: Secret<String>,
    /// 会话有效期（秒）
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// 仅通过 HTTPS 发送 cookie
    #[serde(default)]
    pub secure_cookie: bool,
}

fn default_expires_in() -> u64 {
    // 两周
    1_209_600
}

fn default_cookie_name() -> String {
    "phonebook_session".to_string()
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default = "default_app_env")]
    pub app_env: String,
    pub database: DatabaseConfig,
    #[serde(default = "default_server")]
    pub server: ServerConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    pub session: SessionConfig,
}

fn default_app_name() -> String {
    "phonebook".to_string()
}

fn default_app_env() -> String {
    "development".to_string()
}

fn default_server() -> ServerConfig {
    ServerConfig {
        host: default_host(),
        port: default_port(),
    }
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| default_app_env());
        Self::from_figment(Self::figment(config_dir, &env))
    }

    /// 构建 figment（不解析）
    pub fn figment(config_dir: &str, env: &str) -> Figment {
        Figment::new()
            .merge(Toml::file(format!("{}/default.toml", config_dir)))
            .merge(Toml::file(format!("{}/{}.toml", config_dir, env)))
            .merge(Env::prefixed("PHONEBOOK_").split("__"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.session.secret.expose_secret().len() < MIN_SESSION_SECRET_LEN {
            return Err(ConfigError::Invalid(format!(
                "session.secret must be at least {} bytes",
                MIN_SESSION_SECRET_LEN
            )));
        }
        if self.session.expires_in == 0 {
            return Err(ConfigError::Invalid(
                "session.expires_in must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }

    /// 是否为开发环境
    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }
}
