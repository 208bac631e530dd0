//! 路由共享状态

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use phonebook_config::SessionConfig;
use sqlx::PgPool;

use crate::application::{AccountHandler, CatalogHandler};

/// 会话 Cookie 设置
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub cookie_name: String,
    pub secure: bool,
    pub max_age: u64,
}

impl SessionSettings {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            cookie_name: config.cookie_name.clone(),
            secure: config.secure_cookie,
            max_age: config.expires_in,
        }
    }

    pub fn set_cookie(&self, token: &str) -> String {
        self.cookie(token, self.max_age)
    }

    pub fn clear_cookie(&self) -> String {
        self.cookie("", 0)
    }

    fn cookie(&self, value: &str, max_age: u64) -> String {
        let mut cookie = format!(
            "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
            self.cookie_name, value, max_age
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogHandler>,
    pub accounts: Arc<AccountHandler>,
    pub session: SessionSettings,
    pub metrics: Option<PrometheusHandle>,
    /// 就绪检查探测的连接池；内存存储时为空
    pub database: Option<PgPool>,
}

impl AppState {
    pub fn new(catalog: Arc<CatalogHandler>, accounts: Arc<AccountHandler>, session: SessionSettings) -> Self {
        Self {
            catalog,
            accounts,
            session,
            metrics: None,
            database: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    pub fn with_database(mut self, pool: PgPool) -> Self {
        self.database = Some(pool);
        self
    }
}
