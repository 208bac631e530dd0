//! 基础设施资源管理

use std::sync::Arc;

use phonebook_adapter_postgres::{PostgresConfig, create_pool};
use phonebook_auth_core::TokenService;
use phonebook_common::{RetryConfig, is_transient_error, with_retry};
use phonebook_config::AppConfig;
use phonebook_errors::AppResult;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use tracing::info;

/// 会话令牌签发者
pub const TOKEN_ISSUER: &str = "phonebook";
/// 会话令牌受众
pub const TOKEN_AUDIENCE: &str = "phonebook-dashboard";

/// 基础设施资源容器
pub struct Infrastructure {
    config: AppConfig,
    postgres_pool: PgPool,
    token_service: Arc<TokenService>,
}

impl Infrastructure {
    /// 从配置创建基础设施资源（数据库连接带重试）
    pub async fn from_config(config: AppConfig) -> AppResult<Self> {
        let pg_config = PostgresConfig::new(config.database.url.expose_secret())
            .with_max_connections(config.database.max_connections);

        let postgres_pool = with_retry(
            &RetryConfig::default(),
            "PostgreSQL connection",
            || {
                let cfg = pg_config.clone();
                async move { create_pool(&cfg).await }
            },
            |e| is_transient_error(&e.to_string()),
        )
        .await?;
        info!(
            max_connections = config.database.max_connections,
            "PostgreSQL connection pool created"
        );

        let token_service = Arc::new(build_token_service(&config));

        Ok(Self {
            config,
            postgres_pool,
            token_service,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn postgres_pool(&self) -> PgPool {
        self.postgres_pool.clone()
    }

    pub fn token_service(&self) -> Arc<TokenService> {
        self.token_service.clone()
    }
}

/// 根据会话配置构建 TokenService
pub fn build_token_service(config: &AppConfig) -> TokenService {
    TokenService::new(
        config.session.secret.expose_secret(),
        config.session.expires_in as i64,
        TOKEN_ISSUER.to_string(),
        TOKEN_AUDIENCE.to_string(),
    )
}
