//! 命令行

use std::sync::Arc;

use clap::{Parser, Subcommand};
use phonebook_bootstrap::{Infrastructure, load_runtime, run_http_server};
use phonebook_telemetry::init_metrics;
use tracing::{info, warn};

use crate::api::{AppState, SessionSettings, router};
use crate::application::{AccountHandler, CatalogHandler, EnsureAdminOutcome};
use crate::infrastructure::persistence::{PostgresPhoneNumberRepository, PostgresUserRepository, run_migrations};

#[derive(Debug, Parser)]
#[command(name = "phonebook", version, about = "Phone number catalog service")]
pub struct Cli {
    /// 配置目录
    #[arg(long, global = true, default_value = "config", env = "PHONEBOOK_CONFIG_DIR")]
    pub config_dir: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// 应用迁移并启动 HTTP 服务（默认）
    Serve,
    /// 只应用数据库迁移
    Migrate,
    /// 创建后台操作员；已存在时不做修改
    EnsureAdmin {
        #[arg(long)]
        username: String,
        #[arg(long, env = "PHONEBOOK_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

pub async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            run_http_server(&cli.config_dir, |infra| async move {
                run_migrations(&infra.postgres_pool()).await?;
                Ok(router(build_state(&infra)))
            })
            .await
        }
        Command::Migrate => {
            let infra = Infrastructure::from_config(load_runtime(&cli.config_dir)?).await?;
            run_migrations(&infra.postgres_pool()).await?;
            Ok(())
        }
        Command::EnsureAdmin { username, password } => {
            let infra = Infrastructure::from_config(load_runtime(&cli.config_dir)?).await?;
            run_migrations(&infra.postgres_pool()).await?;

            let accounts = account_handler(&infra);
            match accounts.ensure_admin(&username, &password).await? {
                EnsureAdminOutcome::Created(user) => info!(username = %user.username, "Operator account created"),
                EnsureAdminOutcome::AlreadyExists => info!(username = %username, "Operator account already exists"),
            }
            Ok(())
        }
    }
}

fn account_handler(infra: &Infrastructure) -> AccountHandler {
    AccountHandler::new(
        Arc::new(PostgresUserRepository::new(infra.postgres_pool())),
        infra.token_service(),
    )
}

/// 以 PostgreSQL Repository 装配路由状态
pub fn build_state(infra: &Infrastructure) -> AppState {
    let pool = infra.postgres_pool();
    let catalog = CatalogHandler::new(Arc::new(PostgresPhoneNumberRepository::new(pool.clone())));
    let state = AppState::new(
        Arc::new(catalog),
        Arc::new(account_handler(infra)),
        SessionSettings::from_config(&infra.config().session),
    )
    .with_database(pool);

    match init_metrics() {
        Ok(handle) => state.with_metrics(handle),
        Err(e) => {
            warn!(error = %e, "Metrics exporter unavailable");
            state
        }
    }
}
