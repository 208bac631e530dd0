//! 服务启动器

use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use phonebook_errors::AppResult;
use tracing::info;

use crate::infrastructure::Infrastructure;
use crate::runtime::{load_runtime, shutdown_signal};

/// 运行 HTTP 服务
///
/// 1. 加载配置并初始化日志
/// 2. 创建基础设施资源（数据库连接池、TokenService）
/// 3. 调用 `router_builder` 构建路由
/// 4. 启动服务器并处理 graceful shutdown
///
/// ```ignore
/// run_http_server("config", |infra| async move {
///     Ok(api::router(build_state(&infra)))
/// })
/// .await
/// ```
pub async fn run_http_server<F, Fut>(
    config_dir: &str,
    router_builder: F,
) -> Result<(), Box<dyn std::error::Error>>
where
    F: FnOnce(Infrastructure) -> Fut,
    Fut: Future<Output = AppResult<Router>>,
{
    let config = load_runtime(config_dir)?;
    info!("Starting {} service", config.app_name);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    let infra = Infrastructure::from_config(config).await?;
    let router = router_builder(infra).await?;

    serve(addr, router).await?;
    info!("Service stopped");
    Ok(())
}

/// 在给定地址上运行路由直到收到关闭信号
pub async fn serve(addr: SocketAddr, router: Router) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}
