//! HTTP 接口层
//!
//! - `/api/*`：公开只读接口
//! - `/`、`/create/` 等：需要会话的后台接口
//! - `/health`、`/ready`、`/metrics`：运维接口

pub mod dashboard;
pub mod dto;
pub mod ops;
pub mod public;
pub mod router;
pub mod security_headers;
pub mod session;
pub mod state;

pub use router::{MAX_BODY_BYTES, router};
pub use session::CurrentUser;
pub use state::{AppState, SessionSettings};
