//! Phonebook - 号码目录服务
//!
//! 分层结构：
//! - `domain`: 值对象、实体、Repository trait、最近号码排序
//! - `application`: 搜索/列表查询、表单命令、CSV 导入、账号处理
//! - `infrastructure`: PostgreSQL 与内存 Repository、迁移脚本
//! - `api`: axum 路由、会话中间件、运维接口
//! - `cli`: 命令行入口（serve / migrate / ensure-admin）

pub mod api;
pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
