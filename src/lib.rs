//! # Helix Core - 模块宿主
//!
//! Helix 是一个长期驻留的模块宿主，把独立打包的原生模块组装成
//! 一个运行中的进程，提供以下核心功能：
//!
//! - **模块生命周期**: 安装 → 启用 → 启动 → 停止 → 禁用 → 卸载
//! - **依赖解析**: 版本要求检查、循环检测与依赖优先的加载顺序
//! - **动态加载**: 按清单配置解析共享库的四个生命周期入口符号
//! - **状态持久化**: 优雅退出时保存期望状态，重启后按依赖顺序恢复
//! - **控制通道**: 本地套接字上的单行命令协议
//!
//! ## 快速开始
//!
//! ```rust,no_run
//! use helix_core::module::supervisor::Supervisor;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut supervisor = Supervisor::new();
//!     supervisor.initialize("./modules").await?;
//!
//!     supervisor.enable("sensor").await?;
//!     supervisor.start("sensor").await?;
//!
//!     supervisor.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! ## 模块结构
//!
//! - `module` - 清单、版本、依赖解析、加载器与监管器
//! - `api` - 控制命令分发与套接字服务
//! - `core` - 守护进程配置
//! - `utils` - 错误类型与日志系统

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod api;
pub mod core;
pub mod module;
pub mod utils;

// 重导出常用类型，方便使用
pub use module::{
    DependencyResolver, EntryPoints, ManifestDependency, ManifestParser, ModuleEntry,
    ModuleLoader, ModuleManifest, ModuleState, Supervisor,
};

pub use utils::{HelixError, LogGuard, Logger, LoggerConfig, Result};

pub use crate::core::config::DaemonConfig;

pub use api::IpcServer;

/// 宿主核心版本
pub const CORE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// 模块 API 版本
///
/// 模块清单中的 `minimum_api_version` 以 `>=` 语义与此值比较。
pub const API_VERSION: &str = "1.0.0";
