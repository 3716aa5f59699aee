//! 守护进程核心配置

pub mod config;

pub use config::{DaemonConfig, IpcConfig, LogConfig, ModulesConfig};
