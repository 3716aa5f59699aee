//! 日志系统
//!
//! 基于 tracing 生态的日志初始化，支持：
//!
//! - 多级别日志（trace/debug/info/warn/error）
//! - 结构化 JSON 输出
//! - 文件输出（异步非阻塞，按天轮转）
//!
//! # 示例
//!
//! ```rust,no_run
//! use helix_core::utils::logger::{Logger, LoggerConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let _guard = Logger::init(LoggerConfig::default())?;
//!     tracing::info!(module = "demo", "宿主启动");
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;

use anyhow::anyhow;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::core::config::LogConfig;
use crate::utils::Result;

/// 日志系统配置
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// 日志级别
    pub level: String,

    /// 是否使用 JSON 格式输出
    pub json_format: bool,

    /// 是否输出到控制台
    pub console_output: bool,

    /// 文件输出目录（None 表示不输出到文件）
    pub file_output: Option<PathBuf>,

    /// 日志文件名前缀
    pub file_prefix: String,

    /// 自定义过滤指令（EnvFilter 格式），优先于 level
    pub filter_directives: Option<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            console_output: true,
            file_output: None,
            file_prefix: "helixd".to_string(),
            filter_directives: None,
        }
    }
}

impl LoggerConfig {
    /// 从守护进程日志配置创建
    pub fn from_log_config(log_config: &LogConfig) -> Self {
        Self {
            level: log_config.level.clone(),
            json_format: log_config.json_format,
            file_output: if log_config.file_output {
                log_config.log_dir.clone()
            } else {
                None
            },
            ..Default::default()
        }
    }
}

/// 日志资源守卫
///
/// 持有非阻塞写入线程的守卫；析构时冲刷缓冲。守护进程应在整个
/// 生命周期内持有它。
pub struct LogGuard {
    _worker: Option<WorkerGuard>,
}

/// 日志系统入口
pub struct Logger;

impl Logger {
    /// 初始化全局日志订阅者
    ///
    /// 进程内只能调用一次；重复初始化返回错误。
    pub fn init(config: LoggerConfig) -> Result<LogGuard> {
        let filter = match &config.filter_directives {
            Some(directives) => EnvFilter::new(directives),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new(format!(
                    "helix_core={level},helixd={level}",
                    level = config.level
                ))
            }),
        };

        let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

        if config.console_output {
            if config.json_format {
                layers.push(tracing_subscriber::fmt::layer().json().boxed());
            } else {
                layers.push(tracing_subscriber::fmt::layer().with_target(true).boxed());
            }
        }

        let worker = if let Some(dir) = &config.file_output {
            let appender = tracing_appender::rolling::daily(dir, &config.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            layers.push(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .boxed(),
            );
            Some(guard)
        } else {
            None
        };

        tracing_subscriber::registry()
            .with(layers)
            .with(filter)
            .try_init()
            .map_err(|e| anyhow!("日志系统初始化失败: {}", e))?;

        Ok(LogGuard { _worker: worker })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_log_config_without_file() {
        let log_config = LogConfig {
            level: "debug".to_string(),
            json_format: true,
            file_output: false,
            log_dir: Some(PathBuf::from("./logs")),
        };

        let config = LoggerConfig::from_log_config(&log_config);
        assert_eq!(config.level, "debug");
        assert!(config.json_format);
        // file_output 未启用时忽略 log_dir
        assert!(config.file_output.is_none());
    }

    #[test]
    fn test_from_log_config_with_file() {
        let log_config = LogConfig {
            level: "info".to_string(),
            json_format: false,
            file_output: true,
            log_dir: Some(PathBuf::from("./logs")),
        };

        let config = LoggerConfig::from_log_config(&log_config);
        assert_eq!(config.file_output, Some(PathBuf::from("./logs")));
    }

    #[test]
    fn test_default_config() {
        let config = LoggerConfig::default();
        assert_eq!(config.level, "info");
        assert!(config.console_output);
        assert!(!config.json_format);
        assert!(config.file_output.is_none());
    }
}
