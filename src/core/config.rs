//! 守护进程配置
//!
//! 定义 helixd 的配置结构与加载逻辑。配置文件为 YAML 格式，所有
//! 字段都有默认值；命令行参数在 main 中覆盖文件配置。

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::utils::{HelixError, Result};

/// 模块管理配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModulesConfig {
    /// 模块安装目录
    #[serde(default = "default_modules_dir")]
    pub directory: PathBuf,
}

fn default_modules_dir() -> PathBuf {
    PathBuf::from("./modules")
}

impl Default for ModulesConfig {
    fn default() -> Self {
        Self {
            directory: default_modules_dir(),
        }
    }
}

/// 控制通道配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcConfig {
    /// Unix 套接字路径
    #[serde(default = "default_socket_path")]
    pub socket_path: PathBuf,
}

fn default_socket_path() -> PathBuf {
    PathBuf::from("/tmp/helixd.sock")
}

impl Default for IpcConfig {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否输出 JSON 格式
    #[serde(default)]
    pub json_format: bool,

    /// 是否输出到文件
    #[serde(default)]
    pub file_output: bool,

    /// 日志文件目录
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
            file_output: false,
            log_dir: None,
        }
    }
}

/// 守护进程配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// 模块管理配置
    #[serde(default)]
    pub modules: ModulesConfig,

    /// 控制通道配置
    #[serde(default)]
    pub ipc: IpcConfig,

    /// 日志配置
    #[serde(default)]
    pub logging: LogConfig,
}

impl DaemonConfig {
    /// 从 YAML 文件加载配置
    pub async fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| HelixError::ConfigLoadFailed(format!("{}: {}", path.display(), e)))?;

        let config: DaemonConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// 校验配置值
    pub fn validate(&self) -> Result<()> {
        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(HelixError::InvalidConfigValue {
                key: "logging.level".to_string(),
                reason: format!(
                    "'{}' 不是有效级别 (trace/debug/info/warn/error)",
                    self.logging.level
                ),
            });
        }

        if self.logging.file_output && self.logging.log_dir.is_none() {
            return Err(HelixError::InvalidConfigValue {
                key: "logging.log_dir".to_string(),
                reason: "启用文件输出时必须指定日志目录".to_string(),
            });
        }

        Ok(())
    }
}
