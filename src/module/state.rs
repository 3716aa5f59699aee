//! 模块状态与期望状态持久化
//!
//! 定义模块生命周期状态机的状态枚举，以及模块目录下期望状态文件
//! 的读写。状态文件仅在守护进程优雅退出时写入，启动时读取一次。

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::utils::Result;

/// 期望状态文件名（位于模块目录下）
pub const STATE_FILE_NAME: &str = ".helix_state.json";

/// 模块生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ModuleState {
    /// 已安装但未加载
    Installed,
    /// 共享库已加载，尚未初始化
    Loaded,
    /// 已初始化，尚未启动
    Initialized,
    /// 运行中
    Running,
    /// 已停止（仍保持初始化状态）
    Stopped,
    /// 错误状态，需要操作员介入
    Error,
    /// 未知状态（仅用于不存在或无法识别的记录）
    Unknown,
}

impl<'de> Deserialize<'de> for ModuleState {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // 状态文件可能来自更新版本的宿主；无法识别的名称落到 Unknown
        let name = String::deserialize(deserializer)?;
        Ok(ModuleState::from_name(&name))
    }
}

impl ModuleState {
    /// 按名称解析状态，无法识别时返回 [`ModuleState::Unknown`]
    pub fn from_name(name: &str) -> Self {
        match name {
            "Installed" => ModuleState::Installed,
            "Loaded" => ModuleState::Loaded,
            "Initialized" => ModuleState::Initialized,
            "Running" => ModuleState::Running,
            "Stopped" => ModuleState::Stopped,
            "Error" => ModuleState::Error,
            _ => ModuleState::Unknown,
        }
    }

    /// 是否可以启用（加载并初始化）
    pub fn can_enable(&self) -> bool {
        matches!(self, ModuleState::Installed)
    }

    /// 是否可以启动
    pub fn can_start(&self) -> bool {
        matches!(self, ModuleState::Initialized | ModuleState::Stopped)
    }

    /// 是否可以停止
    pub fn can_stop(&self) -> bool {
        matches!(self, ModuleState::Running)
    }

    /// 是否处于启用状态（加载器应持有句柄）
    pub fn is_enabled(&self) -> bool {
        matches!(
            self,
            ModuleState::Loaded
                | ModuleState::Initialized
                | ModuleState::Running
                | ModuleState::Stopped
        )
    }

    /// 重启后是否应恢复到至少启用的状态
    pub fn wants_enable_on_restore(&self) -> bool {
        matches!(
            self,
            ModuleState::Initialized | ModuleState::Running | ModuleState::Stopped
        )
    }
}

impl fmt::Display for ModuleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ModuleState::Installed => "Installed",
            ModuleState::Loaded => "Loaded",
            ModuleState::Initialized => "Initialized",
            ModuleState::Running => "Running",
            ModuleState::Stopped => "Stopped",
            ModuleState::Error => "Error",
            ModuleState::Unknown => "Unknown",
        };
        write!(f, "{}", s)
    }
}

/// 单个模块的持久化记录
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedModule {
    /// 退出时的模块状态
    pub state: ModuleState,
}

/// 期望状态文件内容
///
/// 形如 `{"modules": {"<name>": {"state": "Running"}}}`。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateFile {
    /// 模块名 -> 持久化记录
    #[serde(default)]
    pub modules: BTreeMap<String, SavedModule>,
}

impl StateFile {
    /// 记录一个模块的状态
    pub fn record(&mut self, name: impl Into<String>, state: ModuleState) {
        self.modules.insert(name.into(), SavedModule { state });
    }

    /// 状态文件在模块目录下的完整路径
    pub fn path_in(modules_dir: &Path) -> PathBuf {
        modules_dir.join(STATE_FILE_NAME)
    }

    /// 写入状态文件
    pub async fn save(&self, modules_dir: &Path) -> Result<()> {
        let path = Self::path_in(modules_dir);
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(&path, content).await?;
        debug!(path = %path.display(), modules = self.modules.len(), "已写入期望状态文件");
        Ok(())
    }

    /// 读取状态文件
    ///
    /// 文件不存在不算错误，返回 `Ok(None)`；内容无法解析时返回错误，
    /// 由调用方决定是否降级继续。
    pub async fn load(modules_dir: &Path) -> Result<Option<Self>> {
        let path = Self::path_in(modules_dir);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let state: StateFile = serde_json::from_str(&content)?;
        debug!(path = %path.display(), modules = state.modules.len(), "已读取期望状态文件");
        Ok(Some(state))
    }
}
