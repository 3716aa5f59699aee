//! Helix 错误类型定义
//!
//! 本模块定义了模块宿主中使用的所有错误类型。

use thiserror::Error;

/// 拼接模块名列表，用于错误消息
fn join_names(names: &[String]) -> String {
    names.join(", ")
}

/// 格式化依赖解析失败的详情段
///
/// 控制通道会原样暴露 `missing:` / `cyclic:` 两段，客户端依赖这两个
/// 标记定位问题模块。
fn resolution_detail(missing: &[String], cyclic: &[String]) -> String {
    let mut detail = String::new();
    if !missing.is_empty() {
        detail.push_str("; missing: ");
        detail.push_str(&missing.join(", "));
    }
    if !cyclic.is_empty() {
        detail.push_str("; cyclic: ");
        detail.push_str(&cyclic.join(", "));
    }
    detail
}

/// Helix 模块宿主核心错误类型
#[derive(Error, Debug)]
pub enum HelixError {
    // ==================== 注册表错误 ====================

    /// 模块未安装
    #[error("模块未安装: '{0}'")]
    ModuleNotFound(String),

    /// 模块已安装
    #[error("模块已安装: '{0}', 请先卸载")]
    ModuleAlreadyInstalled(String),

    /// 模块已启用
    #[error("模块已启用: '{0}'")]
    ModuleAlreadyEnabled(String),

    /// 模块尚未启用
    #[error("模块尚未启用: '{0}'")]
    ModuleNotEnabled(String),

    /// 模块未在运行
    #[error("模块未在运行: '{0}'")]
    ModuleNotRunning(String),

    // ==================== 清单与安装包错误 ====================

    /// 模块清单无效
    #[error("无效的模块清单: {0}")]
    InvalidManifest(String),

    /// 版本要求格式无效
    #[error("无效的版本要求: '{0}'")]
    InvalidRequirement(String),

    /// 安装包无效或解包失败
    #[error("安装包无效: {0}")]
    InvalidArchive(String),

    /// 拒绝安装到已被占用的目录
    #[error("拒绝安装到 '{path}': {reason}")]
    InstallRefused {
        /// 冲突的目标目录
        path: String,
        /// 拒绝原因
        reason: String,
    },

    /// 宿主版本不满足模块要求
    #[error("版本不满足: {subject} 需要 {required}, 实际为 {found}")]
    VersionUnsatisfied {
        /// 被检查的对象（如 Helix core / Helix API）
        subject: String,
        /// 模块声明的要求
        required: String,
        /// 宿主实际版本
        found: String,
    },

    // ==================== 依赖错误 ====================

    /// 依赖解析失败，携带缺失与成环的模块集合
    #[error("模块 '{module}' 依赖解析失败{}", resolution_detail(.missing, .cyclic))]
    DependencyResolution {
        /// 解析的目标模块
        module: String,
        /// 缺失（或版本不满足）的依赖
        missing: Vec<String>,
        /// 位于循环依赖上的模块
        cyclic: Vec<String>,
    },

    /// 依赖启用或启动失败
    #[error("模块 '{module}' 的依赖 '{dependency}' 未能进入运行状态: {reason}")]
    DependencyFailed {
        /// 依赖方模块
        module: String,
        /// 失败的依赖
        dependency: String,
        /// 失败原因
        reason: String,
    },

    /// 模块被其它模块依赖，无法卸载
    #[error("无法卸载模块 '{module}': required by {}", join_names(.dependents))]
    ModuleHasDependents {
        /// 被依赖的模块
        module: String,
        /// 依赖它的模块列表
        dependents: Vec<String>,
    },

    // ==================== 动态加载错误 ====================

    /// 模块已加载
    #[error("模块已加载: '{0}'")]
    ModuleAlreadyLoaded(String),

    /// 模块未加载
    #[error("模块未加载: '{0}'")]
    ModuleNotLoaded(String),

    /// 模块已初始化
    #[error("模块已初始化: '{0}'")]
    ModuleAlreadyInitialized(String),

    /// 模块已在运行
    #[error("模块已在运行: '{0}'")]
    ModuleAlreadyRunning(String),

    /// 共享库加载失败
    #[error("模块加载失败: '{module}' - {reason}")]
    LoadFailed {
        /// 模块名
        module: String,
        /// 动态链接器报告的原因
        reason: String,
    },

    /// 入口符号缺失
    #[error("模块 '{module}' 缺少入口符号 '{symbol}'")]
    SymbolMissing {
        /// 模块名
        module: String,
        /// 未解析到的符号
        symbol: String,
    },

    /// 生命周期钩子返回非零值
    #[error("模块 '{module}' 的 {hook} 钩子返回非零值: {code}")]
    HookFailed {
        /// 模块名
        module: String,
        /// 钩子名（init/start/stop）
        hook: &'static str,
        /// 钩子返回码
        code: i32,
    },

    /// 共享库卸载失败
    #[error("模块卸载失败: '{module}' - {reason}")]
    UnloadFailed {
        /// 模块名
        module: String,
        /// 动态链接器报告的原因
        reason: String,
    },

    // ==================== 守护进程错误 ====================

    /// 守护进程尚未初始化
    #[error("守护进程尚未初始化")]
    DaemonNotInitialized,

    /// 守护进程已初始化
    #[error("守护进程已初始化")]
    DaemonAlreadyInitialized,

    // ==================== 配置错误 ====================

    /// 配置加载失败
    #[error("配置加载失败: {0}")]
    ConfigLoadFailed(String),

    /// 配置值无效
    #[error("配置值无效: '{key}' - {reason}")]
    InvalidConfigValue {
        /// 配置键
        key: String,
        /// 无效原因
        reason: String,
    },

    // ==================== IO 和序列化错误 ====================

    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 序列化/反序列化错误
    #[error("JSON 错误: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML 序列化/反序列化错误
    #[error("YAML 错误: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// 版本号解析错误
    #[error("版本解析错误: {0}")]
    VersionParse(#[from] semver::Error),

    /// 其他错误
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// 宿主操作结果类型别名
pub type Result<T> = std::result::Result<T, HelixError>;
