//! 模块清单定义
//!
//! 定义模块描述文件 (manifest.json) 中的所有数据结构。清单随安装包
//! 一起分发，声明模块身份、共享库位置、依赖以及生命周期入口符号。

use std::collections::HashMap;

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::utils::Result;

/// 默认 init 入口符号
pub const DEFAULT_INIT_SYMBOL: &str = "helix_module_init";
/// 默认 start 入口符号
pub const DEFAULT_START_SYMBOL: &str = "helix_module_start";
/// 默认 stop 入口符号
pub const DEFAULT_STOP_SYMBOL: &str = "helix_module_stop";
/// 默认 destroy 入口符号
pub const DEFAULT_DESTROY_SYMBOL: &str = "helix_module_destroy";

/// 生命周期入口符号配置
///
/// 四个符号都可以在清单中自定义；省略（或留空）的符号在加载时
/// 回落到默认值，解析阶段不做填充。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPoints {
    /// init 符号
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init: Option<String>,

    /// start 符号
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,

    /// stop 符号
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<String>,

    /// destroy 符号
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destroy: Option<String>,
}

fn pick<'a>(configured: &'a Option<String>, default: &'a str) -> &'a str {
    match configured {
        Some(symbol) if !symbol.is_empty() => symbol,
        _ => default,
    }
}

impl EntryPoints {
    /// 实际使用的 init 符号
    pub fn init_symbol(&self) -> &str {
        pick(&self.init, DEFAULT_INIT_SYMBOL)
    }

    /// 实际使用的 start 符号
    pub fn start_symbol(&self) -> &str {
        pick(&self.start, DEFAULT_START_SYMBOL)
    }

    /// 实际使用的 stop 符号
    pub fn stop_symbol(&self) -> &str {
        pick(&self.stop, DEFAULT_STOP_SYMBOL)
    }

    /// 实际使用的 destroy 符号
    pub fn destroy_symbol(&self) -> &str {
        pick(&self.destroy, DEFAULT_DESTROY_SYMBOL)
    }
}

/// 依赖声明
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestDependency {
    /// 依赖模块名
    pub name: String,

    /// 版本要求（空串表示任意版本）
    #[serde(default)]
    pub version: String,

    /// 是否为可选依赖
    #[serde(default)]
    pub optional: bool,
}

impl ManifestDependency {
    /// 创建必需依赖
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            optional: false,
        }
    }

    /// 标记为可选依赖
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// 模块清单
///
/// 对应安装包内 manifest.json 文件的内容。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleManifest {
    /// 模块唯一名称
    pub name: String,

    /// 模块版本（semver 格式）
    pub version: String,

    /// 共享库在模块目录内的相对路径
    pub binary_path: String,

    /// 模块描述
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// 作者信息
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// 许可证
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,

    /// 主页地址
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,

    /// 源码仓库地址
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,

    /// 检索标签
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// 模块私有配置项
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub config: HashMap<String, String>,

    /// 依赖声明
    #[serde(default)]
    pub dependencies: Vec<ManifestDependency>,

    /// 生命周期入口符号
    #[serde(default)]
    pub entry_points: EntryPoints,

    /// 要求的最低宿主核心版本
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_core_version: Option<String>,

    /// 要求的最低宿主 API 版本
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_api_version: Option<String>,
}

impl ModuleManifest {
    /// 创建只包含必填字段的清单
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        binary_path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            binary_path: binary_path.into(),
            description: None,
            author: None,
            license: None,
            homepage: None,
            repository: None,
            tags: vec![],
            config: HashMap::new(),
            dependencies: vec![],
            entry_points: EntryPoints::default(),
            minimum_core_version: None,
            minimum_api_version: None,
        }
    }

    /// 解析清单声明的版本号
    pub fn parsed_version(&self) -> Result<Version> {
        Ok(Version::parse(&self.version)?)
    }

    /// 列出必需依赖的名称
    pub fn required_dependencies(&self) -> impl Iterator<Item = &ManifestDependency> {
        self.dependencies.iter().filter(|d| !d.optional)
    }
}
