//! 模块清单解析器
//!
//! 负责从 manifest.json 文件解析并校验模块清单。

use std::path::Path;

use semver::Version;

use crate::module::manifest::ModuleManifest;
use crate::module::version::VersionRequirement;
use crate::utils::{HelixError, Result};

/// 模块名最大长度（字节）
const MAX_MODULE_NAME_LEN: usize = 64;

/// 入口符号最大长度（字节）
const MAX_SYMBOL_LEN: usize = 128;

/// 模块清单解析器
///
/// 提供从文件或字符串解析 manifest.json 的功能。
#[derive(Debug, Clone, Default)]
pub struct ManifestParser;

impl ManifestParser {
    /// 从文件解析模块清单
    ///
    /// # Arguments
    ///
    /// * `path` - manifest.json 文件路径
    ///
    /// # Errors
    ///
    /// - 文件不存在或无法读取时返回 IO 错误
    /// - 内容不是合法 JSON 或校验失败时返回 `InvalidManifest`
    pub async fn parse_file(path: &Path) -> Result<ModuleManifest> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::parse_str(&content)
    }

    /// 从字符串解析模块清单
    pub fn parse_str(content: &str) -> Result<ModuleManifest> {
        let manifest: ModuleManifest = serde_json::from_str(content)
            .map_err(|e| HelixError::InvalidManifest(e.to_string()))?;
        Self::validate(&manifest)?;
        Ok(manifest)
    }

    /// 校验模块清单
    ///
    /// 执行以下检查：
    /// - 必填字段（name, version, binary_path）非空
    /// - 模块名格式与长度
    /// - 版本号为合法 semver
    /// - 依赖名格式与版本要求格式
    /// - 自定义入口符号为合法 C 标识符
    /// - 最低宿主版本字段为合法版本号
    pub fn validate(manifest: &ModuleManifest) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        // 1. 模块名
        if manifest.name.is_empty() {
            errors.push("模块名不能为空".to_string());
        } else if !Self::is_valid_module_name(&manifest.name) {
            errors.push(format!(
                "模块名 '{}' 格式无效: 须以字母开头, 仅含字母、数字、下划线和连字符, 不超过 {} 字节",
                manifest.name, MAX_MODULE_NAME_LEN
            ));
        }

        // 2. 版本号
        if manifest.version.is_empty() {
            errors.push("模块版本号不能为空".to_string());
        } else if Version::parse(&manifest.version).is_err() {
            errors.push(format!(
                "无效的版本号格式 '{}', 请使用 semver 格式 (如 1.0.0)",
                manifest.version
            ));
        }

        // 3. 共享库路径
        if manifest.binary_path.is_empty() {
            errors.push("共享库路径不能为空".to_string());
        } else if Path::new(&manifest.binary_path).is_absolute() {
            errors.push(format!(
                "共享库路径必须是模块目录内的相对路径: '{}'",
                manifest.binary_path
            ));
        }

        // 4. 依赖声明
        for dep in &manifest.dependencies {
            if !Self::is_valid_module_name(&dep.name) {
                errors.push(format!("依赖名 '{}' 格式无效", dep.name));
            }
            if !dep.version.is_empty() && dep.version.parse::<VersionRequirement>().is_err() {
                errors.push(format!(
                    "依赖 '{}' 的版本要求格式无效: '{}'",
                    dep.name, dep.version
                ));
            }
        }

        // 5. 入口符号
        for (label, symbol) in [
            ("init", &manifest.entry_points.init),
            ("start", &manifest.entry_points.start),
            ("stop", &manifest.entry_points.stop),
            ("destroy", &manifest.entry_points.destroy),
        ] {
            if let Some(symbol) = symbol {
                if !symbol.is_empty() && !Self::is_valid_symbol_name(symbol) {
                    errors.push(format!("{} 入口符号 '{}' 不是合法的 C 标识符", label, symbol));
                }
            }
        }

        // 6. 最低宿主版本
        for (label, value) in [
            ("minimum_core_version", &manifest.minimum_core_version),
            ("minimum_api_version", &manifest.minimum_api_version),
        ] {
            if let Some(value) = value {
                if Version::parse(value).is_err() {
                    errors.push(format!("{} 格式无效: '{}'", label, value));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(HelixError::InvalidManifest(errors.join("; ")))
        }
    }

    /// 检查模块名格式是否有效
    ///
    /// 有效格式：ASCII 字母开头，仅含字母、数字、下划线和连字符，
    /// 长度不超过 64 字节。
    pub fn is_valid_module_name(name: &str) -> bool {
        if name.is_empty() || name.len() > MAX_MODULE_NAME_LEN {
            return false;
        }

        let mut chars = name.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() => {}
            _ => return false,
        }

        chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    }

    /// 检查入口符号是否为合法的 C 标识符
    ///
    /// 有效格式：字母或下划线开头，仅含字母、数字和下划线，
    /// 长度不超过 128 字节。
    pub fn is_valid_symbol_name(symbol: &str) -> bool {
        if symbol.is_empty() || symbol.len() > MAX_SYMBOL_LEN {
            return false;
        }

        let mut chars = symbol.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return false,
        }

        chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::manifest::ManifestDependency;

    /// 创建一个有效的测试清单
    fn create_valid_manifest() -> ModuleManifest {
        ModuleManifest::new("test-module", "1.0.0", "libtest.so")
    }

    #[test]
    fn test_parse_valid_json() {
        let json = r#"
{
  "name": "video-decoder",
  "version": "1.2.3",
  "binary_path": "lib/libvideo.so",
  "description": "视频解码模块",
  "author": "Helix Team",
  "license": "MIT",
  "tags": ["video", "codec"],
  "config": { "threads": "4" },
  "dependencies": [
    { "name": "logger", "version": ">=1.0.0" },
    { "name": "metrics", "version": "", "optional": true }
  ],
  "entry_points": { "init": "video_init" },
  "minimum_core_version": "1.0.0"
}
"#;

        let manifest = ManifestParser::parse_str(json).unwrap();
        assert_eq!(manifest.name, "video-decoder");
        assert_eq!(manifest.version, "1.2.3");
        assert_eq!(manifest.binary_path, "lib/libvideo.so");
        assert_eq!(manifest.description.as_deref(), Some("视频解码模块"));
        assert_eq!(manifest.dependencies.len(), 2);
        assert!(manifest.dependencies[1].optional);
        assert_eq!(manifest.entry_points.init_symbol(), "video_init");
        assert_eq!(manifest.minimum_core_version.as_deref(), Some("1.0.0"));
    }

    #[test]
    fn test_parse_minimal_json() {
        let json = r#"{ "name": "tiny", "version": "0.1.0", "binary_path": "libtiny.so" }"#;
        let manifest = ManifestParser::parse_str(json).unwrap();
        assert_eq!(manifest.name, "tiny");
        assert!(manifest.dependencies.is_empty());
        assert!(manifest.entry_points.init.is_none());
    }

    #[test]
    fn test_parse_missing_required_fields() {
        for json in [
            r#"{ "version": "1.0.0", "binary_path": "x.so" }"#,
            r#"{ "name": "x", "binary_path": "x.so" }"#,
            r#"{ "name": "x", "version": "1.0.0" }"#,
        ] {
            let result = ManifestParser::parse_str(json);
            assert!(matches!(result, Err(HelixError::InvalidManifest(_))));
        }
    }

    #[test]
    fn test_parse_invalid_json_syntax() {
        let result = ManifestParser::parse_str("{ not json");
        assert!(matches!(result, Err(HelixError::InvalidManifest(_))));
    }

    #[test]
    fn test_validate_invalid_name() {
        for name in ["1module", "-module", "mod ule", "mod.ule", ""] {
            let mut manifest = create_valid_manifest();
            manifest.name = name.to_string();
            assert!(
                ManifestParser::validate(&manifest).is_err(),
                "应当拒绝模块名: {:?}",
                name
            );
        }
    }

    #[test]
    fn test_validate_name_length_limit() {
        let mut manifest = create_valid_manifest();
        manifest.name = format!("a{}", "b".repeat(64));
        assert!(ManifestParser::validate(&manifest).is_err());

        manifest.name = format!("a{}", "b".repeat(63));
        assert!(ManifestParser::validate(&manifest).is_ok());
    }

    #[test]
    fn test_validate_invalid_version() {
        let mut manifest = create_valid_manifest();
        manifest.version = "not-a-version".to_string();

        let result = ManifestParser::validate(&manifest);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("版本号格式"));
    }

    #[test]
    fn test_validate_absolute_binary_path() {
        let mut manifest = create_valid_manifest();
        manifest.binary_path = "/usr/lib/libtest.so".to_string();
        assert!(ManifestParser::validate(&manifest).is_err());
    }

    #[test]
    fn test_validate_dependency_requirement() {
        let mut manifest = create_valid_manifest();
        manifest
            .dependencies
            .push(ManifestDependency::new("other", "^1.0.0"));

        let result = ManifestParser::validate(&manifest);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("版本要求格式无效"));

        // 空要求合法，表示任意版本
        let mut manifest = create_valid_manifest();
        manifest.dependencies.push(ManifestDependency::new("other", ""));
        assert!(ManifestParser::validate(&manifest).is_ok());
    }

    #[test]
    fn test_validate_dependency_name() {
        let mut manifest = create_valid_manifest();
        manifest
            .dependencies
            .push(ManifestDependency::new("9illegal", ">=1.0.0"));
        assert!(ManifestParser::validate(&manifest).is_err());
    }

    #[test]
    fn test_validate_entry_symbols() {
        let mut manifest = create_valid_manifest();
        manifest.entry_points.init = Some("my_init".to_string());
        manifest.entry_points.destroy = Some("_teardown".to_string());
        assert!(ManifestParser::validate(&manifest).is_ok());

        manifest.entry_points.stop = Some("bad-symbol".to_string());
        assert!(ManifestParser::validate(&manifest).is_err());

        // 空符号视同未配置
        manifest.entry_points.stop = Some(String::new());
        assert!(ManifestParser::validate(&manifest).is_ok());
    }

    #[test]
    fn test_validate_minimum_versions() {
        let mut manifest = create_valid_manifest();
        manifest.minimum_core_version = Some("1.0.0".to_string());
        manifest.minimum_api_version = Some("1.0.0".to_string());
        assert!(ManifestParser::validate(&manifest).is_ok());

        manifest.minimum_api_version = Some(">=1.0".to_string());
        let result = ManifestParser::validate(&manifest);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("minimum_api_version"));
    }

    #[test]
    fn test_multiple_validation_errors_joined() {
        let mut manifest = create_valid_manifest();
        manifest.name = "9bad".to_string();
        manifest.version = "bogus".to_string();

        let msg = ManifestParser::validate(&manifest).unwrap_err().to_string();
        assert!(msg.contains("模块名"));
        assert!(msg.contains("版本号格式"));
    }

    #[test]
    fn test_is_valid_module_name() {
        assert!(ManifestParser::is_valid_module_name("logger"));
        assert!(ManifestParser::is_valid_module_name("video-decoder"));
        assert!(ManifestParser::is_valid_module_name("net_io2"));
        assert!(ManifestParser::is_valid_module_name("X"));

        assert!(!ManifestParser::is_valid_module_name(""));
        assert!(!ManifestParser::is_valid_module_name("_private"));
        assert!(!ManifestParser::is_valid_module_name("2fast"));
        assert!(!ManifestParser::is_valid_module_name("has space"));
        assert!(!ManifestParser::is_valid_module_name("dot.ted"));
    }

    #[test]
    fn test_is_valid_symbol_name() {
        assert!(ManifestParser::is_valid_symbol_name("helix_module_init"));
        assert!(ManifestParser::is_valid_symbol_name("_start2"));
        assert!(ManifestParser::is_valid_symbol_name("A"));

        assert!(!ManifestParser::is_valid_symbol_name(""));
        assert!(!ManifestParser::is_valid_symbol_name("2init"));
        assert!(!ManifestParser::is_valid_symbol_name("init-now"));
        assert!(!ManifestParser::is_valid_symbol_name(&"s".repeat(129)));
    }

    #[tokio::test]
    async fn test_parse_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        tokio::fs::write(
            &path,
            r#"{ "name": "disk", "version": "1.0.0", "binary_path": "libdisk.so" }"#,
        )
        .await
        .unwrap();

        let manifest = ManifestParser::parse_file(&path).await.unwrap();
        assert_eq!(manifest.name, "disk");

        let missing = ManifestParser::parse_file(&dir.path().join("nope.json")).await;
        assert!(matches!(missing, Err(HelixError::Io(_))));
    }
}
