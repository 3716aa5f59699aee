//! 版本比较与版本要求
//!
//! 模块版本使用 `X.Y.Z[+-后缀]` 形式。宿主内的版本序仅由数字三元组
//! 决定，后缀（预发布标记或构建信息）不参与排序；依赖声明使用
//! `==, >=, >, <=, <, ~` 运算符，与 Cargo 的要求语法不同：
//!
//! - 空要求匹配任意版本
//! - 省略运算符等价于 `==`
//! - `~X.Y.Z` 匹配主次版本相同且补丁号不低于 Z 的版本
//!
//! # 示例
//!
//! ```rust
//! use helix_core::module::version::{compare, VersionRequirement};
//! use semver::Version;
//!
//! let a = Version::parse("1.2.0").unwrap();
//! let b = Version::parse("1.2.3-rc.1").unwrap();
//! assert!(compare(&a, &b).is_lt());
//!
//! let req: VersionRequirement = ">= 1.2.0".parse().unwrap();
//! assert!(req.matches(&b));
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use semver::Version;

use crate::utils::HelixError;

/// 比较两个版本
///
/// 仅比较 `MAJOR.MINOR.PATCH` 三元组，后缀不参与排序。
pub fn compare(a: &Version, b: &Version) -> Ordering {
    a.major
        .cmp(&b.major)
        .then(a.minor.cmp(&b.minor))
        .then(a.patch.cmp(&b.patch))
}

/// 版本要求运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequirementOp {
    /// 精确匹配（`==`，或省略运算符）
    Exact,
    /// 不低于（`>=`）
    GreaterEq,
    /// 高于（`>`）
    Greater,
    /// 不高于（`<=`）
    LessEq,
    /// 低于（`<`）
    Less,
    /// 补丁号下限（`~`）：主次版本相同且补丁号不低于要求值
    Tilde,
}

impl fmt::Display for RequirementOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RequirementOp::Exact => "==",
            RequirementOp::GreaterEq => ">=",
            RequirementOp::Greater => ">",
            RequirementOp::LessEq => "<=",
            RequirementOp::Less => "<",
            RequirementOp::Tilde => "~",
        };
        write!(f, "{}", s)
    }
}

/// 版本要求
///
/// 依赖声明中的版本约束。`Any` 对应空字符串，匹配任意版本。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionRequirement {
    /// 无约束
    Any,
    /// 带运算符的约束
    Constraint {
        /// 运算符
        op: RequirementOp,
        /// 约束的基准版本
        version: Version,
    },
}

impl VersionRequirement {
    /// 检查给定版本是否满足此要求
    pub fn matches(&self, available: &Version) -> bool {
        match self {
            VersionRequirement::Any => true,
            VersionRequirement::Constraint { op, version } => {
                let cmp = compare(available, version);
                match op {
                    RequirementOp::Exact => cmp == Ordering::Equal,
                    RequirementOp::GreaterEq => cmp != Ordering::Less,
                    RequirementOp::Greater => cmp == Ordering::Greater,
                    RequirementOp::LessEq => cmp != Ordering::Greater,
                    RequirementOp::Less => cmp == Ordering::Less,
                    RequirementOp::Tilde => {
                        available.major == version.major
                            && available.minor == version.minor
                            && available.patch >= version.patch
                    }
                }
            }
        }
    }
}

impl FromStr for VersionRequirement {
    type Err = HelixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(VersionRequirement::Any);
        }

        // 双字符运算符优先，避免 ">=" 被识别为 ">"
        let (op, rest) = if let Some(rest) = trimmed.strip_prefix("==") {
            (RequirementOp::Exact, rest)
        } else if let Some(rest) = trimmed.strip_prefix(">=") {
            (RequirementOp::GreaterEq, rest)
        } else if let Some(rest) = trimmed.strip_prefix("<=") {
            (RequirementOp::LessEq, rest)
        } else if let Some(rest) = trimmed.strip_prefix('>') {
            (RequirementOp::Greater, rest)
        } else if let Some(rest) = trimmed.strip_prefix('<') {
            (RequirementOp::Less, rest)
        } else if let Some(rest) = trimmed.strip_prefix('~') {
            (RequirementOp::Tilde, rest)
        } else {
            (RequirementOp::Exact, trimmed)
        };

        let version = Version::parse(rest.trim_start())
            .map_err(|_| HelixError::InvalidRequirement(s.to_string()))?;

        Ok(VersionRequirement::Constraint { op, version })
    }
}

impl fmt::Display for VersionRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionRequirement::Any => Ok(()),
            VersionRequirement::Constraint { op, version } => write!(f, "{}{}", op, version),
        }
    }
}

/// 检查已注册版本是否满足要求字符串
///
/// 要求格式无效时返回错误，由调用方决定如何上报。
pub fn satisfies(available: &Version, requirement: &str) -> crate::utils::Result<bool> {
    let req: VersionRequirement = requirement.parse()?;
    Ok(req.matches(available))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_compare_triple() {
        assert_eq!(compare(&v("1.0.0"), &v("1.0.0")), Ordering::Equal);
        assert_eq!(compare(&v("1.0.0"), &v("1.0.1")), Ordering::Less);
        assert_eq!(compare(&v("1.1.0"), &v("1.0.9")), Ordering::Greater);
        assert_eq!(compare(&v("2.0.0"), &v("1.9.9")), Ordering::Greater);
    }

    #[test]
    fn test_compare_antisymmetric() {
        let pairs = [("1.0.0", "2.0.0"), ("1.2.3", "1.2.3"), ("0.1.0", "0.0.9")];
        for (a, b) in pairs {
            let (a, b) = (v(a), v(b));
            assert_eq!(compare(&a, &b), compare(&b, &a).reverse());
        }
    }

    #[test]
    fn test_compare_ignores_suffix() {
        // 后缀不参与排序
        assert_eq!(compare(&v("1.0.0-alpha"), &v("1.0.0")), Ordering::Equal);
        assert_eq!(compare(&v("1.0.0+build.5"), &v("1.0.0-rc.1")), Ordering::Equal);
    }

    #[test]
    fn test_requirement_empty_matches_any() {
        let req: VersionRequirement = "".parse().unwrap();
        assert_eq!(req, VersionRequirement::Any);
        assert!(req.matches(&v("0.0.1")));
        assert!(req.matches(&v("99.0.0")));
    }

    #[test]
    fn test_requirement_default_op_is_exact() {
        let req: VersionRequirement = "1.2.3".parse().unwrap();
        assert!(req.matches(&v("1.2.3")));
        assert!(!req.matches(&v("1.2.4")));
    }

    #[test]
    fn test_requirement_operators() {
        assert!(satisfies(&v("1.5.0"), ">=1.0.0").unwrap());
        assert!(satisfies(&v("1.0.0"), ">=1.0.0").unwrap());
        assert!(!satisfies(&v("0.9.9"), ">=1.0.0").unwrap());

        assert!(satisfies(&v("1.0.1"), ">1.0.0").unwrap());
        assert!(!satisfies(&v("1.0.0"), ">1.0.0").unwrap());

        assert!(satisfies(&v("1.0.0"), "<=1.0.0").unwrap());
        assert!(!satisfies(&v("1.0.1"), "<=1.0.0").unwrap());

        assert!(satisfies(&v("0.9.0"), "<1.0.0").unwrap());
        assert!(!satisfies(&v("1.0.0"), "<1.0.0").unwrap());

        assert!(satisfies(&v("2.0.0"), "==2.0.0").unwrap());
        assert!(!satisfies(&v("2.0.1"), "==2.0.0").unwrap());
    }

    #[test]
    fn test_requirement_tilde() {
        // 主次版本相同，补丁号为下限
        assert!(satisfies(&v("1.2.3"), "~1.2.3").unwrap());
        assert!(satisfies(&v("1.2.9"), "~1.2.3").unwrap());
        assert!(!satisfies(&v("1.2.2"), "~1.2.3").unwrap());
        assert!(!satisfies(&v("1.3.0"), "~1.2.3").unwrap());
        assert!(!satisfies(&v("2.2.3"), "~1.2.3").unwrap());
    }

    #[test]
    fn test_requirement_whitespace_after_op() {
        assert!(satisfies(&v("1.5.0"), ">= 1.0.0").unwrap());
        assert!(satisfies(&v("1.2.4"), "~  1.2.3").unwrap());
    }

    #[test]
    fn test_requirement_self_satisfying() {
        for s in ["1.0.0", "0.4.7", "12.34.56"] {
            let ver = v(s);
            assert!(satisfies(&ver, &format!(">={}", s)).unwrap());
            assert!(satisfies(&ver, &format!("=={}", s)).unwrap());
            assert!(satisfies(&ver, &format!("~{}", s)).unwrap());
        }
    }

    #[test]
    fn test_requirement_invalid() {
        assert!("^1.0.0".parse::<VersionRequirement>().is_err());
        assert!(">=abc".parse::<VersionRequirement>().is_err());
        assert!("=!1.0.0".parse::<VersionRequirement>().is_err());
        assert!(satisfies(&v("1.0.0"), "not-a-version").is_err());
    }

    #[test]
    fn test_requirement_display_roundtrip() {
        for s in ["==1.2.3", ">=0.1.0", "~2.0.0", "<3.0.0"] {
            let req: VersionRequirement = s.parse().unwrap();
            assert_eq!(req.to_string(), s);
        }
    }
}
