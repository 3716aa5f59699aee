//! 依赖解析器
//!
//! 维护已注册模块之间的依赖图，计算依赖优先的加载顺序，并在解析时
//! 报告缺失依赖与循环依赖。
//!
//! # 主要组件
//!
//! - [`DependencyResolver`] - 持有清单副本与正反向邻接表
//! - [`ResolutionFailure`] - 解析失败时同时携带缺失集与成环集
//!
//! 可选依赖只有在被依赖方已注册时才进入图中；未注册的可选依赖不
//! 影响解析结果。

use std::collections::{BTreeSet, HashMap, VecDeque};

use tracing::debug;

use crate::module::manifest::ModuleManifest;
use crate::module::version::VersionRequirement;
use crate::utils::{HelixError, Result};

/// 依赖解析失败
///
/// `missing` 包含缺失的必需依赖（包括版本不满足要求的情况），
/// `cyclic` 包含位于可达循环上的模块。两个集合按名称排序。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionFailure {
    /// 缺失（或版本不满足）的模块名
    pub missing: Vec<String>,
    /// 位于循环依赖上的模块名
    pub cyclic: Vec<String>,
}

impl ResolutionFailure {
    /// 转换为面向调用方的错误
    pub fn into_error(self, module: impl Into<String>) -> HelixError {
        HelixError::DependencyResolution {
            module: module.into(),
            missing: self.missing,
            cyclic: self.cyclic,
        }
    }
}

/// 依赖解析器
///
/// 注册表的只读影子：监管器在注册/注销模块时同步增删清单，
/// 解析器据此重建正反向依赖图。
#[derive(Debug, Default)]
pub struct DependencyResolver {
    /// 已注册模块清单：模块名 -> 清单
    modules: HashMap<String, ModuleManifest>,
    /// 正向边：模块名 -> 它依赖的模块集合
    forward: HashMap<String, BTreeSet<String>>,
    /// 反向边：模块名 -> 依赖它的模块集合
    reverse: HashMap<String, BTreeSet<String>>,
}

impl DependencyResolver {
    /// 创建空的解析器
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册模块清单
    ///
    /// 同名模块已存在时拒绝注册。注册后重建依赖图。
    pub fn add(&mut self, manifest: ModuleManifest) -> Result<()> {
        if self.modules.contains_key(&manifest.name) {
            return Err(HelixError::ModuleAlreadyInstalled(manifest.name));
        }

        debug!(module = %manifest.name, "解析器注册模块");
        self.modules.insert(manifest.name.clone(), manifest);
        self.rebuild_graphs();
        Ok(())
    }

    /// 注销模块并重建依赖图
    pub fn remove(&mut self, name: &str) {
        if self.modules.remove(name).is_some() {
            debug!(module = %name, "解析器注销模块");
            self.rebuild_graphs();
        }
    }

    /// 清空解析器
    pub fn clear(&mut self) {
        self.modules.clear();
        self.forward.clear();
        self.reverse.clear();
    }

    /// 检查模块是否已注册
    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// 获取模块清单
    pub fn manifest(&self, name: &str) -> Option<&ModuleManifest> {
        self.modules.get(name)
    }

    /// 已注册模块数量
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// 解析器是否为空
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// 列出所有已注册模块名（按名称排序）
    pub fn module_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.modules.keys().cloned().collect();
        names.sort();
        names
    }

    /// 模块的直接依赖（图中存在的边）
    pub fn dependencies_of(&self, name: &str) -> Vec<String> {
        self.forward
            .get(name)
            .map(|deps| deps.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// 依赖指定模块的模块列表
    pub fn dependents_of(&self, name: &str) -> Vec<String> {
        self.reverse
            .get(name)
            .map(|deps| deps.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// 解析目标模块集合
    ///
    /// 计算从目标出发经正向边可达的依赖闭包，检查缺失依赖与循环
    /// 依赖；两者皆空时返回依赖优先的拓扑顺序（入度相同的节点按
    /// 名称字典序出队，保证结果确定）。
    ///
    /// 传入空目标集时解析全部已注册模块。
    pub fn resolve(
        &self,
        targets: &[String],
    ) -> std::result::Result<Vec<String>, ResolutionFailure> {
        let targets: Vec<String> = if targets.is_empty() {
            self.module_names()
        } else {
            targets.to_vec()
        };

        let mut missing: BTreeSet<String> = targets
            .iter()
            .filter(|t| !self.modules.contains_key(*t))
            .cloned()
            .collect();

        let closure = self.closure_of(&targets);
        self.collect_missing(&closure, &mut missing);
        let cyclic = self.collect_cycles(&closure);

        if !missing.is_empty() || !cyclic.is_empty() {
            return Err(ResolutionFailure {
                missing: missing.into_iter().collect(),
                cyclic: cyclic.into_iter().collect(),
            });
        }

        Ok(self.topological_order(&closure))
    }

    /// 重建正反向依赖图
    ///
    /// 未注册的可选依赖不产生边。
    fn rebuild_graphs(&mut self) {
        self.forward.clear();
        self.reverse.clear();

        for (name, manifest) in &self.modules {
            let entry = self.forward.entry(name.clone()).or_default();

            for dep in &manifest.dependencies {
                if dep.optional && !self.modules.contains_key(&dep.name) {
                    continue;
                }
                // 仅对已注册模块建边；缺失的必需依赖在解析时报告
                if self.modules.contains_key(&dep.name) {
                    entry.insert(dep.name.clone());
                }
            }
        }

        for (name, deps) in &self.forward {
            for dep in deps {
                self.reverse
                    .entry(dep.clone())
                    .or_default()
                    .insert(name.clone());
            }
        }
    }

    /// 计算从目标出发可达的依赖闭包
    fn closure_of(&self, targets: &[String]) -> BTreeSet<String> {
        let mut closure = BTreeSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();

        for target in targets {
            if self.modules.contains_key(target) && closure.insert(target.clone()) {
                queue.push_back(target);
            }
        }

        while let Some(current) = queue.pop_front() {
            if let Some(deps) = self.forward.get(current) {
                for dep in deps {
                    if closure.insert(dep.clone()) {
                        queue.push_back(dep);
                    }
                }
            }
        }

        closure
    }

    /// 收集闭包内的缺失依赖
    ///
    /// 缺失包括两种情况：必需依赖未注册，或已注册但版本不满足
    /// 声明的要求。
    fn collect_missing(&self, closure: &BTreeSet<String>, missing: &mut BTreeSet<String>) {
        for name in closure {
            let manifest = match self.modules.get(name) {
                Some(m) => m,
                None => continue,
            };

            for dep in manifest.required_dependencies() {
                let registered = match self.modules.get(&dep.name) {
                    Some(m) => m,
                    None => {
                        missing.insert(dep.name.clone());
                        continue;
                    }
                };

                if dep.version.is_empty() {
                    continue;
                }

                let satisfied = match (
                    registered.parsed_version(),
                    dep.version.parse::<VersionRequirement>(),
                ) {
                    (Ok(version), Ok(req)) => req.matches(&version),
                    // 清单在注册前已经校验过；解析失败按不满足处理
                    _ => false,
                };

                if !satisfied {
                    missing.insert(dep.name.clone());
                }
            }
        }
    }

    /// 收集闭包内位于循环上的模块
    ///
    /// 深度优先遍历，遇到指向递归栈内节点的回边时，把栈上从该节点
    /// 到当前节点的整段路径标记为成环节点。只有真正位于某条循环上
    /// 的模块会被标记，循环的前驱不会。
    fn collect_cycles(&self, closure: &BTreeSet<String>) -> BTreeSet<String> {
        let mut visited: BTreeSet<&str> = BTreeSet::new();
        let mut cyclic: BTreeSet<String> = BTreeSet::new();

        for start in closure {
            if !visited.contains(start.as_str()) {
                let mut path: Vec<&str> = Vec::new();
                self.cycle_dfs(start, closure, &mut visited, &mut path, &mut cyclic);
            }
        }

        cyclic
    }

    fn cycle_dfs<'a>(
        &'a self,
        node: &'a str,
        closure: &BTreeSet<String>,
        visited: &mut BTreeSet<&'a str>,
        path: &mut Vec<&'a str>,
        cyclic: &mut BTreeSet<String>,
    ) {
        visited.insert(node);
        path.push(node);

        if let Some(deps) = self.forward.get(node) {
            for dep in deps {
                if !closure.contains(dep) {
                    continue;
                }
                if let Some(pos) = path.iter().position(|n| *n == dep.as_str()) {
                    // 回边：path[pos..] 与该边构成一条循环
                    for on_cycle in &path[pos..] {
                        cyclic.insert((*on_cycle).to_string());
                    }
                } else if !visited.contains(dep.as_str()) {
                    self.cycle_dfs(dep, closure, visited, path, cyclic);
                }
            }
        }

        path.pop();
    }

    /// Kahn 拓扑排序，依赖在前
    ///
    /// 入度只统计闭包内的必需依赖；入度为零的节点按名称字典序
    /// 出队。闭包已通过循环检测，排序必然覆盖全部节点。
    fn topological_order(&self, closure: &BTreeSet<String>) -> Vec<String> {
        let mut in_degree: HashMap<&str, usize> = HashMap::new();
        let mut mandatory_reverse: HashMap<&str, Vec<&str>> = HashMap::new();

        for name in closure {
            let mut degree = 0;
            if let Some(manifest) = self.modules.get(name) {
                for dep in manifest.required_dependencies() {
                    if closure.contains(&dep.name) {
                        degree += 1;
                        mandatory_reverse
                            .entry(dep.name.as_str())
                            .or_default()
                            .push(name.as_str());
                    }
                }
            }
            in_degree.insert(name.as_str(), degree);
        }

        let mut ready: BTreeSet<&str> = in_degree
            .iter()
            .filter(|(_, d)| **d == 0)
            .map(|(n, _)| *n)
            .collect();
        let mut order = Vec::with_capacity(closure.len());

        while let Some(current) = ready.pop_first() {
            order.push(current.to_string());

            if let Some(dependents) = mandatory_reverse.get(current) {
                for dependent in dependents {
                    let degree = in_degree.get_mut(dependent).expect("闭包内节点均已建入度");
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert(dependent);
                    }
                }
            }
        }

        debug_assert_eq!(order.len(), closure.len());
        order
    }
}
