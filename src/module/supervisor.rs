//! 模块监管器
//!
//! 整合注册表、依赖解析器与加载器，实现模块群的生命周期状态机：
//! 安装、启用、启动、停止、禁用、卸载，以及期望状态的持久化与
//! 重启恢复。
//!
//! 监管器是注册表唯一的修改者。所有状态迁移都经由它的方法串行
//! 执行；控制通道把并发请求排成单一队列后逐条调用。

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use semver::Version;
use tracing::{debug, error, info, instrument, warn};

use crate::module::loader::ModuleLoader;
use crate::module::manifest::ModuleManifest;
use crate::module::parser::ManifestParser;
use crate::module::resolver::DependencyResolver;
use crate::module::runtime::{ModuleRuntime, NativeRuntime};
use crate::module::state::{ModuleState, StateFile};
use crate::module::version::VersionRequirement;
use crate::utils::{HelixError, Result};
use crate::{API_VERSION, CORE_VERSION};

/// 安装包扩展名
pub const PACKAGE_EXTENSION: &str = "helx";

/// 模块目录内的清单文件名
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// 安装标记文件名
///
/// 扫描时只有带此标记的目录才会被注册。
pub const INSTALL_MARKER: &str = ".helx_installed";

/// 注册表条目
#[derive(Debug, Clone)]
pub struct ModuleEntry {
    /// 模块名
    pub name: String,
    /// 模块版本
    pub version: String,
    /// 安装目录
    pub install_path: PathBuf,
    /// 模块清单
    pub manifest: ModuleManifest,
    /// 当前状态
    pub state: ModuleState,
    /// 最近一次成功启用（初始化）的时间
    pub enabled_at: Option<DateTime<Utc>>,
    /// 最近一次成功启动的时间
    pub started_at: Option<DateTime<Utc>>,
    /// 最近一次失败操作的错误信息
    pub last_error: Option<String>,
}

impl ModuleEntry {
    fn new(manifest: ModuleManifest, install_path: PathBuf) -> Self {
        Self {
            name: manifest.name.clone(),
            version: manifest.version.clone(),
            install_path,
            manifest,
            state: ModuleState::Installed,
            enabled_at: None,
            started_at: None,
            last_error: None,
        }
    }
}

/// 模块监管器
///
/// 负责模块群的完整生命周期管理，包括：
/// - 模块目录扫描与注册
/// - 安装包解包与安装
/// - 依赖优先的启用与启动
/// - 期望状态持久化与恢复
pub struct Supervisor {
    /// 模块安装目录
    modules_dir: PathBuf,
    /// 注册表：模块名 -> 条目
    registry: HashMap<String, ModuleEntry>,
    /// 依赖解析器
    resolver: DependencyResolver,
    /// 模块加载器
    loader: ModuleLoader,
    /// 是否已初始化
    initialized: bool,
    /// 最近一次失败操作的错误信息
    last_error: Option<String>,
}

impl Supervisor {
    /// 使用原生运行时创建监管器
    pub fn new() -> Self {
        Self::with_runtime(Arc::new(NativeRuntime::new()))
    }

    /// 使用指定运行时创建监管器
    pub fn with_runtime(runtime: Arc<dyn ModuleRuntime>) -> Self {
        Self {
            modules_dir: PathBuf::new(),
            registry: HashMap::new(),
            resolver: DependencyResolver::new(),
            loader: ModuleLoader::new(runtime),
            initialized: false,
            last_error: None,
        }
    }

    // ==================== 初始化与关闭 ====================

    /// 初始化监管器
    ///
    /// 创建模块目录（如不存在），扫描带安装标记的子目录并注册，
    /// 随后尝试恢复上次退出时保存的期望状态。恢复失败只降级为
    /// 部分恢复，不阻止守护进程启动。
    pub async fn initialize(&mut self, modules_dir: impl Into<PathBuf>) -> Result<()> {
        if self.initialized {
            return Err(HelixError::DaemonAlreadyInitialized);
        }

        self.modules_dir = modules_dir.into();
        tokio::fs::create_dir_all(&self.modules_dir).await?;

        self.scan_modules_directory().await?;
        self.initialized = true;

        match StateFile::load(&self.modules_dir).await {
            Ok(Some(saved)) => {
                info!(modules = saved.modules.len(), "恢复上次保存的模块状态");
                self.restore_saved_states(saved).await;
            }
            Ok(None) => {
                debug!("没有可恢复的模块状态");
            }
            Err(e) => {
                warn!(error = %e, "期望状态文件读取失败, 跳过恢复");
            }
        }

        info!(dir = %self.modules_dir.display(), modules = self.registry.len(), "监管器初始化完成");
        Ok(())
    }

    /// 关闭监管器
    ///
    /// 保存期望状态，停止所有运行中的模块，禁用所有已启用的模块，
    /// 最后清空注册表。重复调用是无害的空操作。
    pub async fn shutdown(&mut self) {
        if !self.initialized {
            return;
        }

        info!("监管器开始关闭");

        let mut state = StateFile::default();
        for entry in self.registry.values() {
            state.record(&entry.name, entry.state);
        }
        if let Err(e) = state.save(&self.modules_dir).await {
            warn!(error = %e, "期望状态保存失败");
        }

        // 先停止依赖方，再停止被依赖方
        let order = self.shutdown_order();

        for name in &order {
            if self.module_state(name) == Some(ModuleState::Running) {
                info!(module = %name, "停止模块");
                if let Err(e) = self.stop_inner(name).await {
                    warn!(module = %name, error = %e, "关闭时停止模块失败");
                }
            }
        }

        for name in &order {
            if self
                .module_state(name)
                .map(|s| s.is_enabled() || s == ModuleState::Error)
                .unwrap_or(false)
                && self.loader.is_loaded(name)
            {
                info!(module = %name, "禁用模块");
                if let Err(e) = self.disable_inner(name).await {
                    warn!(module = %name, error = %e, "关闭时禁用模块失败");
                }
            }
        }

        self.registry.clear();
        self.resolver.clear();
        self.loader.clear();
        self.initialized = false;
        self.last_error = None;

        info!("监管器关闭完成");
    }

    // ==================== 控制动词 ====================

    /// 从 .helx 安装包安装模块
    pub async fn install(&mut self, package_path: &Path) -> Result<()> {
        let result = self.install_inner(package_path).await;
        self.note_result(&result);
        result
    }

    /// 卸载模块
    pub async fn uninstall(&mut self, name: &str) -> Result<()> {
        let result = self.uninstall_inner(name).await;
        self.note_result(&result);
        result
    }

    /// 启用模块（加载并初始化，依赖先行进入运行状态）
    pub async fn enable(&mut self, name: &str) -> Result<()> {
        let result = self.enable_inner(name).await;
        self.note_result(&result);
        result
    }

    /// 禁用模块（必要时先停止，然后卸载）
    pub async fn disable(&mut self, name: &str) -> Result<()> {
        let result = self.disable_inner(name).await;
        self.note_result(&result);
        result
    }

    /// 启动模块
    pub async fn start(&mut self, name: &str) -> Result<()> {
        let result = self.start_inner(name).await;
        self.note_result(&result);
        result
    }

    /// 停止模块
    pub async fn stop(&mut self, name: &str) -> Result<()> {
        let result = self.stop_inner(name).await;
        self.note_result(&result);
        result
    }

    // ==================== 查询接口 ====================

    /// 获取模块条目
    pub fn module(&self, name: &str) -> Option<&ModuleEntry> {
        self.registry.get(name)
    }

    /// 所有已注册模块名（按名称排序）
    pub fn module_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.registry.keys().cloned().collect();
        names.sort();
        names
    }

    /// 处于指定状态的模块名（按名称排序）
    pub fn modules_by_state(&self, state: ModuleState) -> Vec<String> {
        let mut names: Vec<_> = self
            .registry
            .values()
            .filter(|e| e.state == state)
            .map(|e| e.name.clone())
            .collect();
        names.sort();
        names
    }

    /// 运行中的模块名
    pub fn running_modules(&self) -> Vec<String> {
        self.modules_by_state(ModuleState::Running)
    }

    /// 已注册模块数量
    pub fn module_count(&self) -> usize {
        self.registry.len()
    }

    /// 是否已初始化
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// 模块目录
    pub fn modules_dir(&self) -> &Path {
        &self.modules_dir
    }

    /// 最近一次失败操作的错误信息
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// 守护进程状态报告
    pub fn status_report(&self) -> String {
        let mut report = String::from("Helix Daemon Status:\n");
        report.push_str(&format!(
            "  Initialized: {}\n",
            if self.initialized { "Yes" } else { "No" }
        ));
        report.push_str(&format!(
            "  Modules Directory: {}\n",
            self.modules_dir.display()
        ));
        report.push_str(&format!("  Total Modules: {}\n", self.registry.len()));

        for state in [
            ModuleState::Installed,
            ModuleState::Loaded,
            ModuleState::Initialized,
            ModuleState::Running,
            ModuleState::Stopped,
            ModuleState::Error,
        ] {
            let modules = self.modules_by_state(state);
            if !modules.is_empty() {
                report.push_str(&format!("  {}: {}\n", state, modules.len()));
            }
        }

        report
    }

    // ==================== 内部实现 ====================

    fn ensure_initialized(&self) -> Result<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(HelixError::DaemonNotInitialized)
        }
    }

    fn note_result(&mut self, result: &Result<()>) {
        match result {
            Ok(()) => self.last_error = None,
            Err(e) => self.last_error = Some(e.to_string()),
        }
    }

    fn module_state(&self, name: &str) -> Option<ModuleState> {
        self.registry.get(name).map(|e| e.state)
    }

    /// 更新模块状态与错误信息，维护时间戳
    fn update_state(&mut self, name: &str, state: ModuleState, error: Option<String>) {
        if let Some(entry) = self.registry.get_mut(name) {
            entry.state = state;
            entry.last_error = error;
            match state {
                ModuleState::Initialized => entry.enabled_at = Some(Utc::now()),
                ModuleState::Running => entry.started_at = Some(Utc::now()),
                _ => {}
            }
        }
    }

    /// 仅记录模块错误，不改变状态
    fn record_module_error(&mut self, name: &str, error: String) {
        if let Some(entry) = self.registry.get_mut(name) {
            entry.last_error = Some(error);
        }
    }

    /// 扫描模块目录，注册带安装标记的子目录
    async fn scan_modules_directory(&mut self) -> Result<()> {
        let mut entries = tokio::fs::read_dir(&self.modules_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            if !path.join(INSTALL_MARKER).exists() {
                debug!(path = %path.display(), "缺少安装标记, 跳过");
                continue;
            }

            let manifest_path = path.join(MANIFEST_FILE_NAME);
            match ManifestParser::parse_file(&manifest_path).await {
                Ok(manifest) => {
                    let name = manifest.name.clone();
                    if self.registry.contains_key(&name) {
                        warn!(module = %name, path = %path.display(), "同名模块已注册, 跳过");
                        continue;
                    }
                    if let Err(e) = self.resolver.add(manifest.clone()) {
                        warn!(module = %name, error = %e, "解析器注册失败, 跳过");
                        continue;
                    }
                    self.registry
                        .insert(name.clone(), ModuleEntry::new(manifest, path.clone()));
                    info!(module = %name, path = %path.display(), "发现已安装模块");
                }
                Err(e) => {
                    warn!(path = %manifest_path.display(), error = %e, "清单解析失败, 跳过");
                }
            }
        }

        Ok(())
    }

    /// 校验宿主版本满足模块声明的最低要求
    fn check_host_compatibility(manifest: &ModuleManifest) -> Result<()> {
        for (subject, host_version, minimum) in [
            ("Helix core", CORE_VERSION, &manifest.minimum_core_version),
            ("Helix API", API_VERSION, &manifest.minimum_api_version),
        ] {
            let minimum = match minimum {
                Some(m) => m,
                None => continue,
            };

            let host = Version::parse(host_version)?;
            let requirement: VersionRequirement = format!(">={}", minimum).parse()?;
            if !requirement.matches(&host) {
                return Err(HelixError::VersionUnsatisfied {
                    subject: subject.to_string(),
                    required: format!(">={}", minimum),
                    found: host_version.to_string(),
                });
            }
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn install_inner(&mut self, package_path: &Path) -> Result<()> {
        self.ensure_initialized()?;

        if package_path.extension().and_then(|e| e.to_str()) != Some(PACKAGE_EXTENSION) {
            return Err(HelixError::InvalidArchive(format!(
                "仅支持 .{} 安装包: {}",
                PACKAGE_EXTENSION,
                package_path.display()
            )));
        }

        info!(package = %package_path.display(), "开始安装模块");

        // 解包到模块目录内的临时目录，保证后续 rename 在同一文件系统上
        let staging = self
            .modules_dir
            .join(format!(".tmp_install_{}", std::process::id()));
        tokio::fs::create_dir_all(&staging).await?;

        let result = self.install_from_staging(package_path, &staging).await;
        if result.is_err() {
            let _ = tokio::fs::remove_dir_all(&staging).await;
        }
        result
    }

    async fn install_from_staging(&mut self, package_path: &Path, staging: &Path) -> Result<()> {
        // 1. 解包
        let status = tokio::process::Command::new("tar")
            .arg("-xzf")
            .arg(package_path)
            .arg("-C")
            .arg(staging)
            .status()
            .await
            .map_err(|e| HelixError::InvalidArchive(format!("无法执行 tar: {}", e)))?;
        if !status.success() {
            return Err(HelixError::InvalidArchive(format!(
                "解包失败, tar 退出状态: {}",
                status
            )));
        }

        // 2. 解析并校验清单
        let manifest = ManifestParser::parse_file(&staging.join(MANIFEST_FILE_NAME)).await?;

        // 3. 宿主兼容性
        Self::check_host_compatibility(&manifest)?;

        // 4. 同名模块处理：仅允许覆盖安装处于 Installed 状态的同名模块
        let overwrite = match self.registry.get(&manifest.name) {
            Some(existing) if existing.state == ModuleState::Installed => true,
            Some(_) => {
                return Err(HelixError::ModuleAlreadyInstalled(manifest.name.clone()));
            }
            None => false,
        };

        // 5. 原子晋升到最终目录
        let destination = self.modules_dir.join(&manifest.name);
        if destination.exists() {
            match ManifestParser::parse_file(&destination.join(MANIFEST_FILE_NAME)).await {
                Ok(existing) if existing.name == manifest.name => {
                    tokio::fs::remove_dir_all(&destination).await?;
                }
                Ok(existing) => {
                    return Err(HelixError::InstallRefused {
                        path: destination.display().to_string(),
                        reason: format!("目录属于模块 '{}'", existing.name),
                    });
                }
                Err(_) => {
                    return Err(HelixError::InstallRefused {
                        path: destination.display().to_string(),
                        reason: "无法读取目录内的清单以确认归属".to_string(),
                    });
                }
            }
        }
        tokio::fs::rename(staging, &destination).await?;

        // 6. 写入安装标记
        tokio::fs::write(destination.join(INSTALL_MARKER), b"installed_by=helixd\n").await?;

        // 7. 注册
        if overwrite {
            self.resolver.remove(&manifest.name);
            self.registry.remove(&manifest.name);
        }
        self.resolver.add(manifest.clone())?;
        let name = manifest.name.clone();
        let version = manifest.version.clone();
        self.registry
            .insert(name.clone(), ModuleEntry::new(manifest, destination));

        info!(module = %name, %version, "模块安装完成");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn uninstall_inner(&mut self, name: &str) -> Result<()> {
        self.ensure_initialized()?;

        let entry = self
            .registry
            .get(name)
            .ok_or_else(|| HelixError::ModuleNotFound(name.to_string()))?;
        let install_path = entry.install_path.clone();
        let state = entry.state;

        let dependents = self.resolver.dependents_of(name);
        if !dependents.is_empty() {
            return Err(HelixError::ModuleHasDependents {
                module: name.to_string(),
                dependents,
            });
        }

        if state != ModuleState::Installed {
            self.disable_inner(name).await?;
        }

        tokio::fs::remove_dir_all(&install_path).await?;

        self.resolver.remove(name);
        self.registry.remove(name);

        info!(module = %name, "模块卸载（移除）完成");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn enable_inner(&mut self, name: &str) -> Result<()> {
        self.ensure_initialized()?;

        let state = self
            .module_state(name)
            .ok_or_else(|| HelixError::ModuleNotFound(name.to_string()))?;
        if !state.can_enable() {
            return Err(HelixError::ModuleAlreadyEnabled(name.to_string()));
        }

        info!(module = %name, "启用模块");

        // 解析失败时模块停留在 Installed，操作员修正后可重试
        let targets = vec![name.to_string()];
        let order = match self.resolver.resolve(&targets) {
            Ok(order) => order,
            Err(failure) => {
                let err = failure.into_error(name);
                self.record_module_error(name, err.to_string());
                return Err(err);
            }
        };

        // 必需依赖闭包：这些模块必须先进入运行状态
        let mandatory = self.mandatory_closure(name);

        for dep in order.iter().filter(|d| d.as_str() != name) {
            if self.module_state(dep) == Some(ModuleState::Installed) {
                self.enable_single(dep).await.map_err(|e| {
                    HelixError::DependencyFailed {
                        module: name.to_string(),
                        dependency: dep.clone(),
                        reason: e.to_string(),
                    }
                })?;
            }

            if self
                .module_state(dep)
                .map(|s| s.can_start())
                .unwrap_or(false)
            {
                self.start_inner(dep).await.map_err(|e| {
                    HelixError::DependencyFailed {
                        module: name.to_string(),
                        dependency: dep.clone(),
                        reason: e.to_string(),
                    }
                })?;
            }

            if mandatory.contains(dep) && self.module_state(dep) != Some(ModuleState::Running) {
                return Err(HelixError::DependencyFailed {
                    module: name.to_string(),
                    dependency: dep.clone(),
                    reason: format!(
                        "依赖处于 {} 状态",
                        self.module_state(dep).unwrap_or(ModuleState::Unknown)
                    ),
                });
            }
        }

        self.enable_single(name).await?;
        info!(module = %name, "模块启用完成");
        Ok(())
    }

    /// 加载并初始化单个模块，不处理依赖
    async fn enable_single(&mut self, name: &str) -> Result<()> {
        let entry = self
            .registry
            .get(name)
            .ok_or_else(|| HelixError::ModuleNotFound(name.to_string()))?;
        let binary_path = entry.install_path.join(&entry.manifest.binary_path);
        let entry_points = entry.manifest.entry_points.clone();

        if let Err(e) = self.loader.load(name, &binary_path, &entry_points) {
            error!(module = %name, error = %e, "共享库加载失败");
            self.update_state(name, ModuleState::Installed, Some(e.to_string()));
            return Err(e);
        }
        self.update_state(name, ModuleState::Loaded, None);

        if let Err(e) = self.loader.init(name) {
            error!(module = %name, error = %e, "init 钩子失败, 回滚加载");
            if let Err(unload_err) = self.loader.unload(name) {
                warn!(module = %name, error = %unload_err, "回滚卸载失败");
            }
            self.update_state(name, ModuleState::Installed, Some(e.to_string()));
            return Err(e);
        }

        self.update_state(name, ModuleState::Initialized, None);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn disable_inner(&mut self, name: &str) -> Result<()> {
        self.ensure_initialized()?;

        let state = self
            .module_state(name)
            .ok_or_else(|| HelixError::ModuleNotFound(name.to_string()))?;
        if state == ModuleState::Installed {
            return Err(HelixError::ModuleNotEnabled(name.to_string()));
        }

        info!(module = %name, "禁用模块");

        if state == ModuleState::Running {
            self.stop_inner(name).await?;
        }

        if self.loader.is_loaded(name) {
            if let Err(e) = self.loader.unload(name) {
                self.update_state(name, ModuleState::Error, Some(e.to_string()));
                return Err(e);
            }
        }

        self.update_state(name, ModuleState::Installed, None);
        info!(module = %name, "模块禁用完成");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn start_inner(&mut self, name: &str) -> Result<()> {
        self.ensure_initialized()?;

        let state = self
            .module_state(name)
            .ok_or_else(|| HelixError::ModuleNotFound(name.to_string()))?;
        if !state.can_start() {
            return Err(match state {
                ModuleState::Running => HelixError::ModuleAlreadyRunning(name.to_string()),
                _ => HelixError::ModuleNotEnabled(name.to_string()),
            });
        }

        if let Err(e) = self.loader.start(name) {
            // 启动失败停留在原状态
            self.record_module_error(name, e.to_string());
            return Err(e);
        }

        self.update_state(name, ModuleState::Running, None);
        info!(module = %name, "模块启动完成");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn stop_inner(&mut self, name: &str) -> Result<()> {
        self.ensure_initialized()?;

        let state = self
            .module_state(name)
            .ok_or_else(|| HelixError::ModuleNotFound(name.to_string()))?;
        if !state.can_stop() {
            return Err(HelixError::ModuleNotRunning(name.to_string()));
        }

        if let Err(e) = self.loader.stop(name) {
            // 停止失败后模块不可用，转入 Error 等待操作员处置
            error!(module = %name, error = %e, "stop 钩子失败");
            self.update_state(name, ModuleState::Error, Some(e.to_string()));
            return Err(e);
        }

        self.update_state(name, ModuleState::Stopped, None);
        info!(module = %name, "模块停止完成");
        Ok(())
    }

    /// 从指定模块出发的必需依赖闭包（不含自身）
    fn mandatory_closure(&self, name: &str) -> Vec<String> {
        let mut closure = Vec::new();
        let mut queue = vec![name.to_string()];
        while let Some(current) = queue.pop() {
            if let Some(manifest) = self.resolver.manifest(&current) {
                for dep in manifest.required_dependencies() {
                    if !closure.contains(&dep.name) {
                        closure.push(dep.name.clone());
                        queue.push(dep.name.clone());
                    }
                }
            }
        }
        closure
    }

    /// 关闭时的处理顺序：依赖方在前
    fn shutdown_order(&self) -> Vec<String> {
        match self.resolver.resolve(&[]) {
            Ok(mut order) => {
                order.reverse();
                order
            }
            Err(_) => self.module_names(),
        }
    }

    /// 恢复上次退出时保存的模块状态
    ///
    /// 第一遍把保存为 Initialized/Running/Stopped 的模块恢复到启用
    /// 状态，第二遍启动保存为 Running 的模块；两遍都按依赖优先的
    /// 顺序进行，单个模块失败只记录告警。
    async fn restore_saved_states(&mut self, saved: StateFile) {
        let mut to_enable: Vec<String> = Vec::new();
        for (name, record) in &saved.modules {
            if !record.state.wants_enable_on_restore() {
                continue;
            }
            if self.registry.contains_key(name) {
                to_enable.push(name.clone());
            } else {
                warn!(module = %name, "模块已不存在, 跳过状态恢复");
            }
        }
        to_enable.sort();

        if !to_enable.is_empty() {
            let order = match self.resolver.resolve(&to_enable) {
                Ok(order) => order,
                Err(failure) => {
                    warn!(
                        missing = ?failure.missing,
                        cyclic = ?failure.cyclic,
                        "恢复时依赖解析失败, 退化为按名称顺序"
                    );
                    to_enable.clone()
                }
            };

            for name in &order {
                if self.module_state(name) == Some(ModuleState::Installed) {
                    if let Err(e) = self.enable_inner(name).await {
                        warn!(module = %name, error = %e, "恢复启用失败");
                    }
                }
            }
        }

        let mut to_start: Vec<String> = saved
            .modules
            .iter()
            .filter(|(name, record)| {
                record.state == ModuleState::Running && self.registry.contains_key(*name)
            })
            .map(|(name, _)| name.clone())
            .collect();
        to_start.sort();

        if !to_start.is_empty() {
            let order = match self.resolver.resolve(&to_start) {
                Ok(order) => order,
                Err(_) => to_start.clone(),
            };

            for name in &order {
                if self
                    .module_state(name)
                    .map(|s| s.can_start())
                    .unwrap_or(false)
                {
                    if let Err(e) = self.start_inner(name).await {
                        warn!(module = %name, error = %e, "恢复启动失败");
                    }
                }
            }
        }
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}
