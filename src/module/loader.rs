//! 模块加载器
//!
//! 持有已加载模块的实例与生命周期标志，强制 init/start/stop/destroy
//! 的调用顺序。加载器不理解依赖关系，调用顺序由监管器保证。

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::module::manifest::EntryPoints;
use crate::module::runtime::{ModuleInstance, ModuleRuntime};
use crate::utils::{HelixError, Result};

/// 已加载模块的记录
struct LoadedModule {
    /// 共享库路径
    path: PathBuf,
    /// 模块实例
    instance: Box<dyn ModuleInstance>,
    /// init 是否已成功执行
    initialized: bool,
    /// start 是否已成功执行且尚未停止
    running: bool,
}

/// 模块加载器
///
/// 每个模块名至多持有一份已加载记录；重复加载同名模块会被拒绝。
pub struct ModuleLoader {
    /// 实际装载机制
    runtime: Arc<dyn ModuleRuntime>,
    /// 已加载模块：模块名 -> 记录
    modules: HashMap<String, LoadedModule>,
}

impl ModuleLoader {
    /// 创建加载器
    pub fn new(runtime: Arc<dyn ModuleRuntime>) -> Self {
        Self {
            runtime,
            modules: HashMap::new(),
        }
    }

    /// 加载共享库并解析入口符号
    ///
    /// 同名模块已加载时拒绝；运行时加载失败不留下任何记录。
    pub fn load(&mut self, name: &str, path: &Path, entry_points: &EntryPoints) -> Result<()> {
        if self.modules.contains_key(name) {
            return Err(HelixError::ModuleAlreadyLoaded(name.to_string()));
        }

        let instance = self.runtime.load(name, path, entry_points)?;
        self.modules.insert(
            name.to_string(),
            LoadedModule {
                path: path.to_path_buf(),
                instance,
                initialized: false,
                running: false,
            },
        );

        info!(module = %name, path = %path.display(), "模块已加载");
        Ok(())
    }

    /// 卸载模块
    ///
    /// 运行中的模块先停止；已初始化的模块调用 destroy；随后关闭
    /// 句柄并丢弃记录。关闭失败会被上报，但记录仍然被丢弃。
    pub fn unload(&mut self, name: &str) -> Result<()> {
        if !self.modules.contains_key(name) {
            return Err(HelixError::ModuleNotLoaded(name.to_string()));
        }

        if self.modules[name].running {
            self.stop(name)?;
        }

        let mut module = self
            .modules
            .remove(name)
            .expect("存在性已在上方确认");

        if module.initialized {
            module.instance.invoke_destroy();
        }

        if let Err(reason) = module.instance.close() {
            warn!(module = %name, %reason, "关闭模块句柄失败");
            return Err(HelixError::UnloadFailed {
                module: name.to_string(),
                reason,
            });
        }

        info!(module = %name, "模块已卸载");
        Ok(())
    }

    /// 初始化模块
    ///
    /// 前置条件：已加载且尚未初始化。钩子返回非零值时初始化标志
    /// 保持不变。
    pub fn init(&mut self, name: &str) -> Result<()> {
        let module = self
            .modules
            .get_mut(name)
            .ok_or_else(|| HelixError::ModuleNotLoaded(name.to_string()))?;

        if module.initialized {
            return Err(HelixError::ModuleAlreadyInitialized(name.to_string()));
        }

        let code = module.instance.invoke_init();
        if code != 0 {
            return Err(HelixError::HookFailed {
                module: name.to_string(),
                hook: "init",
                code,
            });
        }

        module.initialized = true;
        Ok(())
    }

    /// 启动模块
    ///
    /// 前置条件：已初始化且未运行。钩子返回非零值时运行标志保持
    /// 不变。
    pub fn start(&mut self, name: &str) -> Result<()> {
        let module = self
            .modules
            .get_mut(name)
            .ok_or_else(|| HelixError::ModuleNotLoaded(name.to_string()))?;

        if !module.initialized {
            return Err(HelixError::ModuleNotEnabled(name.to_string()));
        }
        if module.running {
            return Err(HelixError::ModuleAlreadyRunning(name.to_string()));
        }

        let code = module.instance.invoke_start();
        if code != 0 {
            return Err(HelixError::HookFailed {
                module: name.to_string(),
                hook: "start",
                code,
            });
        }

        module.running = true;
        Ok(())
    }

    /// 停止模块
    ///
    /// 前置条件：运行中。钩子返回非零值时 `running` 保持为真，
    /// 模块进入不可用状态，由监管器决定后续处置。
    pub fn stop(&mut self, name: &str) -> Result<()> {
        let module = self
            .modules
            .get_mut(name)
            .ok_or_else(|| HelixError::ModuleNotLoaded(name.to_string()))?;

        if !module.running {
            return Err(HelixError::ModuleNotRunning(name.to_string()));
        }

        let code = module.instance.invoke_stop();
        if code != 0 {
            return Err(HelixError::HookFailed {
                module: name.to_string(),
                hook: "stop",
                code,
            });
        }

        module.running = false;
        Ok(())
    }

    /// 检查模块是否已加载
    pub fn is_loaded(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// 检查模块是否在运行
    pub fn is_running(&self, name: &str) -> bool {
        self.modules.get(name).map(|m| m.running).unwrap_or(false)
    }

    /// 已加载模块的名称列表（按名称排序）
    pub fn loaded_modules(&self) -> Vec<String> {
        let mut names: Vec<_> = self.modules.keys().cloned().collect();
        names.sort();
        names
    }

    /// 模块的共享库路径
    pub fn module_path(&self, name: &str) -> Option<&Path> {
        self.modules.get(name).map(|m| m.path.as_path())
    }

    /// 丢弃全部记录
    ///
    /// 仅在守护进程关闭的最后阶段使用；实例析构时释放句柄。
    pub fn clear(&mut self) {
        self.modules.clear();
    }
}
