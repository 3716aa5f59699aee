//! 模块运行时
//!
//! 定义加载器与实际装载机制之间的接口。[`NativeRuntime`] 打开原生
//! 共享库并解析清单配置的四个生命周期符号；测试中可以用桩实现
//! 替换，而不触碰真实的动态链接器。
//!
//! 共享库以全局可见性加载：后加载模块可以直接查找先加载模块导出
//! 的符号，跨模块服务注册表依赖这一点。四个生命周期钩子之外的
//! 导出符号需要模块自行加前缀避免冲突。

use std::os::raw::c_int;
use std::path::Path;

use libloading::os::unix::{Library, Symbol, RTLD_GLOBAL, RTLD_LAZY};
use tracing::debug;

use crate::module::manifest::EntryPoints;
use crate::utils::{HelixError, Result};

/// init/start/stop 钩子签名：返回零表示成功
type LifecycleFn = unsafe extern "C" fn() -> c_int;

/// destroy 钩子签名
type DestroyFn = unsafe extern "C" fn();

/// 已加载的模块实例
///
/// 加载器通过该接口驱动生命周期钩子，不关心背后是真实共享库
/// 还是测试桩。钩子返回非零值表示失败，由加载器转译为错误。
pub trait ModuleInstance: Send {
    /// 调用 init 钩子
    fn invoke_init(&mut self) -> i32;

    /// 调用 start 钩子
    fn invoke_start(&mut self) -> i32;

    /// 调用 stop 钩子
    fn invoke_stop(&mut self) -> i32;

    /// 调用 destroy 钩子
    fn invoke_destroy(&mut self);

    /// 关闭底层句柄
    ///
    /// 返回错误时实例同样被消费，调用方据此上报但不保留记录。
    fn close(self: Box<Self>) -> std::result::Result<(), String>;
}

/// 模块运行时接口
///
/// 负责把共享库路径与入口符号配置变成可调用的模块实例。
pub trait ModuleRuntime: Send + Sync {
    /// 加载模块
    ///
    /// 任何一步失败（打开共享库、解析符号）都必须释放已持有的
    /// 句柄后返回错误。
    fn load(
        &self,
        name: &str,
        path: &Path,
        entry_points: &EntryPoints,
    ) -> Result<Box<dyn ModuleInstance>>;
}

/// 四个生命周期钩子的可调用指针
struct LifecycleHooks {
    init: Symbol<LifecycleFn>,
    start: Symbol<LifecycleFn>,
    stop: Symbol<LifecycleFn>,
    destroy: Symbol<DestroyFn>,
}

/// 原生共享库实例
struct NativeInstance {
    library: Option<Library>,
    hooks: LifecycleHooks,
}

impl ModuleInstance for NativeInstance {
    fn invoke_init(&mut self) -> i32 {
        let f: LifecycleFn = *self.hooks.init;
        unsafe { f() }
    }

    fn invoke_start(&mut self) -> i32 {
        let f: LifecycleFn = *self.hooks.start;
        unsafe { f() }
    }

    fn invoke_stop(&mut self) -> i32 {
        let f: LifecycleFn = *self.hooks.stop;
        unsafe { f() }
    }

    fn invoke_destroy(&mut self) {
        let f: DestroyFn = *self.hooks.destroy;
        unsafe { f() }
    }

    fn close(mut self: Box<Self>) -> std::result::Result<(), String> {
        match self.library.take() {
            Some(library) => library.close().map_err(|e| e.to_string()),
            None => Ok(()),
        }
    }
}

/// 原生运行时
///
/// 以 `RTLD_LAZY | RTLD_GLOBAL` 打开共享库，按清单配置（或默认值）
/// 解析四个入口符号。
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeRuntime;

impl NativeRuntime {
    /// 创建原生运行时
    pub fn new() -> Self {
        Self
    }

    fn resolve<T: Copy>(library: &Library, module: &str, symbol: &str) -> Result<Symbol<T>> {
        unsafe { library.get::<T>(symbol.as_bytes()) }.map_err(|_| HelixError::SymbolMissing {
            module: module.to_string(),
            symbol: symbol.to_string(),
        })
    }
}

impl ModuleRuntime for NativeRuntime {
    fn load(
        &self,
        name: &str,
        path: &Path,
        entry_points: &EntryPoints,
    ) -> Result<Box<dyn ModuleInstance>> {
        // 懒重定位 + 全局符号可见性
        let library = unsafe { Library::open(Some(path), RTLD_LAZY | RTLD_GLOBAL) }.map_err(
            |e| HelixError::LoadFailed {
                module: name.to_string(),
                reason: e.to_string(),
            },
        )?;

        // 任一符号缺失时 library 随错误返回被释放，句柄随之关闭
        let hooks = LifecycleHooks {
            init: Self::resolve(&library, name, entry_points.init_symbol())?,
            start: Self::resolve(&library, name, entry_points.start_symbol())?,
            stop: Self::resolve(&library, name, entry_points.stop_symbol())?,
            destroy: Self::resolve(&library, name, entry_points.destroy_symbol())?,
        };

        debug!(module = %name, path = %path.display(), "共享库加载完成");
        Ok(Box::new(NativeInstance {
            library: Some(library),
            hooks,
        }))
    }
}
