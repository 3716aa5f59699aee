//! 控制接口
//!
//! 包含本地控制通道的两个部分：
//!
//! - `dispatch`: 单行命令到监管器调用的翻译
//! - `ipc`: Unix 域套接字服务器，按连接逐条处理命令

pub mod dispatch;
pub mod ipc;

pub use dispatch::dispatch;
pub use ipc::IpcServer;
