//! 控制通道
//!
//! 基于 Unix 域流式套接字的本地控制端点。每个连接处理一条以换行
//! 结尾的命令：读取、交给分发器、写回响应后关闭。连接按到达顺序
//! 逐个处理，保证监管器的变更路径只有一个写者。
//!
//! # 示例
//!
//! ```rust,no_run
//! use helix_core::api::ipc::IpcServer;
//! use helix_core::module::supervisor::Supervisor;
//! use std::sync::Arc;
//! use tokio::sync::Mutex;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut supervisor = Supervisor::new();
//!     supervisor.initialize("./modules").await?;
//!
//!     let supervisor = Arc::new(Mutex::new(supervisor));
//!     let server = IpcServer::new("/tmp/helixd.sock");
//!     server.serve(supervisor).await?;
//!     Ok(())
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::api::dispatch;
use crate::module::supervisor::Supervisor;
use crate::utils::Result;

/// 控制套接字服务器
pub struct IpcServer {
    /// 套接字路径
    socket_path: PathBuf,
}

impl IpcServer {
    /// 创建服务器
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
        }
    }

    /// 套接字路径
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// 运行接受循环
    ///
    /// 绑定前清理残留的套接字文件，并放宽权限允许非 root 客户端
    /// 连接。该方法只会在监听失败时返回；正常情况下由调用方取消
    /// 任务来结束服务。
    pub async fn serve(&self, supervisor: Arc<Mutex<Supervisor>>) -> Result<()> {
        if let Some(parent) = self.socket_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        // 清理上次异常退出残留的套接字
        if self.socket_path.exists() {
            tokio::fs::remove_file(&self.socket_path).await?;
        }

        let listener = UnixListener::bind(&self.socket_path)?;

        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o666);
            if let Err(e) = std::fs::set_permissions(&self.socket_path, perms) {
                warn!(path = %self.socket_path.display(), error = %e, "放宽套接字权限失败");
            }
        }

        info!(path = %self.socket_path.display(), "控制套接字就绪");

        loop {
            let stream = match listener.accept().await {
                Ok((stream, _)) => stream,
                Err(e) => {
                    warn!(error = %e, "accept 失败");
                    continue;
                }
            };

            if let Err(e) = handle_connection(stream, &supervisor).await {
                warn!(error = %e, "处理控制连接失败");
            }
        }
    }

    /// 移除套接字文件
    ///
    /// 服务任务被取消后由守护进程调用。
    pub fn cleanup(&self) {
        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!(path = %self.socket_path.display(), error = %e, "清理套接字失败");
            }
        }
    }
}

/// 处理单个控制连接：一行命令，一次响应
async fn handle_connection(stream: UnixStream, supervisor: &Arc<Mutex<Supervisor>>) -> Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let mut line = String::new();
    reader.read_line(&mut line).await?;
    debug!(command = %line.trim_end(), "收到控制命令");

    let mut response = {
        let mut supervisor = supervisor.lock().await;
        dispatch::dispatch(&mut supervisor, &line).await
    };

    // 客户端按行读取，缺失的结尾换行在这里补上
    if !response.ends_with('\n') {
        response.push('\n');
    }
    write_half.write_all(response.as_bytes()).await?;
    write_half.shutdown().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::runtime::testing::StubRuntime;
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;

    async fn send_command(socket: &Path, command: &str) -> String {
        let mut stream = UnixStream::connect(socket).await.unwrap();
        stream
            .write_all(format!("{}\n", command).as_bytes())
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn test_serve_round_trip() {
        let dir = TempDir::new().unwrap();
        let modules_dir = dir.path().join("modules");

        let mut supervisor = Supervisor::with_runtime(StubRuntime::new());
        supervisor.initialize(&modules_dir).await.unwrap();
        let supervisor = Arc::new(Mutex::new(supervisor));

        let socket = dir.path().join("helixd.sock");
        let server = IpcServer::new(&socket);
        let task = {
            let supervisor = Arc::clone(&supervisor);
            tokio::spawn(async move { server.serve(supervisor).await })
        };

        // 等待套接字出现
        for _ in 0..50 {
            if socket.exists() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        let response = send_command(&socket, "version").await;
        assert!(response.contains("core="));
        assert!(response.ends_with('\n'));

        let response = send_command(&socket, "list").await;
        assert_eq!(response, "\n");

        let response = send_command(&socket, "enable ghost").await;
        assert!(response.starts_with("ERR enable: "));

        task.abort();
        supervisor.lock().await.shutdown().await;
    }

    #[tokio::test]
    async fn test_stale_socket_replaced() {
        let dir = TempDir::new().unwrap();
        let socket = dir.path().join("helixd.sock");
        // 模拟上次异常退出留下的文件
        std::fs::write(&socket, b"stale").unwrap();

        let mut supervisor = Supervisor::with_runtime(StubRuntime::new());
        supervisor
            .initialize(dir.path().join("modules"))
            .await
            .unwrap();
        let supervisor = Arc::new(Mutex::new(supervisor));

        let server = IpcServer::new(&socket);
        let task = tokio::spawn({
            let supervisor = Arc::clone(&supervisor);
            async move { server.serve(supervisor).await }
        });

        for _ in 0..50 {
            if UnixStream::connect(&socket).await.is_ok() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        let response = send_command(&socket, "status").await;
        assert!(response.contains("Helix Daemon Status"));

        task.abort();
    }
}
