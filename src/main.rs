//! Helix 守护进程 (helixd) 命令行入口
//!
//! 启动模块宿主，在控制套接字上接受单行命令，收到中断或终止信号
//! 后执行优雅关闭（保存期望状态、停止并禁用所有模块）。
//!
//! # 使用示例
//!
//! ```bash
//! # 默认配置启动（模块目录 ./modules，套接字 /tmp/helixd.sock）
//! helixd
//!
//! # 指定模块目录与套接字
//! helixd --modules-dir /var/lib/helix/modules --socket /run/helixd.sock
//!
//! # 交互模式（stdin/stdout 命令循环）
//! helixd --interactive
//! ```
//!
//! 退出码：0 正常关闭；1 初始化失败；2 参数错误。

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Mutex;
use tracing::{error, info};

use helix_core::api::{dispatch, IpcServer};
use helix_core::core::config::DaemonConfig;
use helix_core::module::supervisor::Supervisor;
use helix_core::utils::logger::{Logger, LoggerConfig};

/// Helix 模块宿主守护进程
#[derive(Parser)]
#[command(name = "helixd")]
#[command(version, about = "Helix 模块宿主守护进程", long_about = None)]
struct Cli {
    /// 模块安装目录
    #[arg(long = "modules-dir", value_name = "PATH")]
    modules_dir: Option<PathBuf>,

    /// 控制套接字路径
    #[arg(long, value_name = "PATH")]
    socket: Option<PathBuf>,

    /// 配置文件路径（不存在时使用默认配置）
    #[arg(short = 'c', long, default_value = "helixd.yaml", value_name = "PATH")]
    config: PathBuf,

    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 保持前台运行
    #[arg(long)]
    foreground: bool,

    /// 交互模式：在 stdin/stdout 上运行命令循环
    #[arg(long)]
    interactive: bool,

    /// 模块目录（位置参数，兼容旧用法；--modules-dir 优先）
    #[arg(value_name = "MODULES_DIR")]
    modules_dir_positional: Option<PathBuf>,
}

/// 合并配置文件与命令行参数
async fn load_config(cli: &Cli) -> DaemonConfig {
    let mut config = if cli.config.exists() {
        match DaemonConfig::from_file(&cli.config).await {
            Ok(config) => {
                info!(path = %cli.config.display(), "已加载配置文件");
                config
            }
            Err(e) => {
                error!(path = %cli.config.display(), error = %e, "配置文件无效, 使用默认配置");
                DaemonConfig::default()
            }
        }
    } else {
        DaemonConfig::default()
    };

    // 显式 --modules-dir 优先于位置参数，两者都优先于配置文件
    if let Some(dir) = cli
        .modules_dir
        .clone()
        .or_else(|| cli.modules_dir_positional.clone())
    {
        config.modules.directory = dir;
    }
    if let Some(socket) = cli.socket.clone() {
        config.ipc.socket_path = socket;
    }
    config.logging.level = cli.log_level.clone();

    config
}

/// 服务模式：控制套接字接受循环 + 信号驱动关闭
async fn run_service(supervisor: Supervisor, config: &DaemonConfig) {
    let supervisor = Arc::new(Mutex::new(supervisor));
    let server = Arc::new(IpcServer::new(&config.ipc.socket_path));

    let server_task = {
        let server = Arc::clone(&server);
        let supervisor = Arc::clone(&supervisor);
        tokio::spawn(async move {
            if let Err(e) = server.serve(supervisor).await {
                error!(error = %e, "控制套接字服务失败");
            }
        })
    };

    wait_for_shutdown_signal().await;

    info!("收到关闭信号, 开始优雅关闭");
    server_task.abort();
    server.cleanup();
    supervisor.lock().await.shutdown().await;
}

/// 交互模式：stdin/stdout 命令循环
async fn run_interactive(mut supervisor: Supervisor) {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    println!("Helix daemon ready. Type commands, 'quit' to exit.");
    while let Ok(Some(line)) = lines.next_line().await {
        let command = line.trim();
        if command == "quit" || command == "exit" {
            break;
        }
        if command.is_empty() {
            continue;
        }
        let response = dispatch(&mut supervisor, command).await;
        print!("{}", response);
        if !response.ends_with('\n') {
            println!();
        }
    }

    supervisor.shutdown().await;
}

async fn wait_for_shutdown_signal() {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sig) => sig,
        Err(e) => {
            error!(error = %e, "注册 SIGTERM 处理失败");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = load_config(&cli).await;

    let logger_config = LoggerConfig {
        level: config.logging.level.clone(),
        json_format: config.logging.json_format,
        file_output: if config.logging.file_output {
            config.logging.log_dir.clone()
        } else {
            None
        },
        ..Default::default()
    };
    let _log_guard = match Logger::init(logger_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("日志初始化失败: {}", e);
            return ExitCode::from(1);
        }
    };

    info!(
        version = helix_core::CORE_VERSION,
        foreground = cli.foreground,
        "启动 Helix 守护进程"
    );

    let mut supervisor = Supervisor::new();
    if let Err(e) = supervisor.initialize(&config.modules.directory).await {
        error!(error = %e, "守护进程初始化失败");
        return ExitCode::from(1);
    }

    println!("{}", supervisor.status_report());

    if cli.interactive {
        run_interactive(supervisor).await;
    } else {
        info!(socket = %config.ipc.socket_path.display(), "服务模式启动");
        run_service(supervisor, &config).await;
    }

    info!("Helix 守护进程已退出");
    ExitCode::SUCCESS
}
