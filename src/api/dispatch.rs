//! 控制命令分发器
//!
//! 把控制通道收到的单行文本命令翻译成监管器调用，并格式化文本
//! 响应。副作用命令成功回复 `OK`，失败回复 `ERR <原因>`。
//!
//! 命令语法：
//!
//! ```text
//! status | version | list | info <name> | install <path>
//!   | enable <name> | start <name> | stop <name>
//!   | disable <name> | uninstall <name>
//! ```

use std::path::Path;

use crate::module::supervisor::Supervisor;
use crate::{API_VERSION, CORE_VERSION};

/// 处理一行控制命令并返回响应文本
pub async fn dispatch(supervisor: &mut Supervisor, line: &str) -> String {
    let command = line.trim();

    if command == "status" {
        return supervisor.status_report();
    }

    if command == "version" {
        return format!("core={}\napi={}\n", CORE_VERSION, API_VERSION);
    }

    if command == "list" {
        let mut out = String::new();
        for name in supervisor.module_names() {
            if let Some(entry) = supervisor.module(&name) {
                out.push_str(&format!("{} {}\n", entry.name, entry.state));
            }
        }
        if out.is_empty() {
            // 至少回一个换行表示成功
            out.push('\n');
        }
        return out;
    }

    if let Some(name) = command.strip_prefix("info ") {
        return match supervisor.module(name.trim()) {
            Some(entry) => {
                let mut out = String::new();
                out.push_str(&format!("name={}\n", entry.name));
                out.push_str(&format!("version={}\n", entry.version));
                out.push_str(&format!("state={}\n", entry.state));
                out.push_str(&format!(
                    "description={}\n",
                    entry.manifest.description.as_deref().unwrap_or("")
                ));
                out.push_str(&format!(
                    "author={}\n",
                    entry.manifest.author.as_deref().unwrap_or("")
                ));
                out.push_str(&format!(
                    "license={}\n",
                    entry.manifest.license.as_deref().unwrap_or("")
                ));
                out.push_str(&format!("binary_path={}\n", entry.manifest.binary_path));
                if let Some(min) = &entry.manifest.minimum_core_version {
                    out.push_str(&format!("minimum_core_version={}\n", min));
                }
                if let Some(min) = &entry.manifest.minimum_api_version {
                    out.push_str(&format!("minimum_api_version={}\n", min));
                }
                if let Some(err) = &entry.last_error {
                    out.push_str(&format!("last_error={}\n", err));
                }
                out
            }
            None => "ERR not installed".to_string(),
        };
    }

    if let Some(path) = command.strip_prefix("install ") {
        return reply("install", supervisor.install(Path::new(path.trim())).await);
    }
    if let Some(name) = command.strip_prefix("enable ") {
        return reply("enable", supervisor.enable(name.trim()).await);
    }
    if let Some(name) = command.strip_prefix("start ") {
        return reply("start", supervisor.start(name.trim()).await);
    }
    if let Some(name) = command.strip_prefix("stop ") {
        return reply("stop", supervisor.stop(name.trim()).await);
    }
    if let Some(name) = command.strip_prefix("disable ") {
        return reply("disable", supervisor.disable(name.trim()).await);
    }
    if let Some(name) = command.strip_prefix("uninstall ") {
        return reply("uninstall", supervisor.uninstall(name.trim()).await);
    }

    format!("ERR unknown command: {}", command)
}

fn reply(verb: &str, result: crate::utils::Result<()>) -> String {
    match result {
        Ok(()) => "OK".to_string(),
        Err(e) => format!("ERR {}: {}", verb, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::manifest::ModuleManifest;
    use crate::module::runtime::testing::StubRuntime;
    use crate::module::supervisor::{INSTALL_MARKER, MANIFEST_FILE_NAME};
    use tempfile::TempDir;

    async fn supervisor_with_module(dir: &TempDir, name: &str) -> Supervisor {
        let manifest = ModuleManifest::new(name, "1.0.0", format!("lib{}.so", name));
        let module_dir = dir.path().join(name);
        tokio::fs::create_dir_all(&module_dir).await.unwrap();
        tokio::fs::write(
            module_dir.join(MANIFEST_FILE_NAME),
            serde_json::to_string(&manifest).unwrap(),
        )
        .await
        .unwrap();
        tokio::fs::write(module_dir.join(INSTALL_MARKER), "installed_by=helixd\n")
            .await
            .unwrap();

        let mut supervisor = Supervisor::with_runtime(StubRuntime::new());
        supervisor.initialize(dir.path()).await.unwrap();
        supervisor
    }

    #[tokio::test]
    async fn test_version_reply() {
        let dir = TempDir::new().unwrap();
        let mut supervisor = supervisor_with_module(&dir, "demo").await;

        let out = dispatch(&mut supervisor, "version").await;
        assert!(out.contains(&format!("core={}", CORE_VERSION)));
        assert!(out.contains(&format!("api={}", API_VERSION)));
    }

    #[tokio::test]
    async fn test_list_reply() {
        let dir = TempDir::new().unwrap();
        let mut supervisor = supervisor_with_module(&dir, "demo").await;

        let out = dispatch(&mut supervisor, "list").await;
        assert_eq!(out, "demo Installed\n");
    }

    #[tokio::test]
    async fn test_lifecycle_via_commands() {
        let dir = TempDir::new().unwrap();
        let mut supervisor = supervisor_with_module(&dir, "demo").await;

        assert_eq!(dispatch(&mut supervisor, "enable demo").await, "OK");
        assert_eq!(dispatch(&mut supervisor, "start demo").await, "OK");

        let out = dispatch(&mut supervisor, "list").await;
        assert_eq!(out, "demo Running\n");

        assert_eq!(dispatch(&mut supervisor, "stop demo").await, "OK");
        assert_eq!(dispatch(&mut supervisor, "disable demo").await, "OK");
        assert_eq!(dispatch(&mut supervisor, "uninstall demo").await, "OK");
        assert_eq!(dispatch(&mut supervisor, "list").await, "\n");
    }

    #[tokio::test]
    async fn test_info_reply() {
        let dir = TempDir::new().unwrap();
        let mut supervisor = supervisor_with_module(&dir, "demo").await;

        let out = dispatch(&mut supervisor, "info demo").await;
        assert!(out.contains("name=demo\n"));
        assert!(out.contains("version=1.0.0\n"));
        assert!(out.contains("state=Installed\n"));
        assert!(out.contains("binary_path=libdemo.so\n"));

        let out = dispatch(&mut supervisor, "info ghost").await;
        assert_eq!(out, "ERR not installed");
    }

    #[tokio::test]
    async fn test_error_replies_carry_reason() {
        let dir = TempDir::new().unwrap();
        let mut supervisor = supervisor_with_module(&dir, "demo").await;

        let out = dispatch(&mut supervisor, "enable ghost").await;
        assert!(out.starts_with("ERR enable: "));
        assert!(out.contains("ghost"));

        let out = dispatch(&mut supervisor, "stop demo").await;
        assert!(out.starts_with("ERR stop: "));
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let dir = TempDir::new().unwrap();
        let mut supervisor = supervisor_with_module(&dir, "demo").await;

        let out = dispatch(&mut supervisor, "reboot now").await;
        assert!(out.starts_with("ERR unknown command"));

        // 缺少参数的动词不匹配任何命令
        let out = dispatch(&mut supervisor, "enable").await;
        assert!(out.starts_with("ERR unknown command"));
    }

    #[tokio::test]
    async fn test_whitespace_tolerated() {
        let dir = TempDir::new().unwrap();
        let mut supervisor = supervisor_with_module(&dir, "demo").await;

        assert_eq!(dispatch(&mut supervisor, "  enable demo \r\n").await, "OK");
    }

    #[tokio::test]
    async fn test_status_reply() {
        let dir = TempDir::new().unwrap();
        let mut supervisor = supervisor_with_module(&dir, "demo").await;

        let out = dispatch(&mut supervisor, "status").await;
        assert!(out.contains("Helix Daemon Status"));
        assert!(out.contains("Total Modules: 1"));
    }
}
