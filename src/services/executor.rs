// 本地命令执行

use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::models::{CommandResult, LocalExecError};

/// 在指定工作目录中通过 `sh -c` 执行命令
///
/// 不会 panic，也不返回 `Err`：启动失败和非零退出都放在 `CommandResult::error` 中，
/// stdout/stderr 保留进程已经产生的输出。
pub fn execute(dir: impl AsRef<Path>, command: &str) -> CommandResult {
    let dir = dir.as_ref();
    debug!("[Exec] {:?}: {}", dir, command);

    let output = match Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(dir)
        .output()
    {
        Ok(output) => output,
        Err(e) => {
            debug!("[Exec] Failed to start: {}", e);
            return CommandResult {
                stdout: Vec::new(),
                stderr: Vec::new(),
                error: Some(LocalExecError::Spawn(e)),
            };
        }
    };

    let error = if output.status.success() {
        None
    } else {
        debug!("[Exec] Command exited with {}", output.status);
        Some(LocalExecError::ExitStatus(output.status))
    };

    CommandResult {
        stdout: output.stdout,
        stderr: output.stderr,
        error,
    }
}
