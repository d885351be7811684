// 本地命令执行结果

use std::process::ExitStatus;

use thiserror::Error;

/// 本地命令执行失败的原因
#[derive(Debug, Error)]
pub enum LocalExecError {
    /// 进程无法启动
    #[error("failed to start command: {0}")]
    Spawn(#[from] std::io::Error),

    /// 进程以非零状态退出（或被信号终止）
    #[error("command exited with {0}")]
    ExitStatus(ExitStatus),
}

/// 本地命令执行结果
///
/// 所有失败都记录在 `error` 中，stdout/stderr 保留失败前已产生的输出。
#[derive(Debug)]
pub struct CommandResult {
    /// 标准输出
    pub stdout: Vec<u8>,
    /// 标准错误
    pub stderr: Vec<u8>,
    /// 执行错误
    pub error: Option<LocalExecError>,
}

impl CommandResult {
    /// 获取标准输出字符串
    pub fn stdout_string(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    /// 获取标准错误字符串
    pub fn stderr_string(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }

    /// 检查命令是否成功
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// 退出码（无法启动或被信号终止时为 None）
    pub fn exit_code(&self) -> Option<i32> {
        match &self.error {
            None => Some(0),
            Some(LocalExecError::ExitStatus(status)) => status.code(),
            Some(LocalExecError::Spawn(_)) => None,
        }
    }

    /// 转换为 Result，丢弃 stderr
    pub fn into_result(self) -> Result<Vec<u8>, LocalExecError> {
        match self.error {
            None => Ok(self.stdout),
            Some(e) => Err(e),
        }
    }
}
