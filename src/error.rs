// Client 操作错误类型

use std::fmt;
use std::io;

use thiserror::Error;

use crate::ssh::{ConnectError, SshError};

/// 远程命令执行错误
#[derive(Debug, Error)]
pub enum RunError {
    /// 懒连接失败
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// 无法创建执行通道或发送执行请求
    #[error("create new session error: {0}")]
    Exec(#[source] SshError),

    /// 命令以非零状态结束，或通道结束时没有退出码；输出仍然保留
    #[error("remote command failed ({}): {command}", exit_label(.code))]
    ExitStatus {
        command: String,
        code: Option<u32>,
        output: String,
    },
}

fn exit_label(code: &Option<u32>) -> String {
    match code {
        Some(code) => format!("exit status {}", code),
        None => "no exit status".to_string(),
    }
}

impl RunError {
    /// 失败前已捕获的命令输出
    pub fn output(&self) -> Option<&str> {
        match self {
            RunError::ExitStatus { output, .. } => Some(output.as_str()),
            _ => None,
        }
    }
}

/// 单个文件传输失败的步骤
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStage {
    /// 打开源文件
    OpenSource,
    /// 创建目标文件
    CreateDestination,
    /// 复制内容
    Copy,
}

impl fmt::Display for TransferStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransferStage::OpenSource => "open source file",
            TransferStage::CreateDestination => "create destination file",
            TransferStage::Copy => "copy file",
        })
    }
}

/// 目录同步错误
///
/// 任意一个错误都会中止整个同步，已经完成的文件不会回滚。
#[derive(Debug, Error)]
pub enum SyncError {
    /// 懒连接失败
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// 源路径不存在或无法访问
    #[error("cannot stat {side} path {path}: {source}")]
    Stat {
        side: String,
        path: String,
        #[source]
        source: io::Error,
    },

    /// 无法列出源目录
    #[error("cannot read {side} directory {path}: {source}")]
    ReadDir {
        side: String,
        path: String,
        #[source]
        source: io::Error,
    },

    /// 单个文件传输失败
    #[error("failed to {stage} ({from} -> {to}): {source}")]
    Transfer {
        from: String,
        to: String,
        stage: TransferStage,
        #[source]
        source: io::Error,
    },

    /// 无法创建目标目录
    #[error("cannot create {side} directory {path}: {source}")]
    Mkdir {
        side: String,
        path: String,
        #[source]
        source: io::Error,
    },
}

impl SyncError {
    /// 出错的路径（连接错误没有路径）
    pub fn path(&self) -> Option<&str> {
        match self {
            SyncError::Connect(_) => None,
            SyncError::Stat { path, .. }
            | SyncError::ReadDir { path, .. }
            | SyncError::Mkdir { path, .. } => Some(path.as_str()),
            SyncError::Transfer {
                from, to, stage, ..
            } => match stage {
                TransferStage::CreateDestination => Some(to.as_str()),
                TransferStage::OpenSource | TransferStage::Copy => Some(from.as_str()),
            },
        }
    }
}
