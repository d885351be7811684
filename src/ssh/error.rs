// SSH 错误类型定义

use thiserror::Error;

use super::event::ConnectionStage;

/// SSH 错误类型
#[derive(Debug, Error)]
pub enum SshError {
    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO 错误（网络连接等）
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 认证失败
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// SSH 协议错误
    #[error("SSH protocol error: {0}")]
    Protocol(String),

    /// 连接超时
    #[error("Connection timeout after {0}s")]
    Timeout(u64),

    /// 通道错误
    #[error("Channel error: {0}")]
    Channel(String),

    /// SFTP 子系统错误
    #[error("SFTP error: {0}")]
    Sftp(String),

    /// 会话已断开
    #[error("Session disconnected: {0}")]
    Disconnected(String),
}

impl From<russh::Error> for SshError {
    fn from(e: russh::Error) -> Self {
        SshError::Protocol(e.to_string())
    }
}

impl From<russh_sftp::client::error::Error> for SshError {
    fn from(e: russh_sftp::client::error::Error) -> Self {
        SshError::Sftp(e.to_string())
    }
}

/// 建立连接失败，附带失败的阶段
#[derive(Debug, Error)]
#[error("connect {host} failed while {stage}: {source}")]
pub struct ConnectError {
    /// 目标地址
    pub host: String,
    /// 出错阶段
    pub stage: ConnectionStage,
    #[source]
    pub source: SshError,
}

impl ConnectError {
    pub fn new(host: impl Into<String>, stage: ConnectionStage, source: SshError) -> Self {
        Self {
            host: host.into(),
            stage,
            source,
        }
    }

    /// 失败发生在拨号（TCP/握手/认证）阶段
    pub fn is_dial(&self) -> bool {
        self.stage.is_dial()
    }
}
