// SSH 连接阶段定义

use std::fmt;

/// 连接阶段
///
/// 连接失败时用于标识出错的步骤。
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConnectionStage {
    /// 解析目标地址
    Resolving = 0,
    /// TCP 连接目标主机
    ConnectingHost = 1,
    /// SSH 握手（密钥交换）
    Handshaking = 2,
    /// 身份认证
    Authenticating = 3,
    /// 启动 SFTP 子系统
    StartingSftp = 4,
}

impl ConnectionStage {
    /// 获取阶段的名称（英文）
    pub fn label_en(&self) -> &'static str {
        match self {
            Self::Resolving => "resolving address",
            Self::ConnectingHost => "connecting to host",
            Self::Handshaking => "SSH handshake",
            Self::Authenticating => "authenticating",
            Self::StartingSftp => "starting sftp channel",
        }
    }

    /// 是否属于传输层拨号阶段（相对于 SFTP 通道建立）
    pub fn is_dial(&self) -> bool {
        *self < Self::StartingSftp
    }
}

impl fmt::Display for ConnectionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label_en())
    }
}
