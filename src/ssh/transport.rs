// 传输层能力接口
//
// Client 只通过这些 trait 使用底层连接：
// - Transport: 拨号并认证，得到 Connection
// - Connection: 从一个已认证连接派生执行通道和文件通道
// - ExecContext: 执行单条命令

use super::config::SshConfig;
use super::error::{ConnectError, SshError};
use super::session::CommandOutput;
use crate::services::fs::FileSystem;

/// 拨号器
pub trait Transport {
    type Conn: Connection;

    /// 建立一个已认证的连接
    fn dial(&self, config: &SshConfig) -> Result<Self::Conn, ConnectError>;
}

/// 一个已认证的连接
pub trait Connection {
    type Exec: ExecContext;
    type Files: FileSystem;

    /// 打开一个新的命令执行通道
    fn open_exec(&self) -> Result<Self::Exec, SshError>;

    /// 打开文件传输通道
    fn open_file_channel(&self) -> Result<Self::Files, SshError>;

    /// 关闭连接
    fn close(&mut self) -> Result<(), SshError>;

    /// 连接是否已经断开（主动关闭或传输层掉线）
    fn is_closed(&self) -> bool;
}

/// 命令执行通道，每条命令使用一个
pub trait ExecContext {
    /// 执行命令，stdout 与 stderr 合并到同一个缓冲区
    ///
    /// 只有执行请求本身失败时才返回 `Err`；命令的退出码放在输出里。
    fn combined_output(&mut self, command: &str) -> Result<CommandOutput, SshError>;

    /// 关闭通道
    fn close(&mut self) -> Result<(), SshError>;
}
