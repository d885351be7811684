// SSH 连接模块
//
// 模块结构:
// - config: 连接配置 (SshConfig, AuthMethod)
// - error: 错误类型 (SshError, ConnectError)
// - event: 连接阶段 (ConnectionStage)
// - handler: russh Handler 实现
// - transport: 传输层能力接口 (Transport, Connection, ExecContext)
// - client: 基于 russh 的拨号器
// - session: SSH 会话 (SshSession, ExecChannel)

pub mod client;
pub mod config;
pub mod error;
pub mod event;
pub mod handler;
pub mod session;
pub mod transport;

// 公开导出
pub use client::SshTransport;
pub use config::{AuthMethod, KeepaliveConfig, SshConfig};
pub use error::{ConnectError, SshError};
pub use event::ConnectionStage;
pub use session::{CommandOutput, ExecChannel, SshSession};
pub use transport::{Connection, ExecContext, Transport};
