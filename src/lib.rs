// sshdeploy - SSH/SFTP 远程部署客户端
//
// 模块结构:
// - ssh: SSH 连接与传输层接口
// - services: 本地命令执行、文件系统抽象、SFTP 服务、目录同步
// - client: 懒连接的远程操作客户端（run / upload / download）
// - plan: 部署计划

pub mod client;
pub mod error;
pub mod models;
pub mod plan;
pub mod services;
pub mod ssh;

pub use client::Client;
pub use error::{RunError, SyncError, TransferStage};
pub use models::{CommandResult, EntryKind, ExistingDirPolicy, LocalExecError, RemoteEntry};
pub use services::executor::execute;
pub use services::fs::{FileSystem, LocalFs};
pub use services::sync::{SyncOptions, SyncSummary};
pub use ssh::{ConnectError, SshConfig, SshError};
