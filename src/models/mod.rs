// 数据模型模块

pub mod command;
pub mod server;
pub mod settings;
pub mod sftp;

pub use command::{CommandResult, LocalExecError};
pub use server::ServerData;
pub use settings::{ConnectionSettings, ExistingDirPolicy, TransferSettings};
pub use sftp::{EntryKind, RemoteEntry};
