// SFTP 后端服务

mod service;

pub use service::{RemoteFile, SftpService};
