// SFTP 服务 - 封装 russh-sftp 客户端

use std::io::{self, Read, Write};
use std::sync::Arc;

use russh_sftp::client::fs::File;
use russh_sftp::client::SftpSession;
use tokio::runtime::Runtime;
use tokio_util::io::SyncIoBridge;
use tracing::{debug, warn};

use crate::models::sftp::{is_dot_entry, join_path};
use crate::models::{EntryKind, RemoteEntry};
use crate::services::fs::FileSystem;

/// SFTP 服务
/// 封装 russh-sftp 客户端，以同步方式提供文件操作接口
pub struct SftpService {
    /// russh-sftp 客户端会话，Drop 时取出并在运行时内关闭
    sftp: Option<SftpSession>,
    runtime: Arc<Runtime>,
    /// 服务器地址（用于日志）
    host: String,
}

impl SftpService {
    /// 包装已建立的 SFTP 会话
    pub fn new(sftp: SftpSession, runtime: Arc<Runtime>, host: String) -> Self {
        Self {
            sftp: Some(sftp),
            runtime,
            host,
        }
    }

    fn session(&self) -> io::Result<&SftpSession> {
        self.sftp
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "SFTP session closed"))
    }

    /// 获取路径属性，跟随符号链接
    fn metadata_kind(&self, sftp: &SftpSession, path: &str) -> io::Result<EntryKind> {
        let attrs = self
            .runtime
            .block_on(sftp.metadata(path))
            .map_err(to_io_error)?;
        Ok(if attrs.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        })
    }

    fn wrap(&self, file: File, writable: bool) -> RemoteFile {
        RemoteFile {
            inner: Some(SyncIoBridge::new_with_handle(
                file,
                self.runtime.handle().clone(),
            )),
            runtime: self.runtime.clone(),
            writable,
        }
    }
}

impl FileSystem for SftpService {
    type Reader = RemoteFile;
    type Writer = RemoteFile;

    fn name(&self) -> &str {
        &self.host
    }

    fn stat(&self, path: &str) -> io::Result<EntryKind> {
        debug!("[SFTP] Getting stat for: {}", path);
        self.metadata_kind(self.session()?, path)
    }

    /// 读取目录内容
    fn read_dir(&self, path: &str) -> io::Result<Vec<RemoteEntry>> {
        debug!("[SFTP] Reading directory: {}", path);
        let sftp = self.session()?;

        let dir = self
            .runtime
            .block_on(sftp.read_dir(path))
            .map_err(to_io_error)?;

        let mut entries = Vec::new();
        for entry in dir {
            let name = entry.file_name();

            // 跳过 . 和 ..
            if is_dot_entry(&name) {
                continue;
            }

            let attrs = entry.metadata();
            let kind = if attrs.is_dir() {
                EntryKind::Directory
            } else if attrs.is_symlink() {
                // 链接指向的目标决定类型；悬空链接按文件处理，传输时报错
                self.metadata_kind(sftp, &join_path(path, &name))
                    .unwrap_or(EntryKind::File)
            } else {
                EntryKind::File
            };

            entries.push(RemoteEntry::new(name, kind));
        }

        debug!("[SFTP] Read {} entries from {}", entries.len(), path);
        Ok(entries)
    }

    fn open_read(&self, path: &str) -> io::Result<RemoteFile> {
        let file = self
            .runtime
            .block_on(self.session()?.open(path))
            .map_err(to_io_error)?;
        Ok(self.wrap(file, false))
    }

    fn create(&self, path: &str) -> io::Result<RemoteFile> {
        let file = self
            .runtime
            .block_on(self.session()?.create(path))
            .map_err(to_io_error)?;
        Ok(self.wrap(file, true))
    }

    /// 创建目录
    ///
    /// SFTP v3 没有"已存在"状态码，失败后再 stat 一次判断目录是否已存在。
    fn mkdir(&self, path: &str) -> io::Result<()> {
        debug!("[SFTP] Creating directory: {}", path);
        let sftp = self.session()?;

        match self.runtime.block_on(sftp.create_dir(path)) {
            Ok(()) => Ok(()),
            Err(e) => Err(mkdir_error(path, e, self.metadata_kind(sftp, path))),
        }
    }

    /// 写入句柄关闭时才发送 SFTP CLOSE，服务端的拒绝在这里返回
    fn finish(&self, mut writer: RemoteFile) -> io::Result<()> {
        writer.close()
    }

    fn join(&self, base: &str, name: &str) -> String {
        join_path(base, name)
    }
}

impl Drop for SftpService {
    fn drop(&mut self) {
        if let Some(sftp) = self.sftp.take() {
            debug!("[SFTP] [{}] Closing SFTP channel", self.host);
            if let Err(e) = self.runtime.block_on(sftp.close()) {
                warn!("[SFTP] [{}] Failed to close SFTP channel: {}", self.host, e);
            }
            let _guard = self.runtime.enter();
            drop(sftp);
        }
    }
}

/// 远程文件的同步读写句柄
pub struct RemoteFile {
    inner: Option<SyncIoBridge<File>>,
    runtime: Arc<Runtime>,
    writable: bool,
}

impl RemoteFile {
    /// 关闭文件；写入句柄先 shutdown，等待服务端确认 CLOSE
    pub fn close(&mut self) -> io::Result<()> {
        let Some(mut bridge) = self.inner.take() else {
            return Ok(());
        };
        let result = if self.writable {
            bridge.shutdown()
        } else {
            Ok(())
        };
        let _guard = self.runtime.enter();
        drop(bridge);
        result
    }

    fn bridge(&mut self) -> io::Result<&mut SyncIoBridge<File>> {
        self.inner
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "remote file closed"))
    }
}

impl Read for RemoteFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.bridge()?.read(buf)
    }
}

impl Write for RemoteFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bridge()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.bridge()?.flush()
    }
}

impl Drop for RemoteFile {
    fn drop(&mut self) {
        // 出错路径上没有经过 finish 的句柄
        if let Err(e) = self.close() {
            warn!("[SFTP] Failed to close remote file: {}", e);
        }
    }
}

/// mkdir 失败后再 stat 的结果：路径上已经是目录时报告 AlreadyExists
fn mkdir_error(
    path: &str,
    e: russh_sftp::client::error::Error,
    existing: io::Result<EntryKind>,
) -> io::Error {
    match existing {
        Ok(EntryKind::Directory) => io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("directory {} already exists", path),
        ),
        _ => to_io_error(e),
    }
}

/// russh-sftp 错误转换为 io::Error，保留"不存在"和"无权限"的区分
fn to_io_error(e: russh_sftp::client::error::Error) -> io::Error {
    use russh_sftp::client::error::Error;
    use russh_sftp::protocol::StatusCode;

    let kind = match &e {
        Error::Status(status) => match status.status_code {
            StatusCode::NoSuchFile => io::ErrorKind::NotFound,
            StatusCode::PermissionDenied => io::ErrorKind::PermissionDenied,
            _ => io::ErrorKind::Other,
        },
        Error::Timeout => io::ErrorKind::TimedOut,
        _ => io::ErrorKind::Other,
    };
    io::Error::new(kind, e.to_string())
}
