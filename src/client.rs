// 远程操作客户端
//
// 连接状态只有两种：Disconnected 与 Connected { files, session }。
// 所有公开操作都通过 ensure_connected 进入，首次使用时懒连接，之后复用同一会话；
// 会话掉线后当次操作报错，下一次操作重新连接。

use tracing::{debug, info, warn};

use crate::error::{RunError, SyncError};
use crate::services::fs::LocalFs;
use crate::services::sync::{self, SyncOptions, SyncSummary};
use crate::ssh::{
    Connection, ConnectError, ConnectionStage, ExecContext, SshConfig, SshError, SshTransport,
    Transport,
};

type FilesOf<T> = <<T as Transport>::Conn as Connection>::Files;

/// 连接状态
enum ConnectionState<C: Connection> {
    Disconnected,
    /// 字段顺序即析构顺序：文件通道先于会话释放
    Connected { files: C::Files, session: C },
}

/// 远程操作客户端
///
/// 一个实例最多持有一个会话。操作都需要 `&mut self`，同一实例不能并发使用，
/// 并发任务请各自创建客户端。
pub struct Client<T: Transport = SshTransport> {
    config: SshConfig,
    sync_options: SyncOptions,
    transport: T,
    state: ConnectionState<T::Conn>,
}

impl Client<SshTransport> {
    /// 使用密码认证创建客户端，不做任何 I/O
    pub fn new(
        user: impl Into<String>,
        password: impl Into<String>,
        host: impl Into<String>,
        port: u16,
    ) -> Self {
        Self::with_config(SshConfig::password(user, password, host, port))
    }

    pub fn with_config(config: SshConfig) -> Self {
        Self::with_transport(config, SshTransport::new())
    }
}

impl<T: Transport> Client<T> {
    /// 使用自定义传输层创建客户端
    pub fn with_transport(config: SshConfig, transport: T) -> Self {
        Self {
            config,
            sync_options: SyncOptions::default(),
            transport,
            state: ConnectionState::Disconnected,
        }
    }

    pub fn sync_options(mut self, options: SyncOptions) -> Self {
        self.sync_options = options;
        self
    }

    pub fn config(&self) -> &SshConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn is_connected(&self) -> bool {
        match &self.state {
            ConnectionState::Connected { session, .. } => !session.is_closed(),
            ConnectionState::Disconnected => false,
        }
    }

    /// 建立连接并打开文件通道
    ///
    /// 已连接且会话存活时什么也不做。任一步骤失败时客户端保持未连接状态。
    pub fn connect(&mut self) -> Result<(), ConnectError> {
        self.release_lost_session();
        if self.is_connected() {
            debug!("[SSH] [{}] Already connected", self.config.address());
            return Ok(());
        }

        let mut session = self.transport.dial(&self.config)?;
        let files = match session.open_file_channel() {
            Ok(files) => files,
            Err(e) => {
                // 拨号已成功，文件通道失败时关闭刚建立的会话
                if let Err(close_err) = session.close() {
                    debug!("[SSH] Close after sftp failure: {}", close_err);
                }
                return Err(ConnectError::new(
                    self.config.address(),
                    ConnectionStage::StartingSftp,
                    e,
                ));
            }
        };

        self.state = ConnectionState::Connected { files, session };
        Ok(())
    }

    /// 会话已掉线时释放它，回到未连接状态
    fn release_lost_session(&mut self) {
        let lost =
            matches!(self.state, ConnectionState::Connected { .. }) && !self.is_connected();
        if lost {
            warn!(
                "[SSH] [{}] Session lost, reconnecting",
                self.config.address()
            );
            self.disconnect();
        }
    }

    /// 断开连接；之后的操作会重新懒连接
    pub fn disconnect(&mut self) {
        if let ConnectionState::Connected { files, mut session } =
            std::mem::replace(&mut self.state, ConnectionState::Disconnected)
        {
            drop(files);
            if let Err(e) = session.close() {
                warn!(
                    "[SSH] [{}] Failed to close session: {}",
                    self.config.address(),
                    e
                );
            }
            info!("[SSH] [{}] Disconnected", self.config.address());
        }
    }

    /// 断开后重新连接
    pub fn reconnect(&mut self) -> Result<(), ConnectError> {
        self.disconnect();
        self.connect()
    }

    /// 所有操作的唯一入口：未连接或会话已断开时先（重新）连接
    fn ensure_connected(&mut self) -> Result<(&T::Conn, &FilesOf<T>), ConnectError> {
        self.connect()?;
        match &self.state {
            ConnectionState::Connected { files, session } => Ok((session, files)),
            ConnectionState::Disconnected => Err(ConnectError::new(
                self.config.address(),
                ConnectionStage::ConnectingHost,
                SshError::Disconnected("client is not connected".to_string()),
            )),
        }
    }

    /// 在远程执行命令，返回 stdout 与 stderr 的合并输出
    ///
    /// 退出码非零时返回 `RunError::ExitStatus`，其中仍带有已捕获的输出。
    pub fn run(&mut self, command: &str) -> Result<String, RunError> {
        let (session, _) = self.ensure_connected()?;

        let mut exec = session.open_exec().map_err(RunError::Exec)?;
        let result = exec.combined_output(command);
        if let Err(e) = exec.close() {
            debug!("[SSH] Exec channel close: {}", e);
        }
        let output = result.map_err(RunError::Exec)?;

        if output.is_success() {
            Ok(output.output_string())
        } else {
            Err(RunError::ExitStatus {
                command: command.to_string(),
                code: output.exit_status,
                output: output.output_string(),
            })
        }
    }

    /// 上传本地文件或目录到远程路径
    pub fn upload(
        &mut self,
        local_path: &str,
        remote_path: &str,
    ) -> Result<SyncSummary, SyncError> {
        let options = self.sync_options;
        let (_, files) = self.ensure_connected()?;

        info!("[SFTP] Upload {} -> {}", local_path, remote_path);
        let summary = sync::mirror(&LocalFs, local_path, files, remote_path, &options)?;
        info!(
            "[SFTP] Upload finished: {} files, {} dirs, {} bytes",
            summary.files, summary.dirs, summary.bytes
        );
        Ok(summary)
    }

    /// 下载远程文件或目录到本地路径
    pub fn download(
        &mut self,
        remote_path: &str,
        local_path: &str,
    ) -> Result<SyncSummary, SyncError> {
        let options = self.sync_options;
        let (_, files) = self.ensure_connected()?;

        info!("[SFTP] Download {} -> {}", remote_path, local_path);
        let summary = sync::mirror(files, remote_path, &LocalFs, local_path, &options)?;
        info!(
            "[SFTP] Download finished: {} files, {} dirs, {} bytes",
            summary.files, summary.dirs, summary.bytes
        );
        Ok(summary)
    }
}

impl<T: Transport> Drop for Client<T> {
    fn drop(&mut self) {
        self.disconnect();
    }
}
