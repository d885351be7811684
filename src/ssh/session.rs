// SSH 会话管理
// 连接成功后的会话对象，派生执行通道与 SFTP 通道

use std::sync::Arc;

use russh::client::{Handle, Msg};
use russh::ChannelMsg;
use russh_sftp::client::SftpSession;
use tokio::runtime::Runtime;
use tracing::{debug, info, warn};

use super::error::SshError;
use super::handler::SshClientHandler;
use super::transport::{Connection, ExecContext};
use crate::services::sftp::SftpService;

// 使用 russh::client::Msg 作为消息类型
type RusshChannel = russh::Channel<Msg>;

/// SSH 会话（连接成功后）
pub struct SshSession {
    /// russh Handle
    handle: Handle<SshClientHandler>,
    /// 所有异步操作都阻塞在这个运行时上
    runtime: Arc<Runtime>,
    /// user@host:port，用于日志
    host: String,
    /// 是否已关闭
    closed: bool,
}

impl SshSession {
    /// 创建新的会话
    pub fn new(
        handle: Handle<SshClientHandler>,
        runtime: Arc<Runtime>,
        host: String,
    ) -> Self {
        Self {
            handle,
            runtime,
            host,
            closed: false,
        }
    }

    fn ensure_open(&self) -> Result<(), SshError> {
        if self.is_closed() {
            return Err(SshError::Disconnected(format!(
                "Session to {} is closed",
                self.host
            )));
        }
        Ok(())
    }
}

impl Connection for SshSession {
    type Exec = ExecChannel;
    type Files = SftpService;

    /// 打开执行通道
    fn open_exec(&self) -> Result<ExecChannel, SshError> {
        self.ensure_open()?;

        let channel = self
            .runtime
            .block_on(self.handle.channel_open_session())
            .map_err(SshError::from)?;

        Ok(ExecChannel::new(channel, self.runtime.clone()))
    }

    /// 打开 SFTP 通道
    fn open_file_channel(&self) -> Result<SftpService, SshError> {
        self.ensure_open()?;

        let sftp = self.runtime.block_on(async {
            let channel = self.handle.channel_open_session().await?;

            // 请求 SFTP 子系统
            channel.request_subsystem(true, "sftp").await?;

            // 使用 russh-sftp 包装通道
            SftpSession::new(channel.into_stream())
                .await
                .map_err(SshError::from)
        })?;

        info!("[SFTP] [{}] SFTP channel opened", self.host);
        Ok(SftpService::new(sftp, self.runtime.clone(), self.host.clone()))
    }

    /// 关闭会话
    fn close(&mut self) -> Result<(), SshError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        // 传输层已断开，无需再发送断开消息
        if self.handle.is_closed() {
            debug!("[SSH] [{}] Session already closed by peer", self.host);
            return Ok(());
        }

        debug!("[SSH] [{}] Disconnecting", self.host);
        self.runtime
            .block_on(
                self.handle
                    .disconnect(russh::Disconnect::ByApplication, "", "English"),
            )
            .map_err(SshError::from)
    }

    /// 会话任务结束（对端断开、keepalive 超时）后 handle 即处于关闭状态
    fn is_closed(&self) -> bool {
        self.closed || self.handle.is_closed()
    }
}

impl Drop for SshSession {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("[SSH] [{}] Failed to close session: {}", self.host, e);
        }
    }
}

/// 执行通道（每条命令一个）
pub struct ExecChannel {
    /// 关闭后置为 None
    channel: Option<RusshChannel>,
    runtime: Arc<Runtime>,
}

impl ExecChannel {
    fn new(channel: RusshChannel, runtime: Arc<Runtime>) -> Self {
        Self {
            channel: Some(channel),
            runtime,
        }
    }
}

impl ExecContext for ExecChannel {
    /// 执行命令并获取合并输出
    fn combined_output(&mut self, command: &str) -> Result<CommandOutput, SshError> {
        let channel = self
            .channel
            .as_mut()
            .ok_or_else(|| SshError::Channel("Exec channel already closed".to_string()))?;

        self.runtime.block_on(async {
            channel
                .exec(true, command)
                .await
                .map_err(|e| SshError::Channel(e.to_string()))?;

            let mut output = Vec::new();
            let mut exit_status = None;

            // 退出码可能在 Eof 之后才到，读到通道结束为止
            while let Some(channel_msg) = channel.wait().await {
                match channel_msg {
                    ChannelMsg::Data { data } => output.extend_from_slice(&data),
                    ChannelMsg::ExtendedData { data, .. } => output.extend_from_slice(&data),
                    ChannelMsg::ExitStatus { exit_status: code } => exit_status = Some(code),
                    _ => {}
                }
            }

            Ok(CommandOutput {
                output,
                exit_status,
            })
        })
    }

    /// 关闭通道
    fn close(&mut self) -> Result<(), SshError> {
        match self.channel.take() {
            Some(channel) => self
                .runtime
                .block_on(channel.close())
                .map_err(|e| SshError::Channel(e.to_string())),
            None => Ok(()),
        }
    }
}

impl Drop for ExecChannel {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            // 服务端先关闭通道时这里会失败，属于正常情况
            debug!("[SSH] Exec channel close: {}", e);
        }
    }
}

/// 远程命令输出
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// stdout 与 stderr 按到达顺序合并
    pub output: Vec<u8>,
    /// 退出码；通道在没有退出码的情况下结束时为 None
    pub exit_status: Option<u32>,
}

impl CommandOutput {
    /// 获取输出字符串
    pub fn output_string(&self) -> String {
        String::from_utf8_lossy(&self.output).to_string()
    }

    /// 检查命令是否成功
    pub fn is_success(&self) -> bool {
        self.exit_status == Some(0)
    }
}
