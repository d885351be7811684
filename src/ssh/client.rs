// SSH 客户端核心实现
// 基于 russh 的 Transport 实现

use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use russh::client::{AuthResult, Handle};
use tokio::net::TcpStream;
use tokio::runtime::Runtime;
use tokio::time::timeout;
use tracing::{debug, info};

use super::config::{AuthMethod, SshConfig};
use super::error::{ConnectError, SshError};
use super::event::ConnectionStage;
use super::handler::SshClientHandler;
use super::session::SshSession;
use super::transport::Transport;

/// 基于 russh 的拨号器
///
/// 持有一个 Tokio 运行时，所有 SSH/SFTP 异步操作都在上面阻塞执行。
/// 运行时在第一次拨号时才创建，构造本身不做任何 I/O。
#[derive(Default)]
pub struct SshTransport {
    runtime: OnceCell<Arc<Runtime>>,
}

impl SshTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn runtime(&self) -> Result<Arc<Runtime>, SshError> {
        self.runtime
            .get_or_try_init(|| {
                tokio::runtime::Builder::new_multi_thread()
                    .worker_threads(2)
                    .enable_all()
                    .thread_name("ssh-worker")
                    .build()
                    .map(Arc::new)
            })
            .cloned()
            .map_err(SshError::Io)
    }
}

impl Transport for SshTransport {
    type Conn = SshSession;

    fn dial(&self, config: &SshConfig) -> Result<SshSession, ConnectError> {
        let fail = |stage, source| ConnectError::new(config.address(), stage, source);

        info!(
            "[SSH] Connecting {}@{}:{}",
            config.username, config.host, config.port
        );

        let socket_addr = resolve(config).map_err(|e| fail(ConnectionStage::Resolving, e))?;
        let runtime = self
            .runtime()
            .map_err(|e| fail(ConnectionStage::ConnectingHost, e))?;

        let handle = runtime.block_on(connect(config, socket_addr))?;

        info!("[SSH] [{}] Connection established", config.address());
        Ok(SshSession::new(
            handle,
            runtime,
            format!("{}@{}", config.username, config.address()),
        ))
    }
}

/// 解析地址
fn resolve(config: &SshConfig) -> Result<SocketAddr, SshError> {
    config
        .address()
        .to_socket_addrs()
        .map_err(|e| SshError::Config(format!("Failed to resolve address: {}", e)))?
        .next()
        .ok_or_else(|| SshError::Config("No valid address found".to_string()))
}

/// TCP 连接、SSH 握手与密码认证，每一步都受连接超时约束
async fn connect(
    config: &SshConfig,
    socket_addr: SocketAddr,
) -> Result<Handle<SshClientHandler>, ConnectError> {
    let fail = |stage, source| ConnectError::new(config.address(), stage, source);
    let connect_timeout = config.connect_timeout();

    debug!("[SSH] Connecting to {}...", socket_addr);
    let tcp_stream = timeout(connect_timeout, TcpStream::connect(socket_addr))
        .await
        .map_err(|_| {
            fail(
                ConnectionStage::ConnectingHost,
                SshError::Timeout(config.connect_timeout),
            )
        })?
        .map_err(|e| fail(ConnectionStage::ConnectingHost, SshError::Io(e)))?;

    debug!("[SSH] TCP connection established, starting handshake");
    let handler = SshClientHandler::new(config.address());
    let mut handle = timeout(
        connect_timeout,
        russh::client::connect_stream(Arc::new(config.to_russh_config()), tcp_stream, handler),
    )
    .await
    .map_err(|_| {
        fail(
            ConnectionStage::Handshaking,
            SshError::Timeout(config.connect_timeout),
        )
    })?
    .map_err(|e| fail(ConnectionStage::Handshaking, SshError::from(e)))?;

    debug!("[SSH] Authenticating as '{}'...", config.username);
    timeout(connect_timeout, authenticate(&mut handle, config))
        .await
        .map_err(|_| {
            fail(
                ConnectionStage::Authenticating,
                SshError::Timeout(config.connect_timeout),
            )
        })?
        .map_err(|e| fail(ConnectionStage::Authenticating, e))?;

    Ok(handle)
}

/// 执行认证
async fn authenticate(
    handle: &mut Handle<SshClientHandler>,
    config: &SshConfig,
) -> Result<(), SshError> {
    match &config.auth {
        AuthMethod::Password(password) => {
            let auth_result = handle
                .authenticate_password(&config.username, password)
                .await
                .map_err(SshError::from)?;

            match auth_result {
                AuthResult::Success => Ok(()),
                AuthResult::Failure {
                    remaining_methods,
                    partial_success,
                } => {
                    if partial_success {
                        return Err(SshError::Auth(
                            "Partial authentication - additional auth required".to_string(),
                        ));
                    }
                    Err(SshError::Auth(format!(
                        "Password authentication failed. Server suggests: {:?}",
                        remaining_methods
                    )))
                }
            }
        }
    }
}
