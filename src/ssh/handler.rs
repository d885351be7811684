// SSH 客户端 Handler 实现
// 实现 russh::client::Handler trait

use russh::keys::PublicKey;
use std::future::Future;
use tracing::debug;

/// SSH 客户端 Handler
///
/// 不校验主机身份：任何服务器公钥都会被接受，只记录指纹。
/// 面向可信内网的部署场景，这是有意接受的风险。
pub struct SshClientHandler {
    /// 服务器地址（用于日志）
    host: String,
}

impl SshClientHandler {
    /// 创建新的 Handler
    pub fn new(host: String) -> Self {
        Self { host }
    }
}

impl russh::client::Handler for SshClientHandler {
    type Error = russh::Error;

    /// 检查服务器公钥（始终接受）
    fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send {
        let fingerprint = server_public_key.fingerprint(russh::keys::ssh_key::HashAlg::Sha256);

        debug!(
            "[SSH] [{}] Accepting server key {} ({}) without verification",
            self.host,
            fingerprint,
            server_public_key.algorithm()
        );

        async { Ok(true) }
    }
}
