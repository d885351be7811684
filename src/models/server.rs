// 服务器数据结构

use serde::{Deserialize, Serialize};

use super::settings::ConnectionSettings;
use crate::ssh::{AuthMethod, KeepaliveConfig, SshConfig};

/// 服务器数据（持久化用）
#[derive(Clone, Serialize, Deserialize)]
pub struct ServerData {
    #[serde(default)]
    pub label: String,
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub username: String,
    #[serde(default)]
    pub password: String,
}

fn default_port() -> u16 {
    22
}

// 密码不进日志
impl std::fmt::Debug for ServerData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerData")
            .field("label", &self.label)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl ServerData {
    /// 日志中显示的名称
    pub fn display_name(&self) -> String {
        if self.label.is_empty() {
            format!("{}@{}:{}", self.username, self.host, self.port)
        } else {
            self.label.clone()
        }
    }

    /// 从 ServerData 构建 SshConfig
    pub fn to_ssh_config(&self, connection: &ConnectionSettings) -> SshConfig {
        let keepalive = KeepaliveConfig {
            enabled: connection.keepalive_interval_secs > 0,
            interval: connection.keepalive_interval_secs as u64,
            max_retries: connection.keepalive_max_retries,
        };

        SshConfig {
            host: self.host.clone(),
            port: self.port,
            username: self.username.clone(),
            auth: AuthMethod::Password(self.password.clone()),
            connect_timeout: connection.connection_timeout_secs as u64,
            keepalive,
        }
    }
}
