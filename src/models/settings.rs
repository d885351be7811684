// Settings 配置数据结构

use serde::{Deserialize, Serialize};

// ======================== 连接设置 ========================

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConnectionSettings {
    pub connection_timeout_secs: u32,
    /// 0 表示关闭心跳
    pub keepalive_interval_secs: u32,
    pub keepalive_max_retries: u32,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            connection_timeout_secs: 30,
            keepalive_interval_secs: 60,
            keepalive_max_retries: 3,
        }
    }
}

// ======================== 传输设置 ========================

/// 创建目标目录时遇到"已存在"的处理方式
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExistingDirPolicy {
    /// 已存在的目录视为创建成功
    #[default]
    Tolerate,
    /// 已存在也作为错误返回
    Fail,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct TransferSettings {
    pub existing_dirs: ExistingDirPolicy,
}
