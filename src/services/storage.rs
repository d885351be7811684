// 本地配置读取服务

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::plan::DeployPlan;

/// 获取配置目录路径
/// macOS: ~/Library/Application Support/sshdeploy
/// Linux: ~/.config/sshdeploy
/// Windows: C:\Users\<用户名>\AppData\Roaming\sshdeploy
pub fn get_config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .context("无法获取系统配置目录")?
        .join("sshdeploy"))
}

/// 获取默认部署计划文件路径
pub fn get_plan_file() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("plan.json"))
}

/// 加载部署计划
pub fn load_plan(path: impl AsRef<Path>) -> Result<DeployPlan> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("无法读取部署计划文件: {}", path.display()))?;
    let plan: DeployPlan = serde_json::from_str(&content)
        .with_context(|| format!("无法解析部署计划文件: {}", path.display()))?;
    Ok(plan)
}
