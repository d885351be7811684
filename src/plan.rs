// 部署计划
//
// 一个 JSON 文件描述目标服务器和按顺序执行的步骤，
// 整个计划共用一个 Client（首次需要远程连接时才连接）。

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::client::Client;
use crate::error::RunError;
use crate::models::{ConnectionSettings, ServerData, TransferSettings};
use crate::services::sync::SyncOptions;
use crate::services::{executor, files};
use crate::ssh::Transport;

/// 部署计划
#[derive(Debug, Clone, Deserialize)]
pub struct DeployPlan {
    pub server: ServerData,
    #[serde(default)]
    pub connection: ConnectionSettings,
    #[serde(default)]
    pub transfer: TransferSettings,
    pub steps: Vec<PlanStep>,
}

/// 计划中的一步
#[derive(Debug, Clone, Deserialize)]
pub struct PlanStep {
    #[serde(flatten)]
    pub step: Step,
    /// 本步失败时是否继续后续步骤
    #[serde(default)]
    pub continue_on_error: bool,
}

/// 步骤动作
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Upload {
        local: String,
        remote: String,
    },
    Download {
        remote: String,
        local: String,
    },
    /// 远程命令
    Run {
        command: String,
    },
    /// 本地命令
    Exec {
        #[serde(default = "current_dir")]
        dir: String,
        command: String,
    },
    WriteFile {
        path: String,
        content: String,
    },
    AppendFile {
        path: String,
        content: String,
    },
    Remove {
        path: String,
    },
}

fn current_dir() -> String {
    ".".to_string()
}

impl Step {
    /// 日志用的简短描述
    pub fn describe(&self) -> String {
        match self {
            Step::Upload { local, remote } => format!("upload {} -> {}", local, remote),
            Step::Download { remote, local } => format!("download {} -> {}", remote, local),
            Step::Run { command } => format!("run `{}`", command),
            Step::Exec { dir, command } => format!("exec `{}` in {}", command, dir),
            Step::WriteFile { path, .. } => format!("write {}", path),
            Step::AppendFile { path, .. } => format!("append {}", path),
            Step::Remove { path } => format!("remove {}", path),
        }
    }
}

/// 计划执行结果
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PlanReport {
    /// 成功的步骤数
    pub completed: usize,
    /// 失败但允许继续的步骤（序号从 1 开始，错误信息）
    pub skipped_failures: Vec<(usize, String)>,
}

impl DeployPlan {
    /// 使用默认 SSH 传输层执行计划
    pub fn run(&self) -> Result<PlanReport> {
        let config = self.server.to_ssh_config(&self.connection);
        let mut client =
            Client::with_config(config).sync_options(SyncOptions::from(&self.transfer));

        info!(
            "[Plan] Deploying to {} ({} steps)",
            self.server.display_name(),
            self.steps.len()
        );
        let report = run_steps(&mut client, &self.steps);
        client.disconnect();
        report
    }
}

/// 按顺序执行步骤，遇到不允许继续的失败时中止
pub fn run_steps<T: Transport>(client: &mut Client<T>, steps: &[PlanStep]) -> Result<PlanReport> {
    let mut report = PlanReport::default();

    for (index, plan_step) in steps.iter().enumerate() {
        let number = index + 1;
        let description = plan_step.step.describe();
        info!("[Plan] Step {}/{}: {}", number, steps.len(), description);

        match execute_step(client, &plan_step.step) {
            Ok(()) => report.completed += 1,
            Err(e) if plan_step.continue_on_error => {
                warn!("[Plan] Step {} failed, continuing: {:#}", number, e);
                report.skipped_failures.push((number, format!("{:#}", e)));
            }
            Err(e) => {
                error!("[Plan] Step {} failed: {:#}", number, e);
                return Err(e.context(format!("step {} ({}) failed", number, description)));
            }
        }
    }

    info!(
        "[Plan] Finished: {} completed, {} failed",
        report.completed,
        report.skipped_failures.len()
    );
    Ok(report)
}

fn execute_step<T: Transport>(client: &mut Client<T>, step: &Step) -> Result<()> {
    match step {
        Step::Upload { local, remote } => {
            client.upload(local, remote)?;
        }
        Step::Download { remote, local } => {
            client.download(remote, local)?;
        }
        Step::Run { command } => match client.run(command) {
            Ok(output) => log_output("remote", &output),
            Err(e) => {
                if let RunError::ExitStatus { output, .. } = &e {
                    log_output("remote", output);
                }
                return Err(e.into());
            }
        },
        Step::Exec { dir, command } => {
            let result = executor::execute(dir, command);
            log_output("local", &result.stdout_string());
            if let Some(ref e) = result.error {
                let stderr = result.stderr_string();
                bail!("local command `{}` failed: {} {}", command, e, stderr.trim_end());
            }
        }
        Step::WriteFile { path, content } => {
            files::write_file(path, content).with_context(|| format!("无法写入文件: {}", path))?;
        }
        Step::AppendFile { path, content } => {
            files::append_to_file(path, content)
                .with_context(|| format!("无法追加文件: {}", path))?;
        }
        Step::Remove { path } => {
            files::remove_path(path).with_context(|| format!("无法删除: {}", path))?;
        }
    }
    Ok(())
}

fn log_output(side: &str, output: &str) {
    for line in output.lines() {
        info!("[Plan] [{}] {}", side, line);
    }
}
