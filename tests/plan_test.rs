// 部署计划执行测试

mod common;

use common::{test_config, MemoryRemote};
use sshdeploy::plan::{run_steps, PlanStep};
use sshdeploy::Client;

fn steps(json: &str) -> Vec<PlanStep> {
    serde_json::from_str(json).unwrap()
}

#[test]
fn test_plan_builds_uploads_and_starts() {
    let workdir = tempfile::tempdir().unwrap();
    let dist = workdir.path().join("dist");
    let dist_str = dist.to_str().unwrap();

    let remote = MemoryRemote::new();
    remote.add_dir("/opt");
    remote.respond("cd /opt/app && ./start.sh", "started\n", Some(0));
    let mut client = Client::with_transport(test_config(), remote.clone());

    let plan = steps(&format!(
        r#"[
            {{"action": "exec", "command": "mkdir -p {dist} && echo v1 > {dist}/VERSION"}},
            {{"action": "append_file", "path": "{dist}/VERSION", "content": "build 7\n"}},
            {{"action": "upload", "local": "{dist}", "remote": "/opt/app"}},
            {{"action": "run", "command": "cd /opt/app && ./start.sh"}}
        ]"#,
        dist = dist_str
    ));

    let report = run_steps(&mut client, &plan).unwrap();
    assert_eq!(report.completed, 4);
    assert!(report.skipped_failures.is_empty());
    assert_eq!(remote.file("/opt/app/VERSION").unwrap(), b"v1\nbuild 7\n");
    assert_eq!(remote.state().commands, vec!["cd /opt/app && ./start.sh"]);
}

#[test]
fn test_plan_continue_on_error() {
    let remote = MemoryRemote::new();
    remote.respond("systemctl stop app", "", Some(5));
    let mut client = Client::with_transport(test_config(), remote.clone());

    let plan = steps(
        r#"[
            {"action": "run", "command": "systemctl stop app", "continue_on_error": true},
            {"action": "run", "command": "echo ok"}
        ]"#,
    );

    let report = run_steps(&mut client, &plan).unwrap();
    assert_eq!(report.completed, 1);
    assert_eq!(report.skipped_failures.len(), 1);
    assert_eq!(report.skipped_failures[0].0, 1);
    assert_eq!(remote.state().commands.len(), 2);
}

#[test]
fn test_plan_stops_at_first_failure() {
    let remote = MemoryRemote::new();
    let mut client = Client::with_transport(test_config(), remote.clone());

    let plan = steps(
        r#"[
            {"action": "upload", "local": "/definitely/not/here", "remote": "/dst"},
            {"action": "run", "command": "echo never"}
        ]"#,
    );

    let err = run_steps(&mut client, &plan).unwrap_err();
    assert!(format!("{:#}", err).contains("step 1"));
    assert!(remote.state().commands.is_empty());
}

#[test]
fn test_plan_local_exec_failure() {
    let remote = MemoryRemote::new();
    let mut client = Client::with_transport(test_config(), remote.clone());

    let plan = steps(r#"[{"action": "exec", "command": "echo boom >&2; exit 1"}]"#);

    let err = run_steps(&mut client, &plan).unwrap_err();
    assert!(format!("{:#}", err).contains("boom"));
    // 纯本地步骤不会建立连接
    assert_eq!(remote.state().dials, 0);
}
