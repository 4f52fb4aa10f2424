use assert_cmd::Command as AssertCommand;
use predicates::prelude::*;
use std::io::Write;
use std::process::{Command, Stdio};

const BIN: &str = env!("CARGO_BIN_EXE_iam-user-provisioner");

fn run(args: &[&str]) -> std::process::Output {
    Command::new(BIN)
        .args(args)
        .env_remove("IAM_PROVISIONER_CONFIG")
        .output()
        .expect("failed to run iam-user-provisioner")
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn help_lists_subcommands() {
    let out = run(&["--help"]);
    let s = String::from_utf8_lossy(&out.stdout);
    for command in ["policy", "plan", "apply", "verify", "destroy", "validate"] {
        assert!(s.contains(command), "help should mention {command}: {s}");
    }
}

#[test]
fn test_policy_dev_document() {
    let output = run(&["policy", "dev"]);
    assert_eq!(output.status.code(), Some(0));

    let doc = stdout_json(&output);
    assert_eq!(doc["Version"], "2012-10-17");
    let statements = doc["Statement"].as_array().unwrap();
    assert_eq!(statements.len(), 2);
    assert_eq!(statements[0]["Effect"], "Deny");
    assert_eq!(statements[1]["Effect"], "Allow");
    assert_eq!(
        statements[1]["Condition"]["StringEquals"]["ec2:InstanceType"],
        serde_json::json!(["t2.micro", "t2.small"])
    );
}

#[test]
fn test_policy_qa_compact() {
    AssertCommand::new(BIN)
        .args(["policy", "qa", "--compact"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Effect\":\"Allow\""))
        .stdout(predicate::str::contains("Condition").not())
        .stdout(predicate::function(|s: &str| s.trim_end().lines().count() == 1));
}

#[test]
fn test_plan_dev_user() {
    let output = run(&["plan", "--name", "alice", "--devuser"]);
    assert_eq!(output.status.code(), Some(0));

    let plan = stdout_json(&output);
    assert_eq!(plan["role"], "dev");
    assert_eq!(plan["policyName"], "alice-dev-policy");
    assert_eq!(plan["user"]["path"], "/");
    assert_eq!(plan["policy"]["Statement"][0]["Effect"], "Deny");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("alice"), "stderr was: {}", stderr);
}

#[test]
fn test_plan_dev_wins_over_qa() {
    let output = run(&["plan", "--name", "alice", "--devuser", "--qauser"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout_json(&output)["role"], "dev");
}

#[test]
fn test_plan_without_role_falls_back_to_qa() {
    let output = run(&["plan", "--name", "bob"]);
    assert_eq!(output.status.code(), Some(0));

    let plan = stdout_json(&output);
    assert_eq!(plan["role"], "qa");
    assert_eq!(plan["fellBack"], true);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("QA policy"), "stderr was: {}", stderr);
}

#[test]
fn test_plan_strict_role_refuses_unassigned() {
    let output = run(&["plan", "--name", "bob", "--strict-role"]);
    assert_eq!(output.status.code(), Some(2));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no role selected"), "stderr was: {}", stderr);
}

#[test]
fn test_plan_invalid_name() {
    let output = run(&["plan", "--name", "not a valid name", "--qauser"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid user name"));
}

#[test]
fn test_plan_requires_name() {
    let output = run(&["plan", "--devuser"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("user name is required"));
}

#[test]
fn test_plan_from_config_file_with_flag_override() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "name = \"carol\"\npath = \"/qa/\"\nqauser = true").unwrap();

    let output = run(&[
        "plan",
        "--config",
        file.path().to_str().unwrap(),
        "--name",
        "dave",
    ]);
    assert_eq!(output.status.code(), Some(0));

    let plan = stdout_json(&output);
    assert_eq!(plan["user"]["name"], "dave");
    assert_eq!(plan["user"]["path"], "/qa/");
    assert_eq!(plan["role"], "qa");
}

#[test]
fn test_plan_simulate_produces_access_key() {
    let output = run(&["plan", "--name", "alice", "--devuser", "--simulate"]);
    assert_eq!(output.status.code(), Some(0));

    let user = stdout_json(&output);
    assert_eq!(user["identity"]["name"], "alice");
    assert_eq!(user["attachedPolicyName"], "alice-dev-policy");
    assert!(user["accessKey"]["accessKeyId"]
        .as_str()
        .unwrap()
        .starts_with("AKIA"));
    assert!(user["arn"].as_str().unwrap().ends_with(":user/alice"));
}

#[test]
fn test_apply_refuses_without_tty() {
    let output = run(&["apply", "--name", "alice", "--devuser"]);
    assert_eq!(output.status.code(), Some(2));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("run interactively in a TTY"),
        "stderr was: {}",
        stderr
    );
}

#[test]
fn test_apply_rejects_invalid_input_before_aws() {
    let output = run(&["apply", "--name", "alice", "--path", "no-slashes", "--yes"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid path"));
}

#[test]
fn test_destroy_refuses_without_tty() {
    let output = run(&["destroy", "--name", "alice"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Refusing to destroy"));
}

#[test]
fn test_validate_reports_issues() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"Version": "2012-10-17", "Statement": [{{"Effect": "Allow", "Action": "GetObject", "Resource": "*"}}]}}"#
    )
    .unwrap();

    let output = run(&["validate", file.path().to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("GetObject"), "stderr was: {}", stderr);
}

#[test]
fn test_validate_rejects_non_policy() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "not json").unwrap();
    let output = run(&["validate", file.path().to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Not a policy document"));
}

#[test]
fn test_validate_accepts_aws_rendered_forms() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"Version": "2012-10-17", "Statement": {{"Effect": "Deny", "NotAction": "iam:*", "Resource": "*",
            "Condition": {{"Bool": {{"aws:SecureTransport": false}}, "NumericLessThan": {{"s3:max-keys": 10}}}}}}}}"#
    )
    .unwrap();

    let output = run(&["validate", file.path().to_str().unwrap()]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(0), "stderr was: {}", stderr);
    assert!(stderr.contains("Policy is valid (1 statement(s))"));
}

#[test]
fn test_plan_accepts_path_with_empty_segment() {
    let output = run(&["plan", "--name", "alice", "--devuser", "--path", "/a//b/"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout_json(&output)["user"]["path"], "/a//b/");
}

#[test]
fn test_validate_stdin_round_trip() {
    let policy = run(&["policy", "dev"]).stdout;

    let mut child = Command::new(BIN)
        .args(["validate", "-"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn command");

    {
        let stdin = child.stdin.as_mut().expect("failed to get stdin");
        stdin.write_all(&policy).expect("failed to write to stdin");
    }
    drop(child.stdin.take()); // Close stdin to signal EOF

    let output = child.wait_with_output().expect("failed to wait for child");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(0), "stderr was: {}", stderr);
    assert!(stderr.contains("Policy is valid (2 statement(s))"));
}
