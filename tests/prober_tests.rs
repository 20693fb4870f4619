//! Integration tests for the command prober.
//!
//! Each test drives real child processes through small generated shell
//! scripts, so the suite is Unix-only. Strategy lists are constructed
//! directly so no test depends on a Gemini CLI (or npx) being installed.
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use hello_mcp_server::config::ServerConfig;
use hello_mcp_server::handlers;
use hello_mcp_server::prober::{candidates, ExecutionStrategy, ProbeResult, Prober};
use hello_mcp_server::protocol::{JsonRpcRequest, RpcId};

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

fn direct(program: &Path) -> ExecutionStrategy {
    ExecutionStrategy::new("direct", program.to_str().unwrap(), Vec::new())
}

fn probe_config(program: &Path) -> ServerConfig {
    ServerConfig {
        gemini_program: program.to_str().unwrap().to_string(),
        health_model: "gemini-2.5-flash".to_string(),
        health_prompt: "say hi".to_string(),
        probe_timeout: Duration::from_secs(10),
    }
}

// ---------------------------------------------------------------------------
// Single-strategy behavior
// ---------------------------------------------------------------------------

#[tokio::test]
async fn captures_stdout_verbatim() {
    let tmp = tempfile::tempdir().unwrap();
    let script = write_script(tmp.path(), "ok.sh", "printf 'hi'");

    let prober = Prober::new(vec![direct(&script)], Duration::from_secs(10));

    match prober.probe().await {
        ProbeResult::Success { stdout, stderr } => {
            assert_eq!(stdout, "hi");
            assert!(stderr.is_empty());
        }
        ProbeResult::Failure { error } => panic!("unexpected failure: {error}"),
    }
}

#[tokio::test]
async fn nonempty_stderr_with_exit_success_is_a_warning() {
    let tmp = tempfile::tempdir().unwrap();
    let script = write_script(
        tmp.path(),
        "noisy.sh",
        "printf 'hi'\nprintf 'deprecation notice' >&2",
    );

    let prober = Prober::new(vec![direct(&script)], Duration::from_secs(10));

    match prober.probe().await {
        ProbeResult::Success { stdout, stderr } => {
            assert_eq!(stdout, "hi");
            assert_eq!(stderr, "deprecation notice");
        }
        ProbeResult::Failure { error } => panic!("unexpected failure: {error}"),
    }
}

#[tokio::test]
async fn nonzero_exit_is_a_fault() {
    let tmp = tempfile::tempdir().unwrap();
    let script = write_script(tmp.path(), "bad.sh", "printf 'boom' >&2\nexit 3");

    let prober = Prober::new(vec![direct(&script)], Duration::from_secs(10));

    match prober.probe().await {
        ProbeResult::Failure { error } => {
            assert!(error.contains("exited with code 3"), "got: {error}");
            assert!(error.contains("boom"), "fault should preserve stderr: {error}");
        }
        ProbeResult::Success { .. } => panic!("non-zero exit must not succeed"),
    }
}

#[tokio::test]
async fn absent_program_is_a_fault_naming_the_dependency() {
    let tmp = tempfile::tempdir().unwrap();
    let missing = tmp.path().join("no-such-binary");

    let prober = Prober::new(vec![direct(&missing)], Duration::from_secs(10));

    match prober.probe().await {
        ProbeResult::Failure { error } => {
            assert!(error.contains("no-such-binary"), "got: {error}");
            assert!(
                error.contains("Install the Gemini CLI"),
                "failure must name the missing dependency: {error}"
            );
        }
        ProbeResult::Success { .. } => panic!("absent program must not succeed"),
    }
}

#[tokio::test]
async fn empty_strategy_list_still_returns_a_result() {
    let prober = Prober::new(Vec::new(), Duration::from_secs(1));

    match prober.probe().await {
        ProbeResult::Failure { error } => {
            assert!(error.contains("no execution strategy"), "got: {error}");
        }
        ProbeResult::Success { .. } => panic!("empty list cannot succeed"),
    }
}

// ---------------------------------------------------------------------------
// Timeout behavior
// ---------------------------------------------------------------------------

#[tokio::test]
async fn timeout_kills_the_child_and_faults() {
    let tmp = tempfile::tempdir().unwrap();
    let script = write_script(tmp.path(), "slow.sh", "sleep 5");

    let prober = Prober::new(vec![direct(&script)], Duration::from_millis(300));

    let start = Instant::now();
    let result = prober.probe().await;
    let elapsed = start.elapsed();

    match result {
        ProbeResult::Failure { error } => {
            assert!(error.contains("timed out"), "got: {error}");
        }
        ProbeResult::Success { .. } => panic!("timed-out strategy must not succeed"),
    }
    assert!(
        elapsed < Duration::from_secs(3),
        "probe must not wait for the child's full sleep (took {elapsed:?})"
    );
}

#[tokio::test]
async fn timeout_falls_back_to_next_strategy() {
    let tmp = tempfile::tempdir().unwrap();
    let slow = write_script(tmp.path(), "slow.sh", "sleep 5");
    let fast = write_script(tmp.path(), "fast.sh", "printf 'recovered'");

    let prober = Prober::new(
        vec![
            ExecutionStrategy::new("direct", slow.to_str().unwrap(), Vec::new()),
            ExecutionStrategy::new("shell", fast.to_str().unwrap(), Vec::new()),
        ],
        Duration::from_millis(300),
    );

    let start = Instant::now();
    let result = prober.probe().await;
    let elapsed = start.elapsed();

    match result {
        ProbeResult::Success { stdout, .. } => assert_eq!(stdout, "recovered"),
        ProbeResult::Failure { error } => panic!("fallback should have succeeded: {error}"),
    }
    assert!(
        elapsed < Duration::from_secs(3),
        "total latency is bounded by timeout x strategies (took {elapsed:?})"
    );
}

// ---------------------------------------------------------------------------
// Fallback ordering
// ---------------------------------------------------------------------------

#[tokio::test]
async fn first_success_short_circuits_remaining_strategies() {
    let tmp = tempfile::tempdir().unwrap();
    let marker = tmp.path().join("spawned.log");
    let marker_arg = marker.to_str().unwrap();

    let first = write_script(
        tmp.path(),
        "first.sh",
        &format!("echo first >> {marker_arg}\nprintf 'from first'"),
    );
    let second = write_script(
        tmp.path(),
        "second.sh",
        &format!("echo second >> {marker_arg}\nprintf 'from second'"),
    );

    let prober = Prober::new(
        vec![direct(&first), direct(&second)],
        Duration::from_secs(10),
    );

    match prober.probe().await {
        ProbeResult::Success { stdout, .. } => assert_eq!(stdout, "from first"),
        ProbeResult::Failure { error } => panic!("unexpected failure: {error}"),
    }

    let spawned = fs::read_to_string(&marker).unwrap();
    assert_eq!(spawned, "first\n", "only the first strategy may spawn");
}

#[tokio::test]
async fn later_strategy_result_hides_earlier_fault() {
    let tmp = tempfile::tempdir().unwrap();
    let broken = write_script(tmp.path(), "broken.sh", "printf 'first boom' >&2\nexit 2");
    let working = write_script(tmp.path(), "working.sh", "printf 'recovered'");

    let prober = Prober::new(
        vec![direct(&broken), direct(&working)],
        Duration::from_secs(10),
    );

    match prober.probe().await {
        ProbeResult::Success { stdout, stderr } => {
            assert_eq!(stdout, "recovered");
            assert!(
                !stdout.contains("first boom") && !stderr.contains("first boom"),
                "earlier fault must leave no trace in the final result"
            );
        }
        ProbeResult::Failure { error } => panic!("fallback should have succeeded: {error}"),
    }
}

#[tokio::test]
async fn exhaustion_preserves_the_last_fault() {
    let tmp = tempfile::tempdir().unwrap();
    let a = write_script(tmp.path(), "a.sh", "printf 'fault a' >&2\nexit 1");
    let b = write_script(tmp.path(), "b.sh", "printf 'fault b' >&2\nexit 1");

    let prober = Prober::new(vec![direct(&a), direct(&b)], Duration::from_secs(10));

    match prober.probe().await {
        ProbeResult::Failure { error } => {
            assert!(error.contains("fault b"), "got: {error}");
        }
        ProbeResult::Success { .. } => panic!("both strategies fault"),
    }
}

// ---------------------------------------------------------------------------
// Candidate list construction
// ---------------------------------------------------------------------------

#[test]
fn stock_program_gets_all_three_strategies() {
    let config = ServerConfig {
        gemini_program: "gemini".to_string(),
        health_model: "gemini-2.5-flash".to_string(),
        health_prompt: "say hi".to_string(),
        probe_timeout: Duration::from_secs(10),
    };

    let strategies = candidates(&config);
    let labels: Vec<&str> = strategies.iter().map(|s| s.label).collect();
    assert_eq!(labels, vec!["direct", "npx", "shell"]);

    assert_eq!(strategies[0].program, "gemini");
    assert_eq!(
        strategies[0].args,
        vec!["-m", "gemini-2.5-flash", "-p", "say hi"]
    );

    assert_eq!(strategies[1].program, "npx");
    assert_eq!(&strategies[1].args[..2], ["-y", "@google/gemini-cli"]);

    assert_eq!(strategies[2].program, "sh");
    assert_eq!(strategies[2].args[0], "-c");
    assert!(
        strategies[2].args[1].contains("'say hi'"),
        "prompt must be shell-quoted: {}",
        strategies[2].args[1]
    );
}

#[test]
fn custom_program_skips_the_package_runner() {
    let config = probe_config(Path::new("/opt/tools/fake-gemini"));
    let labels: Vec<&str> = candidates(&config).iter().map(|s| s.label).collect();
    assert_eq!(labels, vec!["direct", "shell"]);
}

#[test]
fn shell_quoting_escapes_single_quotes() {
    let config = ServerConfig {
        gemini_program: "gemini".to_string(),
        health_model: "gemini-2.5-flash".to_string(),
        health_prompt: "it's fine".to_string(),
        probe_timeout: Duration::from_secs(10),
    };

    let strategies = candidates(&config);
    let shell = strategies.last().unwrap();
    assert!(
        shell.args[1].contains(r"'it'\''s fine'"),
        "got: {}",
        shell.args[1]
    );
}

// ---------------------------------------------------------------------------
// End-to-end through the tools/call dispatch
// ---------------------------------------------------------------------------

fn health_check_request(id: i64) -> JsonRpcRequest {
    JsonRpcRequest {
        jsonrpc: "2.0".into(),
        id: Some(RpcId::Number(id)),
        method: "tools/call".into(),
        params: Some(serde_json::json!({
            "name": "health_check",
            "arguments": {}
        })),
    }
}

#[tokio::test]
async fn health_check_success_response_text() {
    let tmp = tempfile::tempdir().unwrap();
    let script = write_script(tmp.path(), "fake-gemini.sh", "printf 'hi'");
    let config = probe_config(&script);

    let response = handlers::dispatch(&health_check_request(1), &config)
        .await
        .unwrap();
    let result = response.result.unwrap();
    let text = result["content"][0]["text"].as_str().unwrap();

    assert_eq!(text, "Health check successful!\n\nGemini response:\nhi");
}

#[tokio::test]
async fn health_check_failure_response_names_the_dependency() {
    let tmp = tempfile::tempdir().unwrap();
    let config = probe_config(&tmp.path().join("no-such-binary"));

    let response = handlers::dispatch(&health_check_request(2), &config)
        .await
        .unwrap();
    let result = response.result.unwrap();
    let text = result["content"][0]["text"].as_str().unwrap();

    assert!(
        text.starts_with("Health check failed!\n\nError: "),
        "got: {text}"
    );
    assert!(text.contains("no-such-binary"), "got: {text}");
    assert!(text.contains("Install the Gemini CLI"), "got: {text}");
}
