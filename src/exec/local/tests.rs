use super::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

fn executor() -> LocalExecutor {
    LocalExecutor::new(PathBuf::from("/bin/sh"), true, None, None)
}

async fn run_text(exec: &LocalExecutor, ws: &Path, command: &str) -> FsResult<String> {
    exec.exec(ws, ws, command, OutputEncoding::Text, None)
        .await
        .map(ExecOutput::into_text)
}

#[tokio::test]
async fn echo_returns_trimmed_stdout() {
    let tmp = TempDir::new().expect("create temp dir");
    let out = run_text(&executor(), tmp.path(), "echo hello world")
        .await
        .unwrap();
    assert_eq!(out, "hello world");
}

#[tokio::test]
async fn bytes_encoding_returns_raw_stdout() {
    let tmp = TempDir::new().expect("create temp dir");
    let out = executor()
        .exec(
            tmp.path(),
            tmp.path(),
            "printf 'a\\nb\\n'",
            OutputEncoding::Bytes,
            None,
        )
        .await
        .unwrap();
    assert_eq!(out, ExecOutput::Bytes(b"a\nb\n".to_vec()));
}

#[tokio::test]
async fn empty_command_rejected() {
    let tmp = TempDir::new().expect("create temp dir");
    let err = run_text(&executor(), tmp.path(), "   ").await.unwrap_err();
    assert_eq!(err.code(), "EMPTY_COMMAND");
}

#[tokio::test]
async fn dangerous_command_raises_without_hook() {
    let tmp = TempDir::new().expect("create temp dir");
    let err = run_text(&executor(), tmp.path(), "rm -rf /")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "DANGEROUS_OPERATION");
    assert_eq!(err.command(), Some("rm -rf /"));
    // Nothing was spawned; the workspace is untouched.
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn dangerous_command_invokes_hook_once() {
    let tmp = TempDir::new().expect("create temp dir");
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::new(std::sync::Mutex::new(String::new()));
    let hook = {
        let calls = calls.clone();
        let seen = seen.clone();
        Arc::new(move |cmd: &str| {
            calls.fetch_add(1, Ordering::SeqCst);
            *seen.lock().unwrap() = cmd.to_string();
        })
    };
    let exec = LocalExecutor::new(PathBuf::from("/bin/sh"), true, None, Some(hook));

    let out = run_text(&exec, tmp.path(), "sudo apt update").await.unwrap();
    assert_eq!(out, "");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(seen.lock().unwrap().as_str(), "sudo apt update");
}

#[tokio::test]
async fn escaping_command_rejected_even_with_hook() {
    let tmp = TempDir::new().expect("create temp dir");
    let hook: DangerousHook = Arc::new(|_| panic!("hook must not fire for escape rejections"));
    let exec = LocalExecutor::new(PathBuf::from("/bin/sh"), true, None, Some(hook));

    let err = run_text(&exec, tmp.path(), "cd /tmp && ls").await.unwrap_err();
    assert_eq!(err.code(), "DANGEROUS_OPERATION");
    assert_eq!(err.to_string(), "Directory change commands are not allowed");
}

#[tokio::test]
async fn prevent_dangerous_false_lets_dangerous_run() {
    let tmp = TempDir::new().expect("create temp dir");
    let exec = LocalExecutor::new(PathBuf::from("/bin/sh"), false, None, None);
    // Classified dangerous (leading curl), but harmless to actually run.
    // Either way the child was spawned: curl missing from the fixed PATH
    // yields EXEC_FAILED, a present curl yields its usage error.
    match run_text(&exec, tmp.path(), "curl").await {
        Ok(_) => {}
        Err(e) => assert_eq!(e.code(), "EXEC_FAILED"),
    }
}

#[tokio::test]
async fn nonzero_exit_surfaces_code_and_stderr() {
    let tmp = TempDir::new().expect("create temp dir");
    let err = run_text(&executor(), tmp.path(), "echo oops >&2; exit 3")
        .await
        .unwrap_err();
    let FsError::ExecutionFailed {
        exit_code, message, ..
    } = &err
    else {
        panic!("expected ExecutionFailed, got {:?}", err);
    };
    assert_eq!(*exit_code, 3);
    assert_eq!(message, "oops");
}

#[tokio::test]
async fn nonzero_exit_falls_back_to_stdout_message() {
    let tmp = TempDir::new().expect("create temp dir");
    let err = run_text(&executor(), tmp.path(), "echo visible; exit 1")
        .await
        .unwrap_err();
    let FsError::ExecutionFailed { message, .. } = &err else {
        panic!("expected ExecutionFailed");
    };
    assert_eq!(message, "visible");
}

#[tokio::test]
async fn spawn_failure_is_exec_error() {
    let tmp = TempDir::new().expect("create temp dir");
    let exec = LocalExecutor::new(PathBuf::from("/nonexistent/shell"), true, None, None);
    let err = run_text(&exec, tmp.path(), "echo hi").await.unwrap_err();
    assert_eq!(err.code(), "EXEC_ERROR");
}

#[tokio::test]
async fn output_truncated_within_budget() {
    let tmp = TempDir::new().expect("create temp dir");
    let exec = LocalExecutor::new(PathBuf::from("/bin/sh"), true, Some(100), None);
    let out = run_text(&exec, tmp.path(), "yes x | head -c 10000")
        .await
        .unwrap();
    assert!(out.len() <= 100, "length {} exceeds budget", out.len());
    assert!(out.contains("... [Output truncated. Full output was"));
    assert!(out.ends_with(']'));
}

#[tokio::test]
async fn short_output_not_truncated() {
    let tmp = TempDir::new().expect("create temp dir");
    let exec = LocalExecutor::new(PathBuf::from("/bin/sh"), true, Some(100), None);
    let out = run_text(&exec, tmp.path(), "echo brief").await.unwrap();
    assert_eq!(out, "brief");
}

#[tokio::test]
async fn child_env_is_scrubbed_and_rooted() {
    let tmp = TempDir::new().expect("create temp dir");
    let mut custom = HashMap::new();
    custom.insert("LD_PRELOAD".to_string(), "/evil.so".to_string());
    custom.insert("MARKER".to_string(), "present".to_string());

    let out = executor()
        .exec(tmp.path(), tmp.path(), "env", OutputEncoding::Text, Some(&custom))
        .await
        .unwrap()
        .into_text();

    assert!(!out.contains("LD_PRELOAD"), "LD_PRELOAD leaked: {}", out);
    assert!(out.contains("MARKER=present"));
    assert!(out.contains(&format!("HOME={}", tmp.path().display())));
    assert!(out.contains("LC_ALL=C"));
}

#[test]
fn truncate_output_respects_exact_budget() {
    let text = "x".repeat(5000);
    for max in [90, 100, 200, 1000] {
        let out = truncate_output(&text, max);
        assert!(out.len() <= max, "max {}: got {}", max, out.len());
        assert!(out.ends_with(']'), "max {}: missing suffix", max);
    }
}

#[test]
fn truncate_output_tiny_budget_is_bare_slice() {
    let text = "x".repeat(500);
    let out = truncate_output(&text, 10);
    assert_eq!(out, "xxxxxxxxxx");
}

#[test]
fn truncate_output_never_splits_multibyte() {
    let text = "é".repeat(300); // 2 bytes each
    let out = truncate_output(&text, 101);
    assert!(out.len() <= 101);
    assert!(std::str::from_utf8(out.as_bytes()).is_ok());
}
