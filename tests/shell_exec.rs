use constellation_fs::config::{BackendConfig, LocalBackendConfig};
use constellation_fs::{FileSystem, FsError};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn unique_user(tag: &str) -> String {
    format!("it-sh-{}-{}", std::process::id(), tag)
}

async fn cleanup(user: &str) {
    let _ = tokio::fs::remove_dir_all(constellation_fs::config::workspace_root().join(user)).await;
}

#[tokio::test]
async fn exec_lists_written_files() {
    let user = unique_user("ls");
    let fs = FileSystem::local(&user).unwrap();
    let ws = fs.workspace().await.unwrap();

    ws.write("a.txt", "hi").await.unwrap();
    let out = ws.exec("ls").await.unwrap();
    assert!(out.contains("a.txt"), "ls output: {}", out);

    cleanup(&user).await;
}

#[tokio::test]
async fn dangerous_command_blocked_without_side_effects() {
    let user = unique_user("danger");
    let fs = FileSystem::local(&user).unwrap();
    let ws = fs.workspace().await.unwrap();
    ws.write("canary.txt", "alive").await.unwrap();

    let err = ws.exec("rm -rf /").await.unwrap_err();
    assert_eq!(err.code(), "DANGEROUS_OPERATION");
    assert_eq!(ws.read("canary.txt").await.unwrap(), "alive");

    cleanup(&user).await;
}

#[tokio::test]
async fn escape_command_blocked_with_specific_reason() {
    let user = unique_user("escape");
    let fs = FileSystem::local(&user).unwrap();
    let ws = fs.workspace().await.unwrap();

    let err = ws.exec("cd /tmp && ls").await.unwrap_err();
    assert_eq!(err.to_string(), "Directory change commands are not allowed");

    cleanup(&user).await;
}

#[tokio::test]
async fn output_truncation_end_to_end() {
    let user = unique_user("trunc");
    let mut config = LocalBackendConfig::new(&user);
    config.max_output_length = Some(100);
    let fs = FileSystem::new(BackendConfig::Local(config)).unwrap();
    let ws = fs.workspace().await.unwrap();

    let out = ws.exec("yes x | head -c 10000").await.unwrap();
    assert!(out.len() <= 100, "got {} chars", out.len());
    assert!(out.contains("... [Output truncated. Full output was"));

    cleanup(&user).await;
}

#[tokio::test]
async fn dangerous_hook_returns_empty_output() {
    let user = unique_user("hook");
    let calls = Arc::new(AtomicUsize::new(0));
    let hook_calls = calls.clone();

    let mut config = LocalBackendConfig::new(&user);
    config.on_dangerous = Some(Arc::new(move |cmd: &str| {
        assert_eq!(cmd, "sudo apt update");
        hook_calls.fetch_add(1, Ordering::SeqCst);
    }));
    let fs = FileSystem::new(BackendConfig::Local(config)).unwrap();
    let ws = fs.workspace().await.unwrap();

    let out = ws.exec("sudo apt update").await.unwrap();
    assert_eq!(out, "");
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    cleanup(&user).await;
}

#[tokio::test]
async fn empty_command_rejected() {
    let user = unique_user("empty");
    let fs = FileSystem::local(&user).unwrap();
    let ws = fs.workspace().await.unwrap();

    let err = ws.exec("").await.unwrap_err();
    assert_eq!(err.code(), "EMPTY_COMMAND");
    assert!(matches!(err, FsError::EmptyCommand));

    cleanup(&user).await;
}

#[tokio::test]
async fn concurrent_execs_on_one_workspace() {
    let user = unique_user("parallel");
    let fs = FileSystem::local(&user).unwrap();
    let ws = fs.workspace().await.unwrap();

    let tasks: Vec<_> = (0..4)
        .map(|i| {
            let ws = ws.clone();
            tokio::spawn(async move { ws.exec(&format!("echo task-{}", i)).await })
        })
        .collect();

    for (i, task) in tasks.into_iter().enumerate() {
        let out = task.await.unwrap().unwrap();
        assert_eq!(out, format!("task-{}", i));
    }

    cleanup(&user).await;
}
