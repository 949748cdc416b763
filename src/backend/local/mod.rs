use crate::config::{LocalBackendConfig, ShellKind, loader};
use crate::errors::{FsError, FsResult};
use crate::exec::LocalExecutor;
use crate::workspace::Workspace;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Utilities the backend can optionally verify before accepting work.
const REQUIRED_UTILS: &[&str] = &["ls", "find", "grep", "cat", "wc", "head", "tail", "sort"];

/// Local (in-process) backend: spawns shells on this host, confined to
/// `workspaceRoot/<userId>/<workspaceName>` directories.
pub struct LocalBackend {
    config: LocalBackendConfig,
    executor: Arc<LocalExecutor>,
    workspaces: Mutex<HashMap<String, Arc<Workspace>>>,
    connected: AtomicBool,
}

impl std::fmt::Debug for LocalBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalBackend")
            .field("config", &self.config)
            .field("executor", &self.executor)
            .field("connected", &self.connected)
            .finish()
    }
}

impl LocalBackend {
    pub fn new(config: LocalBackendConfig) -> FsResult<Self> {
        config.validate()?;

        let shell_path = detect_shell(config.shell)?;
        if config.validate_utils {
            probe_utilities()?;
        }
        debug!(
            "local backend for {} using shell {}",
            config.user_id,
            shell_path.display()
        );

        let executor = Arc::new(LocalExecutor::new(
            shell_path,
            config.prevent_dangerous,
            config.max_output_length,
            config.on_dangerous.clone(),
        ));

        Ok(Self {
            config,
            executor,
            workspaces: Mutex::new(HashMap::new()),
            connected: AtomicBool::new(true),
        })
    }

    pub fn user_id(&self) -> &str {
        &self.config.user_id
    }

    pub fn config(&self) -> &LocalBackendConfig {
        &self.config
    }

    pub fn connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Root directory holding this user's workspaces.
    pub fn user_root(&self) -> PathBuf {
        loader::workspace_root().join(&self.config.user_id)
    }

    pub async fn workspace(
        &self,
        name: &str,
        env: Option<HashMap<String, String>>,
    ) -> FsResult<Arc<Workspace>> {
        validate_workspace_name(name)?;

        let key = match &env {
            Some(env) if !env.is_empty() => format!("{}|{}", name, env_fingerprint(env)),
            _ => name.to_string(),
        };

        if let Some(workspace) = self.workspaces.lock().expect("workspace cache lock").get(&key) {
            return Ok(workspace.clone());
        }

        let path = self.user_root().join(name);
        tokio::fs::create_dir_all(&path)
            .await
            .map_err(|e| FsError::WriteFailed(format!("{}: {}", path.display(), e)))?;
        // Resolve symlinked temp roots (e.g. /var on macOS) so the path
        // policy's prefix checks see the same form the OS reports.
        let path = std::fs::canonicalize(&path).unwrap_or(path);

        let workspace = Arc::new(Workspace::new(
            self.config.user_id.clone(),
            name.to_string(),
            path,
            self.executor.clone(),
            env,
        ));

        self.workspaces
            .lock()
            .expect("workspace cache lock")
            .insert(key, workspace.clone());
        Ok(workspace)
    }

    pub async fn list_workspaces(&self) -> FsResult<Vec<String>> {
        let root = self.user_root();
        let mut reader = match tokio::fs::read_dir(&root).await {
            Ok(reader) => reader,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(FsError::ReadFailed(format!("{}: {}", root.display(), e))),
        };

        let mut names = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| FsError::ReadFailed(e.to_string()))?
        {
            if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn destroy(&self) {
        self.workspaces.lock().expect("workspace cache lock").clear();
        self.connected.store(false, Ordering::SeqCst);
    }
}

/// Resolve the shell binary for the configured kind. `Auto` probes for bash
/// and falls back to sh.
pub(crate) fn detect_shell(kind: ShellKind) -> FsResult<PathBuf> {
    match kind {
        ShellKind::Auto => which::which("bash")
            .or_else(|_| which::which("sh"))
            .map_err(|_| FsError::MissingUtilities("no usable shell found (bash, sh)".to_string())),
        ShellKind::Bash => which::which("bash")
            .map_err(|_| FsError::MissingUtilities("bash".to_string())),
        ShellKind::Sh => {
            which::which("sh").map_err(|_| FsError::MissingUtilities("sh".to_string()))
        }
    }
}

fn probe_utilities() -> FsResult<()> {
    let missing: Vec<&str> = REQUIRED_UTILS
        .iter()
        .copied()
        .filter(|util| which::which(util).is_err())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(FsError::MissingUtilities(missing.join(", ")))
    }
}

/// Workspace names become directory names; hold them to the same charset
/// as user ids.
fn validate_workspace_name(name: &str) -> FsResult<()> {
    crate::config::validate_user_id(name)
        .map_err(|_| FsError::InvalidConfiguration(format!("invalid workspace name: {}", name)))
}

/// Stable fingerprint of a custom environment for workspace-cache keying.
fn env_fingerprint(env: &HashMap<String, String>) -> String {
    let mut pairs: Vec<(&String, &String)> = env.iter().collect();
    pairs.sort();
    let mut hasher = Sha256::new();
    for (key, value) in pairs {
        hasher.update(key.as_bytes());
        hasher.update(b"=");
        hasher.update(value.as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())[..16].to_string()
}
