use crate::errors::{FsError, FsResult};
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

/// Variables that must never reach a child process. The environment is
/// built from empty, so these are never inserted rather than removed.
pub const SCRUBBED_VARS: &[&str] = &[
    "LD_PRELOAD",
    "LD_LIBRARY_PATH",
    "DYLD_INSERT_LIBRARIES",
    "DYLD_LIBRARY_PATH",
    "IFS",
    "BASH_ENV",
    "ENV",
];

/// Variables the builder sets itself. Callers may override them, but doing
/// so is logged because it changes path and temp-file resolution.
const PROTECTED_VARS: &[&str] = &["PATH", "HOME", "PWD", "TMPDIR", "TMP", "SHELL", "USER"];

/// Fixed binary lookup path for child shells.
const DEFAULT_PATH: &str = "/usr/local/bin:/usr/bin:/bin:/usr/sbin:/sbin";

/// Build a minimal, scrubbed environment for a child process rooted at the
/// workspace: `HOME` and `PWD` point at the workspace, `TMPDIR` at its
/// `.tmp` subdirectory, and locale is pinned to `C`. `custom_env` is merged
/// last, with scrubbed variables silently dropped (with a warning) and NUL
/// bytes rejected.
pub fn build_env(
    workspace: &Path,
    shell: &str,
    custom_env: Option<&HashMap<String, String>>,
) -> FsResult<HashMap<String, String>> {
    let workspace_str = workspace.to_string_lossy().to_string();
    let mut env = HashMap::new();

    env.insert("PATH".to_string(), DEFAULT_PATH.to_string());
    if let Ok(user) = std::env::var("USER") {
        env.insert("USER".to_string(), user);
    }
    env.insert("SHELL".to_string(), shell.to_string());
    env.insert("PWD".to_string(), workspace_str.clone());
    env.insert("HOME".to_string(), workspace_str);
    env.insert(
        "TMPDIR".to_string(),
        workspace.join(".tmp").to_string_lossy().to_string(),
    );
    env.insert("LANG".to_string(), "C".to_string());
    env.insert("LC_ALL".to_string(), "C".to_string());

    let Some(custom) = custom_env else {
        return Ok(env);
    };

    for (key, value) in custom {
        if key.contains('\0') || value.contains('\0') {
            return Err(FsError::InvalidConfiguration(format!(
                "environment variable {} contains a NUL byte",
                key
            )));
        }
        if SCRUBBED_VARS.contains(&key.as_str()) {
            warn!("dropping scrubbed environment variable: {}", key);
            continue;
        }
        if PROTECTED_VARS.contains(&key.as_str()) {
            warn!("overriding protected environment variable: {}", key);
        }
        env.insert(key.clone(), value.clone());
    }

    Ok(env)
}
