use crate::config::DangerousHook;
use crate::errors::{FsError, FsResult};
use crate::exec::env::build_env;
use crate::exec::{CommandExecutor, ExecOutput, OutputEncoding};
use crate::safety::commands::{Classification, RejectCategory, classify_command};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

/// Executes commands by spawning `<shell> -c <command>` in a scrubbed
/// environment with the workspace as the working directory. Calls may
/// overlap freely; each spawns its own child.
pub struct LocalExecutor {
    shell_path: PathBuf,
    prevent_dangerous: bool,
    max_output_length: Option<usize>,
    on_dangerous: Option<DangerousHook>,
}

impl std::fmt::Debug for LocalExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalExecutor")
            .field("shell_path", &self.shell_path)
            .field("prevent_dangerous", &self.prevent_dangerous)
            .field("max_output_length", &self.max_output_length)
            .field("on_dangerous", &self.on_dangerous.as_ref().map(|_| "<hook>"))
            .finish()
    }
}

impl LocalExecutor {
    pub fn new(
        shell_path: PathBuf,
        prevent_dangerous: bool,
        max_output_length: Option<usize>,
        on_dangerous: Option<DangerousHook>,
    ) -> Self {
        Self {
            shell_path,
            prevent_dangerous,
            max_output_length,
            on_dangerous,
        }
    }

    pub fn shell_path(&self) -> &Path {
        &self.shell_path
    }

    /// Apply the command policy. Returns `Ok(true)` when the command may be
    /// spawned, `Ok(false)` when the dangerous-operation hook consumed it.
    fn guard(&self, command: &str) -> FsResult<bool> {
        match classify_command(command) {
            Classification::Safe => Ok(true),
            Classification::Rejected {
                category: RejectCategory::Empty,
                ..
            } => Err(FsError::EmptyCommand),
            Classification::Rejected {
                category: RejectCategory::Dangerous,
                reason,
            } => {
                if !self.prevent_dangerous {
                    warn!("executing dangerous command (preventDangerous=false): {}", command);
                    return Ok(true);
                }
                if let Some(hook) = &self.on_dangerous {
                    debug!("dangerous command intercepted by hook: {}", command);
                    hook(command);
                    return Ok(false);
                }
                Err(FsError::DangerousOperation {
                    reason: reason.to_string(),
                    command: Some(command.to_string()),
                })
            }
            // Escaping commands defeat confinement itself; no flag or hook
            // lets them through.
            Classification::Rejected {
                category: RejectCategory::Escaping,
                reason,
            } => Err(FsError::DangerousOperation {
                reason: reason.to_string(),
                command: Some(command.to_string()),
            }),
        }
    }

    fn empty_output(encoding: OutputEncoding) -> ExecOutput {
        match encoding {
            OutputEncoding::Text => ExecOutput::Text(String::new()),
            OutputEncoding::Bytes => ExecOutput::Bytes(Vec::new()),
        }
    }

    fn apply_max_length(&self, text: String) -> String {
        match self.max_output_length {
            Some(max) if text.len() > max => truncate_output(&text, max),
            _ => text,
        }
    }
}

#[async_trait]
impl CommandExecutor for LocalExecutor {
    async fn exec(
        &self,
        workspace: &Path,
        cwd: &Path,
        command: &str,
        encoding: OutputEncoding,
        custom_env: Option<&HashMap<String, String>>,
    ) -> FsResult<ExecOutput> {
        if !self.guard(command)? {
            return Ok(Self::empty_output(encoding));
        }

        let env = build_env(workspace, &self.shell_path.to_string_lossy(), custom_env)?;

        // TMPDIR points into the workspace; make sure it exists.
        tokio::fs::create_dir_all(workspace.join(".tmp"))
            .await
            .map_err(|e| FsError::ExecutionError(format!("cannot create workspace tmp dir: {}", e)))?;

        debug!("exec in {}: {}", cwd.display(), command);

        let mut cmd = Command::new(&self.shell_path);
        cmd.arg("-c")
            .arg(command)
            .current_dir(cwd)
            .env_clear()
            .envs(&env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // output() drains both pipes to completion before the child-close
        // future resolves, so truncation below never drops in-flight bytes.
        let output = cmd
            .output()
            .await
            .map_err(|e| FsError::ExecutionError(format!("{}: {}", self.shell_path.display(), e)))?;

        if output.status.success() {
            return Ok(match encoding {
                OutputEncoding::Bytes => ExecOutput::Bytes(output.stdout),
                OutputEncoding::Text => {
                    let text = String::from_utf8_lossy(&output.stdout)
                        .trim_end()
                        .to_string();
                    ExecOutput::Text(self.apply_max_length(text))
                }
            });
        }

        let exit_code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let message = if stderr.is_empty() { stdout } else { stderr };

        Err(FsError::ExecutionFailed {
            exit_code,
            message: self.apply_max_length(message),
            command: Some(command.to_string()),
        })
    }
}

/// Truncate `text` so that content plus the literal truncation suffix fit
/// inside `max` bytes. Limits too small to host the suffix fall back to a
/// bare boundary-safe slice.
fn truncate_output(text: &str, max: usize) -> String {
    let total = text.len();
    let suffix_for = |kept: usize| {
        format!(
            "\n\n... [Output truncated. Full output was {} characters, showing first {}]",
            total, kept
        )
    };

    // Initial estimate per the output discipline, then shrink until the
    // suffix fits inside the budget.
    let mut kept = max.saturating_sub(50).min(total);
    while kept > 0 && kept + suffix_for(kept).len() > max {
        kept -= 1;
    }
    kept = floor_char_boundary(text, kept);

    if kept == 0 {
        let end = floor_char_boundary(text, max);
        return text[..end].to_string();
    }

    format!("{}{}", &text[..kept], suffix_for(kept))
}

/// Find the largest byte index <= `index` that is a valid char boundary.
fn floor_char_boundary(s: &str, index: usize) -> usize {
    let mut i = index.min(s.len());
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

#[cfg(test)]
mod tests;
