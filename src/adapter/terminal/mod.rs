use crate::adapter::ToolHandler;
use crate::workspace::Workspace;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct TerminalCommandInput {
    pub command: String,
    #[serde(default)]
    pub cwd: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TerminalCommandOutput {
    pub command: String,
    #[serde(rename = "startingCwd", skip_serializing_if = "Option::is_none")]
    pub starting_cwd: Option<String>,
    pub message: String,
    pub stdout: String,
    pub stderr: String,
    #[serde(rename = "exitCode")]
    pub exit_code: i32,
}

impl TerminalCommandOutput {
    fn failure(command: String, starting_cwd: Option<String>, message: String) -> Self {
        Self {
            command,
            starting_cwd,
            message: message.clone(),
            stdout: String::new(),
            stderr: message,
            exit_code: 1,
        }
    }
}

/// Run a shell command confined to the workspace.
///
/// A `cwd` hint is validated against the workspace (the workspace path
/// itself, or a subdirectory the path policy accepts) and used as the
/// child's working directory. It is never spliced into the command string,
/// so classification always sees the raw command.
pub async fn run_terminal_command(
    workspace: &Workspace,
    input: TerminalCommandInput,
) -> TerminalCommandOutput {
    let command = input.command.clone();

    // Reduce an absolute cwd hint to a workspace-relative one.
    let relative_cwd = match &input.cwd {
        None => None,
        Some(cwd) => {
            let hinted = Path::new(cwd);
            if hinted.is_absolute() {
                if hinted == workspace.path() {
                    None
                } else {
                    match hinted.strip_prefix(workspace.path()) {
                        Ok(rest) => Some(rest.to_string_lossy().to_string()),
                        Err(_) => {
                            return TerminalCommandOutput::failure(
                                command,
                                None,
                                format!("cwd is outside the workspace: {}", cwd),
                            );
                        }
                    }
                }
            } else {
                Some(cwd.clone())
            }
        }
    };

    // Resolve once for the envelope's startingCwd; exec_in re-applies the
    // same policy before spawning.
    let starting_cwd = match &relative_cwd {
        None => workspace.path().to_string_lossy().to_string(),
        Some(rel) => match workspace.resolve(rel) {
            Ok(resolved) => resolved.to_string_lossy().to_string(),
            Err(e) => return TerminalCommandOutput::failure(command, None, e.to_string()),
        },
    };

    match workspace
        .exec_in(relative_cwd.as_deref(), &input.command)
        .await
    {
        Ok(stdout) => TerminalCommandOutput {
            command,
            starting_cwd: Some(starting_cwd),
            message: "Command executed successfully".to_string(),
            stdout,
            stderr: String::new(),
            exit_code: 0,
        },
        Err(e) => TerminalCommandOutput::failure(command, Some(starting_cwd), e.to_string()),
    }
}

pub struct RunTerminalCommandTool {
    workspace: Arc<Workspace>,
}

impl RunTerminalCommandTool {
    pub fn new(workspace: Arc<Workspace>) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl ToolHandler for RunTerminalCommandTool {
    fn name(&self) -> &'static str {
        "run_terminal_command"
    }

    fn description(&self) -> &'static str {
        "Execute a shell command inside the workspace and return its output."
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The shell command to execute"
                },
                "cwd": {
                    "type": "string",
                    "description": "Optional working directory inside the workspace"
                }
            },
            "required": ["command"]
        })
    }

    async fn call(&self, params: Value) -> Value {
        let input: TerminalCommandInput = match serde_json::from_value(params) {
            Ok(input) => input,
            Err(e) => {
                return serde_json::to_value(TerminalCommandOutput::failure(
                    String::new(),
                    None,
                    format!("invalid parameters: {}", e),
                ))
                .unwrap_or(Value::Null);
            }
        };
        serde_json::to_value(run_terminal_command(&self.workspace, input).await)
            .unwrap_or(Value::Null)
    }
}
