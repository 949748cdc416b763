use crate::adapter::ToolHandler;
use crate::errors::FsError;
use crate::workspace::Workspace;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

fn default_max_results() -> usize {
    100
}

#[derive(Debug, Deserialize)]
pub struct CodeSearchInput {
    pub pattern: String,
    #[serde(default = "default_max_results", rename = "maxResults")]
    pub max_results: usize,
    #[serde(default)]
    pub flags: Option<String>,
    #[serde(default)]
    pub cwd: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CodeSearchOutput {
    pub stdout: String,
    pub stderr: String,
    #[serde(rename = "exitCode")]
    pub exit_code: i32,
    pub message: String,
}

impl CodeSearchOutput {
    fn failure(message: String) -> Self {
        Self {
            stdout: String::new(),
            stderr: message.clone(),
            exit_code: 1,
            message,
        }
    }
}

/// Search the workspace with `grep -rn`. Matches are capped at
/// `maxResults` lines; grep's "no matches" exit is reported as a normal
/// empty result, and every other failure is captured in the envelope.
pub async fn code_search(workspace: &Workspace, input: CodeSearchInput) -> CodeSearchOutput {
    let Ok(quoted_pattern) = shlex::try_quote(&input.pattern) else {
        return CodeSearchOutput::failure("pattern cannot be quoted for the shell".to_string());
    };

    let mut command = format!("grep -rn {} .", quoted_pattern);
    if let Some(flags) = &input.flags {
        for flag in flags.split_whitespace() {
            if !flag.starts_with('-')
                || !flag[1..]
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '=')
            {
                return CodeSearchOutput::failure(format!("unsupported grep flag: {}", flag));
            }
            command.push(' ');
            command.push_str(flag);
        }
    }

    match workspace.exec_in(input.cwd.as_deref(), &command).await {
        Ok(stdout) => {
            let lines: Vec<&str> = stdout.lines().collect();
            let total = lines.len();
            let shown = total.min(input.max_results);
            CodeSearchOutput {
                stdout: lines[..shown].join("\n"),
                stderr: String::new(),
                exit_code: 0,
                message: if total > shown {
                    format!("Found {} matching lines, showing first {}", total, shown)
                } else {
                    format!("Found {} matching lines", total)
                },
            }
        }
        // grep exits 1 when nothing matched; that is an empty result, not
        // an error.
        Err(FsError::ExecutionFailed {
            exit_code: 1,
            message,
            ..
        }) if message.is_empty() => CodeSearchOutput {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: 1,
            message: "No matches found".to_string(),
        },
        Err(e) => CodeSearchOutput::failure(e.to_string()),
    }
}

pub struct CodeSearchTool {
    workspace: Arc<Workspace>,
}

impl CodeSearchTool {
    pub fn new(workspace: Arc<Workspace>) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl ToolHandler for CodeSearchTool {
    fn name(&self) -> &'static str {
        "code_search"
    }

    fn description(&self) -> &'static str {
        "Search workspace files with grep and return matching lines."
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "pattern": {
                    "type": "string",
                    "description": "Pattern passed to grep"
                },
                "maxResults": {
                    "type": "integer",
                    "description": "Maximum number of matching lines to return"
                },
                "flags": {
                    "type": "string",
                    "description": "Optional extra grep flags, e.g. \"-i\""
                },
                "cwd": {
                    "type": "string",
                    "description": "Optional subdirectory to search in"
                }
            },
            "required": ["pattern"]
        })
    }

    async fn call(&self, params: Value) -> Value {
        match serde_json::from_value::<CodeSearchInput>(params) {
            Ok(input) => serde_json::to_value(code_search(&self.workspace, input).await)
                .unwrap_or(Value::Null),
            Err(e) => serde_json::to_value(CodeSearchOutput::failure(format!(
                "invalid parameters: {}",
                e
            )))
            .unwrap_or(Value::Null),
        }
    }
}
