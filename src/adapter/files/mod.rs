use crate::adapter::ToolHandler;
use crate::errors::FsError;
use crate::workspace::Workspace;
use async_trait::async_trait;
use ignore::gitignore::GitignoreBuilder;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

/// Largest single file `read_files` returns inline.
const MAX_READ_BYTES: u64 = 1024 * 1024;

pub const SENTINEL_NOT_FOUND: &str = "[FILE_DOES_NOT_EXIST]";
pub const SENTINEL_IGNORED: &str = "[FILE_IGNORED_BY_GITIGNORE_OR_CODEBUFF_IGNORE]";
pub const SENTINEL_OUTSIDE: &str = "[FILE_OUTSIDE_PROJECT]";
pub const SENTINEL_READ_ERROR: &str = "[FILE_READ_ERROR]";

#[derive(Debug, Deserialize)]
pub struct ReadFilesInput {
    #[serde(rename = "filePaths")]
    pub file_paths: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteKind {
    #[default]
    File,
    Patch,
}

#[derive(Debug, Deserialize)]
pub struct WriteFileInput {
    pub path: String,
    pub content: String,
    #[serde(default, rename = "type")]
    pub kind: WriteKind,
}

#[derive(Debug, Deserialize)]
pub struct StrReplaceInput {
    pub path: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum WriteFileOutput {
    Success {
        file: String,
        message: String,
        #[serde(rename = "unifiedDiff")]
        unified_diff: String,
    },
    Failure {
        file: String,
        #[serde(rename = "errorMessage")]
        error_message: String,
    },
}

impl WriteFileOutput {
    fn failure(file: &str, error_message: impl Into<String>) -> Self {
        WriteFileOutput::Failure {
            file: file.to_string(),
            error_message: error_message.into(),
        }
    }
}

/// Read several files, mapping each path to its content or a sentinel tag.
/// Errors never propagate; every path gets an answer.
pub async fn read_files(workspace: &Workspace, input: ReadFilesInput) -> Value {
    let ignore_matcher = build_ignore_matcher(workspace);
    let mut result = Map::new();

    for path in input.file_paths {
        let entry = read_one(workspace, &path, ignore_matcher.as_ref()).await;
        result.insert(path, Value::String(entry));
    }

    Value::Object(result)
}

async fn read_one(
    workspace: &Workspace,
    path: &str,
    ignore_matcher: Option<&ignore::gitignore::Gitignore>,
) -> String {
    let resolved = match workspace.resolve(path) {
        Ok(resolved) => resolved,
        Err(
            FsError::AbsolutePathRejected(_) | FsError::PathEscape(_) | FsError::SymlinkEscape(_),
        ) => return SENTINEL_OUTSIDE.to_string(),
        Err(_) => return SENTINEL_READ_ERROR.to_string(),
    };

    if let Some(matcher) = ignore_matcher
        && matcher
            .matched_path_or_any_parents(&resolved, false)
            .is_ignore()
    {
        return SENTINEL_IGNORED.to_string();
    }

    let metadata = match tokio::fs::metadata(&resolved).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return SENTINEL_NOT_FOUND.to_string();
        }
        Err(_) => return SENTINEL_READ_ERROR.to_string(),
    };

    if metadata.len() > MAX_READ_BYTES {
        let megabytes = metadata.len() as f64 / (1024.0 * 1024.0);
        return format!("[FILE_TOO_LARGE] [{:.2}MB]", megabytes);
    }

    match tokio::fs::read_to_string(&resolved).await {
        Ok(content) => content,
        Err(_) => SENTINEL_READ_ERROR.to_string(),
    }
}

/// Matcher over `.gitignore` and `.codebuffignore` at the workspace root.
/// Absent files simply contribute no rules.
fn build_ignore_matcher(workspace: &Workspace) -> Option<ignore::gitignore::Gitignore> {
    let mut builder = GitignoreBuilder::new(workspace.path());
    builder.add(workspace.path().join(".gitignore"));
    builder.add(workspace.path().join(".codebuffignore"));
    match builder.build() {
        Ok(matcher) if matcher.num_ignores() > 0 => Some(matcher),
        Ok(_) => None,
        Err(e) => {
            debug!("ignoring malformed ignore file: {}", e);
            None
        }
    }
}

/// Write a file. `type: "file"` overwrites with the given content;
/// `type: "patch"` treats the content as a unified diff over the current
/// file. Either way the response carries the unified diff of what changed.
pub async fn write_file(workspace: &Workspace, input: WriteFileInput) -> WriteFileOutput {
    match input.kind {
        WriteKind::File => {
            let old = workspace.read(&input.path).await.unwrap_or_default();
            if let Err(e) = workspace.write(&input.path, &input.content).await {
                return WriteFileOutput::failure(&input.path, e.to_string());
            }
            let unified_diff = diffy::create_patch(&old, &input.content).to_string();
            WriteFileOutput::Success {
                file: input.path.clone(),
                message: format!("Successfully wrote {}", input.path),
                unified_diff,
            }
        }
        WriteKind::Patch => apply_patch(workspace, &input.path, &input.content).await,
    }
}

/// Apply a unified diff to a file. The declared contract of `str_replace`:
/// content is always a patch.
pub async fn str_replace(workspace: &Workspace, input: StrReplaceInput) -> WriteFileOutput {
    apply_patch(workspace, &input.path, &input.content).await
}

async fn apply_patch(workspace: &Workspace, path: &str, diff: &str) -> WriteFileOutput {
    let old = match workspace.read(path).await {
        Ok(old) => old,
        // Patches may create files; a missing target applies against empty.
        Err(FsError::ReadFailed(_)) => String::new(),
        Err(e) => return WriteFileOutput::failure(path, e.to_string()),
    };

    let patch = match diffy::Patch::from_str(diff) {
        Ok(patch) => patch,
        Err(e) => {
            return WriteFileOutput::failure(path, format!("invalid unified diff: {}", e));
        }
    };

    let new = match diffy::apply(&old, &patch) {
        Ok(new) => new,
        Err(e) => {
            return WriteFileOutput::failure(path, format!("patch does not apply: {}", e));
        }
    };

    if let Err(e) = workspace.write(path, &new).await {
        return WriteFileOutput::failure(path, e.to_string());
    }

    WriteFileOutput::Success {
        file: path.to_string(),
        message: format!("Successfully patched {}", path),
        unified_diff: diffy::create_patch(&old, &new).to_string(),
    }
}

pub struct ReadFilesTool {
    workspace: Arc<Workspace>,
}

impl ReadFilesTool {
    pub fn new(workspace: Arc<Workspace>) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl ToolHandler for ReadFilesTool {
    fn name(&self) -> &'static str {
        "read_files"
    }

    fn description(&self) -> &'static str {
        "Read multiple files from the workspace. Missing or unreadable files map to sentinel tags."
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "filePaths": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Workspace-relative paths to read"
                }
            },
            "required": ["filePaths"]
        })
    }

    async fn call(&self, params: Value) -> Value {
        match serde_json::from_value::<ReadFilesInput>(params) {
            Ok(input) => read_files(&self.workspace, input).await,
            Err(e) => serde_json::json!({"errorMessage": format!("invalid parameters: {}", e)}),
        }
    }
}

pub struct WriteFileTool {
    workspace: Arc<Workspace>,
}

impl WriteFileTool {
    pub fn new(workspace: Arc<Workspace>) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl ToolHandler for WriteFileTool {
    fn name(&self) -> &'static str {
        "write_file"
    }

    fn description(&self) -> &'static str {
        "Write a file (full content) or apply a unified diff to it."
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Workspace-relative file path"
                },
                "content": {
                    "type": "string",
                    "description": "File content, or a unified diff when type is \"patch\""
                },
                "type": {
                    "type": "string",
                    "enum": ["file", "patch"],
                    "description": "Whether content is the full file or a patch"
                }
            },
            "required": ["path", "content"]
        })
    }

    async fn call(&self, params: Value) -> Value {
        match serde_json::from_value::<WriteFileInput>(params) {
            Ok(input) => serde_json::to_value(write_file(&self.workspace, input).await)
                .unwrap_or(Value::Null),
            Err(e) => serde_json::json!({"errorMessage": format!("invalid parameters: {}", e)}),
        }
    }
}

pub struct StrReplaceTool {
    workspace: Arc<Workspace>,
}

impl StrReplaceTool {
    pub fn new(workspace: Arc<Workspace>) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl ToolHandler for StrReplaceTool {
    fn name(&self) -> &'static str {
        "str_replace"
    }

    fn description(&self) -> &'static str {
        "Apply a unified diff to a workspace file."
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Workspace-relative file path"
                },
                "content": {
                    "type": "string",
                    "description": "Unified diff to apply"
                }
            },
            "required": ["path", "content"]
        })
    }

    async fn call(&self, params: Value) -> Value {
        match serde_json::from_value::<StrReplaceInput>(params) {
            Ok(input) => serde_json::to_value(str_replace(&self.workspace, input).await)
                .unwrap_or(Value::Null),
            Err(e) => serde_json::json!({"errorMessage": format!("invalid parameters: {}", e)}),
        }
    }
}
