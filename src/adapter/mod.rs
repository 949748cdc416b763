//! SDK tool-override surface.
//!
//! An [`SdkAdapter`] wraps one workspace and exposes the named tool handlers
//! an agent SDK plugs in verbatim: `run_terminal_command`, `read_files`,
//! `write_file`, `str_replace`, and `code_search`. Handlers never raise;
//! failures come back as structured envelopes because downstream SDKs
//! tolerate objects better than thrown errors.

pub mod files;
pub mod search;
pub mod terminal;

use crate::errors::FsResult;
use crate::filesystem::FileSystem;
use crate::workspace::Workspace;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub use files::{ReadFilesTool, StrReplaceTool, WriteFileTool};
pub use search::CodeSearchTool;
pub use terminal::RunTerminalCommandTool;

/// A named tool handler with a JSON-schema parameter description.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    /// JSON Schema of the handler's input.
    fn parameters(&self) -> Value;
    /// Invoke the handler. Always returns a structured envelope, never an
    /// error.
    async fn call(&self, params: Value) -> Value;
}

/// The handler bag an agent SDK consumes: one instance per workspace.
pub struct SdkAdapter {
    workspace: Arc<Workspace>,
}

impl SdkAdapter {
    /// Build an adapter over a named workspace of the given filesystem.
    pub async fn new(fs: &FileSystem, workspace_name: &str) -> FsResult<Self> {
        let workspace = fs.workspace_named(workspace_name).await?;
        Ok(Self { workspace })
    }

    pub fn from_workspace(workspace: Arc<Workspace>) -> Self {
        Self { workspace }
    }

    pub fn workspace(&self) -> &Arc<Workspace> {
        &self.workspace
    }

    /// All five handlers, ready to hand to an SDK's tool registry.
    pub fn handlers(&self) -> Vec<Arc<dyn ToolHandler>> {
        vec![
            Arc::new(RunTerminalCommandTool::new(self.workspace.clone())),
            Arc::new(ReadFilesTool::new(self.workspace.clone())),
            Arc::new(WriteFileTool::new(self.workspace.clone())),
            Arc::new(StrReplaceTool::new(self.workspace.clone())),
            Arc::new(CodeSearchTool::new(self.workspace.clone())),
        ]
    }
}
