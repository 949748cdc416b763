pub mod env;
pub mod local;

use crate::errors::FsResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;

pub use local::LocalExecutor;

/// How command output should be returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputEncoding {
    /// UTF-8 decoded, trailing whitespace trimmed, truncation applied.
    Text,
    /// Raw stdout bytes, untouched.
    Bytes,
}

/// Output of a completed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecOutput {
    Text(String),
    Bytes(Vec<u8>),
}

impl ExecOutput {
    /// The textual form of this output; bytes are decoded lossily.
    pub fn into_text(self) -> String {
        match self {
            ExecOutput::Text(text) => text,
            ExecOutput::Bytes(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            ExecOutput::Text(text) => text.into_bytes(),
            ExecOutput::Bytes(bytes) => bytes,
        }
    }
}

/// The seam between workspaces and an execution substrate. The local
/// executor spawns child shells; a remote executor would translate the same
/// calls to its wire protocol after applying the identical safety checks.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run `command` with the given working directory, confined to
    /// `workspace`. `cwd` is `workspace` itself or a directory inside it.
    async fn exec(
        &self,
        workspace: &Path,
        cwd: &Path,
        command: &str,
        encoding: OutputEncoding,
        custom_env: Option<&HashMap<String, String>>,
    ) -> FsResult<ExecOutput>;
}
