use crate::errors::{FsError, FsResult};
use crate::exec::{CommandExecutor, ExecOutput, OutputEncoding};
use crate::safety::paths::resolve_path;
use filetime::FileTime;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    File,
    Directory,
    Symlink,
}

/// Metadata for an entry directly under the workspace root.
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub name: String,
    pub kind: FileKind,
    pub size: u64,
    pub modified: Option<SystemTime>,
}

/// An isolated directory `workspaceRoot/userId/name` plus the executor that
/// runs commands inside it. Every path is vetted by the path policy and
/// every command by the command policy before any I/O happens.
///
/// State is immutable after construction, so handles can be shared freely
/// across concurrent tasks.
pub struct Workspace {
    user_id: String,
    name: String,
    path: PathBuf,
    executor: Arc<dyn CommandExecutor>,
    custom_env: Option<HashMap<String, String>>,
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("user_id", &self.user_id)
            .field("name", &self.name)
            .field("path", &self.path)
            .field("custom_env", &self.custom_env)
            .finish()
    }
}

impl Workspace {
    pub(crate) fn new(
        user_id: String,
        name: String,
        path: PathBuf,
        executor: Arc<dyn CommandExecutor>,
        custom_env: Option<HashMap<String, String>>,
    ) -> Self {
        Self {
            user_id,
            name,
            path,
            executor,
            custom_env,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute path of the workspace directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn custom_env(&self) -> Option<&HashMap<String, String>> {
        self.custom_env.as_ref()
    }

    /// Resolve a caller-supplied relative path inside this workspace.
    pub fn resolve(&self, relative: &str) -> FsResult<PathBuf> {
        resolve_path(&self.path, relative)
    }

    /// Run a command in the workspace root, returning trimmed UTF-8 output.
    pub async fn exec(&self, command: &str) -> FsResult<String> {
        self.exec_in(None, command).await
    }

    /// Run a command with raw byte output.
    pub async fn exec_bytes(&self, command: &str) -> FsResult<Vec<u8>> {
        self.executor
            .exec(
                &self.path,
                &self.path,
                command,
                OutputEncoding::Bytes,
                self.custom_env.as_ref(),
            )
            .await
            .map(ExecOutput::into_bytes)
    }

    /// Run a command in a subdirectory of the workspace. The directory is
    /// vetted by the path policy; the command is classified as usual.
    pub async fn exec_in(&self, dir: Option<&str>, command: &str) -> FsResult<String> {
        let cwd = match dir {
            Some(dir) => self.resolve(dir)?,
            None => self.path.clone(),
        };
        self.executor
            .exec(
                &self.path,
                &cwd,
                command,
                OutputEncoding::Text,
                self.custom_env.as_ref(),
            )
            .await
            .map(ExecOutput::into_text)
    }

    /// Read a file as UTF-8.
    pub async fn read(&self, path: &str) -> FsResult<String> {
        let resolved = self.resolve(path)?;
        tokio::fs::read_to_string(&resolved)
            .await
            .map_err(|e| FsError::ReadFailed(format!("{}: {}", path, e)))
    }

    /// Overwrite a file with UTF-8 content, creating parent directories
    /// inside the workspace as needed.
    pub async fn write(&self, path: &str, content: &str) -> FsResult<()> {
        let resolved = self.resolve(path)?;
        if let Some(parent) = resolved.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| FsError::WriteFailed(format!("{}: {}", path, e)))?;
        }
        tokio::fs::write(&resolved, content)
            .await
            .map_err(|e| FsError::WriteFailed(format!("{}: {}", path, e)))
    }

    /// Create a directory. With `recursive`, existing directories are fine.
    pub async fn mkdir(&self, path: &str, recursive: bool) -> FsResult<()> {
        let resolved = self.resolve(path)?;
        let result = if recursive {
            tokio::fs::create_dir_all(&resolved).await
        } else {
            tokio::fs::create_dir(&resolved).await
        };
        result.map_err(|e| FsError::WriteFailed(format!("{}: {}", path, e)))
    }

    /// Create an empty file, or refresh the mtime of an existing one
    /// without touching its content.
    pub async fn touch(&self, path: &str) -> FsResult<()> {
        let resolved = self.resolve(path)?;
        if resolved.exists() {
            filetime::set_file_mtime(&resolved, FileTime::now())
                .map_err(|e| FsError::WriteFailed(format!("{}: {}", path, e)))
        } else {
            if let Some(parent) = resolved.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| FsError::WriteFailed(format!("{}: {}", path, e)))?;
            }
            tokio::fs::File::create(&resolved)
                .await
                .map(|_| ())
                .map_err(|e| FsError::WriteFailed(format!("{}: {}", path, e)))
        }
    }

    /// List entries directly under the workspace root, sorted by name.
    pub async fn list(&self) -> FsResult<Vec<FileInfo>> {
        let mut reader = tokio::fs::read_dir(&self.path)
            .await
            .map_err(|e| FsError::ReadFailed(format!("{}: {}", self.path.display(), e)))?;

        let mut entries = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| FsError::ReadFailed(e.to_string()))?
        {
            let name = entry.file_name().to_string_lossy().to_string();
            let Ok(metadata) = tokio::fs::symlink_metadata(entry.path()).await else {
                continue;
            };
            let kind = if metadata.file_type().is_symlink() {
                FileKind::Symlink
            } else if metadata.is_dir() {
                FileKind::Directory
            } else {
                FileKind::File
            };
            entries.push(FileInfo {
                name,
                kind,
                size: metadata.len(),
                modified: metadata.modified().ok(),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Whether the workspace directory exists on disk.
    pub async fn exists(&self) -> bool {
        tokio::fs::metadata(&self.path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    /// Recursively delete the workspace directory.
    pub async fn delete(&self) -> FsResult<()> {
        tokio::fs::remove_dir_all(&self.path)
            .await
            .map_err(|e| FsError::WriteFailed(format!("{}: {}", self.path.display(), e)))
    }
}
