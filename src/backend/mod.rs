pub mod local;
pub mod pool;
pub mod remote;

use crate::config::{BackendConfig, BackendKind};
use crate::errors::FsResult;
use crate::workspace::Workspace;
use std::collections::HashMap;
use std::sync::Arc;

pub use local::LocalBackend;
pub use remote::RemoteBackend;

/// Name used when the caller does not ask for a specific workspace.
pub const DEFAULT_WORKSPACE: &str = "default";

/// An execution substrate owning all workspaces of a single user.
#[derive(Debug)]
pub enum Backend {
    Local(LocalBackend),
    Remote(RemoteBackend),
}

impl Backend {
    pub fn new(config: BackendConfig) -> FsResult<Self> {
        match config {
            BackendConfig::Local(local) => Ok(Backend::Local(LocalBackend::new(local)?)),
            BackendConfig::Remote(remote) => Ok(Backend::Remote(RemoteBackend::new(remote)?)),
        }
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            Backend::Local(_) => BackendKind::Local,
            Backend::Remote(_) => BackendKind::Remote,
        }
    }

    pub fn user_id(&self) -> &str {
        match self {
            Backend::Local(backend) => backend.user_id(),
            Backend::Remote(backend) => backend.user_id(),
        }
    }

    pub fn connected(&self) -> bool {
        match self {
            Backend::Local(backend) => backend.connected(),
            Backend::Remote(backend) => backend.connected(),
        }
    }

    /// Get or lazily create a workspace. Handles are cached per
    /// `(name, env fingerprint)` and shared across callers.
    pub async fn workspace(
        &self,
        name: &str,
        env: Option<HashMap<String, String>>,
    ) -> FsResult<Arc<Workspace>> {
        match self {
            Backend::Local(backend) => backend.workspace(name, env).await,
            Backend::Remote(backend) => backend.workspace(name, env).await,
        }
    }

    /// Names of this user's workspaces present on disk.
    pub async fn list_workspaces(&self) -> FsResult<Vec<String>> {
        match self {
            Backend::Local(backend) => backend.list_workspaces().await,
            Backend::Remote(backend) => backend.list_workspaces().await,
        }
    }

    /// Drop cached workspaces and close any transport. Safe to call
    /// repeatedly.
    pub fn destroy(&self) {
        match self {
            Backend::Local(backend) => backend.destroy(),
            Backend::Remote(backend) => backend.destroy(),
        }
    }
}
