use crate::backend::{Backend, DEFAULT_WORKSPACE, pool};
use crate::config::BackendConfig;
use crate::errors::FsResult;
use crate::workspace::Workspace;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// User-facing handle over a backend: the only construct SDK adapters
/// consume. All file and command I/O happens through [`Workspace`] handles
/// obtained from it.
#[derive(Debug)]
pub struct FileSystem {
    backend: Arc<Backend>,
    config: BackendConfig,
    pooled: bool,
    released: AtomicBool,
}

impl FileSystem {
    /// Create a filesystem owning a fresh backend.
    pub fn new(config: BackendConfig) -> FsResult<Self> {
        let backend = Arc::new(Backend::new(config.clone())?);
        Ok(Self {
            backend,
            config,
            pooled: false,
            released: AtomicBool::new(false),
        })
    }

    /// Create a filesystem whose backend is shared through the process-wide
    /// pool. The backend is released (and destroyed on last release) when
    /// this handle is destroyed or dropped.
    pub fn pooled(config: BackendConfig) -> FsResult<Self> {
        let backend = pool::acquire(&config)?;
        Ok(Self {
            backend,
            config,
            pooled: true,
            released: AtomicBool::new(false),
        })
    }

    /// Local filesystem with default settings for `user_id`.
    pub fn local(user_id: impl Into<String>) -> FsResult<Self> {
        Self::new(BackendConfig::local(user_id))
    }

    pub fn user_id(&self) -> &str {
        self.config.user_id()
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    pub fn backend(&self) -> &Arc<Backend> {
        &self.backend
    }

    /// The default workspace for this user.
    pub async fn workspace(&self) -> FsResult<Arc<Workspace>> {
        self.backend.workspace(DEFAULT_WORKSPACE, None).await
    }

    /// A named workspace for this user, created on first use.
    pub async fn workspace_named(&self, name: &str) -> FsResult<Arc<Workspace>> {
        self.backend.workspace(name, None).await
    }

    /// A named workspace with a custom environment overlay for its commands.
    pub async fn workspace_with_env(
        &self,
        name: &str,
        env: HashMap<String, String>,
    ) -> FsResult<Arc<Workspace>> {
        self.backend.workspace(name, Some(env)).await
    }

    pub async fn list_workspaces(&self) -> FsResult<Vec<String>> {
        self.backend.list_workspaces().await
    }

    /// Tear down this handle's claim on the backend. Owned backends are
    /// destroyed; pooled backends are released. Idempotent.
    pub fn destroy(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }
        if self.pooled {
            pool::release(&self.config.pool_key());
        } else {
            self.backend.destroy();
        }
    }
}

impl Drop for FileSystem {
    fn drop(&mut self) {
        self.destroy();
    }
}
