use crate::config::RemoteBackendConfig;
use crate::errors::{FsError, FsResult};
use crate::workspace::Workspace;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Remote backend reached over SSH/SFTP.
///
/// Configuration (host, auth material, keep-alive and timeout settings) is
/// validated eagerly so callers learn about bad credentials paths before any
/// connection attempt. The transport itself is not wired into this build:
/// every operation that would touch the remote host fails with
/// `BACKEND_NOT_IMPLEMENTED`. When a transport lands it must apply the same
/// command classifier before transmitting and the same path policy before
/// using a path — the remote side is trusted but not adversary-resistant.
#[derive(Debug)]
pub struct RemoteBackend {
    config: RemoteBackendConfig,
    connected: AtomicBool,
}

impl RemoteBackend {
    pub fn new(config: RemoteBackendConfig) -> FsResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            connected: AtomicBool::new(false),
        })
    }

    pub fn user_id(&self) -> &str {
        &self.config.user_id
    }

    pub fn config(&self) -> &RemoteBackendConfig {
        &self.config
    }

    pub fn connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn not_implemented(&self) -> FsError {
        FsError::BackendNotImplemented(format!(
            "remote transport to {}:{} is not available in this build",
            self.config.host,
            self.config.port()
        ))
    }

    pub async fn workspace(
        &self,
        _name: &str,
        _env: Option<HashMap<String, String>>,
    ) -> FsResult<Arc<Workspace>> {
        Err(self.not_implemented())
    }

    pub async fn list_workspaces(&self) -> FsResult<Vec<String>> {
        Err(self.not_implemented())
    }

    pub fn destroy(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }
}
