use crate::errors::{FsError, FsResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Callback invoked when a dangerous command is intercepted instead of raising.
/// Receives the offending command string.
pub type DangerousHook = Arc<dyn Fn(&str) + Send + Sync>;

/// Which shell the local backend spawns for `exec`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShellKind {
    /// Probe for bash, fall back to sh.
    #[default]
    Auto,
    Sh,
    Bash,
}

/// The two execution substrates a filesystem can be backed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Local,
    Remote,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Local => "local",
            BackendKind::Remote => "remote",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend configuration, tagged by `type` on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    Local(LocalBackendConfig),
    Remote(RemoteBackendConfig),
}

impl BackendConfig {
    /// A local backend with defaults for everything but the user id.
    pub fn local(user_id: impl Into<String>) -> Self {
        BackendConfig::Local(LocalBackendConfig::new(user_id))
    }

    /// Parse a backend config from JSON. A missing `type` field means a
    /// local backend with defaults, so partial configs like
    /// `{"userId": "u1"}` are accepted.
    pub fn from_json(value: Value) -> FsResult<Self> {
        let value = match value {
            Value::Object(mut map) => {
                if !map.contains_key("type") {
                    map.insert("type".to_string(), Value::String("local".to_string()));
                }
                Value::Object(map)
            }
            other => other,
        };
        let config: BackendConfig = serde_json::from_value(value)
            .map_err(|e| FsError::InvalidConfiguration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            BackendConfig::Local(_) => BackendKind::Local,
            BackendConfig::Remote(_) => BackendKind::Remote,
        }
    }

    pub fn user_id(&self) -> &str {
        match self {
            BackendConfig::Local(c) => &c.user_id,
            BackendConfig::Remote(c) => &c.user_id,
        }
    }

    pub fn prevent_dangerous(&self) -> bool {
        match self {
            BackendConfig::Local(c) => c.prevent_dangerous,
            BackendConfig::Remote(c) => c.prevent_dangerous,
        }
    }

    pub fn max_output_length(&self) -> Option<usize> {
        match self {
            BackendConfig::Local(c) => c.max_output_length,
            BackendConfig::Remote(c) => c.max_output_length,
        }
    }

    /// Pool key: `userId:kind` for local, `userId:kind:host:port` for remote.
    /// User id first so one user's backends never collide with another's.
    pub fn pool_key(&self) -> String {
        match self {
            BackendConfig::Local(c) => format!("{}:local", c.user_id),
            BackendConfig::Remote(c) => {
                format!("{}:remote:{}:{}", c.user_id, c.host, c.port())
            }
        }
    }

    pub fn validate(&self) -> FsResult<()> {
        match self {
            BackendConfig::Local(c) => c.validate(),
            BackendConfig::Remote(c) => c.validate(),
        }
    }
}

/// Configuration for the local (in-process) backend.
#[derive(Clone, Serialize, Deserialize)]
pub struct LocalBackendConfig {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(default)]
    pub shell: ShellKind,
    #[serde(default, rename = "validateUtils")]
    pub validate_utils: bool,
    #[serde(default = "default_true", rename = "preventDangerous")]
    pub prevent_dangerous: bool,
    #[serde(default, rename = "maxOutputLength")]
    pub max_output_length: Option<usize>,
    /// Not part of the wire format; attached programmatically.
    #[serde(skip)]
    pub on_dangerous: Option<DangerousHook>,
}

impl std::fmt::Debug for LocalBackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalBackendConfig")
            .field("user_id", &self.user_id)
            .field("shell", &self.shell)
            .field("validate_utils", &self.validate_utils)
            .field("prevent_dangerous", &self.prevent_dangerous)
            .field("max_output_length", &self.max_output_length)
            .field("on_dangerous", &self.on_dangerous.as_ref().map(|_| "<hook>"))
            .finish()
    }
}

impl LocalBackendConfig {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            shell: ShellKind::default(),
            validate_utils: false,
            prevent_dangerous: true,
            max_output_length: None,
            on_dangerous: None,
        }
    }

    pub fn validate(&self) -> FsResult<()> {
        validate_user_id(&self.user_id)
    }
}

/// Authentication material for a remote backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "credentials", rename_all = "lowercase")]
pub enum RemoteAuth {
    Key {
        username: String,
        #[serde(rename = "privateKeyPath")]
        private_key_path: String,
        #[serde(default)]
        passphrase: Option<String>,
    },
    Password {
        username: String,
        password: String,
    },
}

impl RemoteAuth {
    pub fn username(&self) -> &str {
        match self {
            RemoteAuth::Key { username, .. } | RemoteAuth::Password { username, .. } => username,
        }
    }
}

/// Configuration for a remote backend reached over SSH/SFTP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteBackendConfig {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    pub auth: RemoteAuth,
    #[serde(default, rename = "operationTimeoutMs")]
    pub operation_timeout_ms: Option<u64>,
    #[serde(default, rename = "keepaliveIntervalMs")]
    pub keepalive_interval_ms: Option<u64>,
    #[serde(default, rename = "keepaliveCountMax")]
    pub keepalive_count_max: Option<u32>,
    #[serde(default = "default_true", rename = "preventDangerous")]
    pub prevent_dangerous: bool,
    #[serde(default, rename = "maxOutputLength")]
    pub max_output_length: Option<usize>,
}

impl RemoteBackendConfig {
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(22)
    }

    pub fn validate(&self) -> FsResult<()> {
        validate_user_id(&self.user_id)?;
        if self.host.trim().is_empty() {
            return Err(FsError::InvalidConfiguration(
                "remote backend requires a host".to_string(),
            ));
        }
        match &self.auth {
            RemoteAuth::Key {
                username,
                private_key_path,
                ..
            } => {
                if username.is_empty() || private_key_path.is_empty() {
                    return Err(FsError::InvalidConfiguration(
                        "key auth requires username and privateKeyPath".to_string(),
                    ));
                }
            }
            RemoteAuth::Password { username, password } => {
                if username.is_empty() || password.is_empty() {
                    return Err(FsError::InvalidConfiguration(
                        "password auth requires username and password".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

/// Validate a user id for use as an on-disk directory name.
///
/// Accepts `[A-Za-z0-9._-]+`; rejects empty ids, `..`, path separators, and
/// control characters so a user id can never step outside its own directory.
pub fn validate_user_id(user_id: &str) -> FsResult<()> {
    if user_id.is_empty() {
        return Err(FsError::InvalidConfiguration(
            "userId is required and cannot be empty".to_string(),
        ));
    }
    if user_id.contains("..") {
        return Err(FsError::InvalidConfiguration(
            "userId cannot contain path traversal".to_string(),
        ));
    }
    if user_id.contains('/') || user_id.contains('\\') {
        return Err(FsError::InvalidConfiguration(
            "userId cannot contain path separators".to_string(),
        ));
    }
    if !user_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(FsError::InvalidConfiguration(format!(
            "userId contains invalid characters: {}",
            user_id
        )));
    }
    Ok(())
}
