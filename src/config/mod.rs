pub mod loader;
pub mod schema;

pub use loader::{default_workspace_root, workspace_root};
pub use schema::{
    BackendConfig, BackendKind, DangerousHook, LocalBackendConfig, RemoteAuth,
    RemoteBackendConfig, ShellKind, validate_user_id,
};
