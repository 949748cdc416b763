use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::warn;

/// Name of the optional per-process configuration file, looked up in the
/// process's current working directory.
pub const CONFIG_FILE_NAME: &str = ".constellationfs.json";

/// Process-wide library configuration. Unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LibraryConfig {
    #[serde(default, rename = "workspaceRoot")]
    pub workspace_root: Option<PathBuf>,
}

/// Default root under which all per-user workspaces live.
pub fn default_workspace_root() -> PathBuf {
    std::env::temp_dir().join("constellation-fs").join("users")
}

/// Load the library configuration from the given file. Missing files are
/// normal; unreadable or malformed files fall back to defaults with a warning.
pub fn load_library_config(path: &Path) -> LibraryConfig {
    if !path.exists() {
        return LibraryConfig::default();
    }
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("failed to read {}: {}, using defaults", path.display(), e);
            return LibraryConfig::default();
        }
    };
    match serde_json::from_str(&content) {
        Ok(config) => config,
        Err(e) => {
            warn!("failed to parse {}: {}, using defaults", path.display(), e);
            LibraryConfig::default()
        }
    }
}

static WORKSPACE_ROOT: LazyLock<PathBuf> = LazyLock::new(|| {
    let config = load_library_config(Path::new(CONFIG_FILE_NAME));
    config.workspace_root.unwrap_or_else(default_workspace_root)
});

/// The process-wide workspace root. Resolved from `.constellationfs.json` on
/// first access and immutable afterwards.
pub fn workspace_root() -> &'static Path {
    &WORKSPACE_ROOT
}
