use crate::errors::{FsError, FsResult};
use std::path::{Component, Path, PathBuf};

/// Normalize a path lexically (without touching the filesystem).
/// Resolves `.` and `..` components so that `/workspace/../etc/passwd`
/// normalizes to `/etc/passwd` rather than passing a prefix check.
pub fn lexical_normalize(path: &Path) -> PathBuf {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                // Pop the last normal component (but never pop past root)
                if matches!(components.last(), Some(Component::Normal(_))) {
                    components.pop();
                }
            }
            Component::CurDir => {}
            other => components.push(other),
        }
    }
    components.iter().collect()
}

/// Resolve a caller-supplied relative path against a workspace directory.
///
/// Rejects empty and absolute input, any `..` component, and any lexical
/// result that leaves the workspace. Existing ancestors of the target are
/// then walked for symlinks whose targets resolve outside the workspace;
/// non-existent trailing segments are tolerated because the path may be
/// about to be created.
pub fn resolve_path(workspace: &Path, relative: &str) -> FsResult<PathBuf> {
    if relative.trim().is_empty() {
        return Err(FsError::EmptyPath);
    }

    let candidate = Path::new(relative);
    if candidate.is_absolute() {
        return Err(FsError::AbsolutePathRejected(relative.to_string()));
    }

    if relative.contains("../")
        || relative.contains("..\\")
        || candidate
            .components()
            .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(FsError::PathEscape(relative.to_string()));
    }

    let resolved = lexical_normalize(&workspace.join(candidate));
    match resolved.strip_prefix(workspace) {
        Ok(rest) if !rest.as_os_str().is_empty() => {}
        // Resolving to the workspace root itself (e.g. ".") is allowed.
        Ok(_) => return Ok(resolved),
        Err(_) => return Err(FsError::PathEscape(relative.to_string())),
    }

    check_symlink_containment(workspace, &resolved)?;

    Ok(resolved)
}

/// Walk each existing component of `target` below `workspace`; any symlink
/// among them must resolve back inside the workspace.
fn check_symlink_containment(workspace: &Path, target: &Path) -> FsResult<()> {
    let Ok(rest) = target.strip_prefix(workspace) else {
        return Err(FsError::PathEscape(target.display().to_string()));
    };

    // Compare resolved symlink targets against the fully resolved workspace
    // so that a workspace under e.g. /var → /private/var still contains them.
    let canonical_workspace = std::fs::canonicalize(workspace)
        .unwrap_or_else(|_| lexical_normalize(workspace));

    let mut current = workspace.to_path_buf();
    for component in rest.components() {
        current.push(component);

        let Ok(metadata) = std::fs::symlink_metadata(&current) else {
            // Remainder of the path does not exist yet; nothing to follow.
            break;
        };

        if metadata.file_type().is_symlink() {
            let resolved = match std::fs::canonicalize(&current) {
                Ok(resolved) => resolved,
                // Dangling symlink: resolve its target lexically instead.
                Err(_) => {
                    let link = std::fs::read_link(&current).map_err(|e| {
                        FsError::ReadFailed(format!(
                            "cannot read symlink {}: {}",
                            current.display(),
                            e
                        ))
                    })?;
                    let absolute = if link.is_absolute() {
                        link
                    } else {
                        current.parent().unwrap_or(workspace).join(link)
                    };
                    lexical_normalize(&absolute)
                }
            };
            if !resolved.starts_with(&canonical_workspace) && !resolved.starts_with(workspace) {
                return Err(FsError::SymlinkEscape(current.display().to_string()));
            }
        }
    }

    Ok(())
}
