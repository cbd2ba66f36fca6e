use crate::error::StorageError;
use std::path::{Component, Path, PathBuf};

/// Collapse `.` / `..` lexically while ensuring the path never escapes its root.
///
/// Allows `..` as long as it doesn't go "above" the empty relative base.
pub(crate) fn normalize_relative(path: &Path) -> Result<PathBuf, StorageError> {
    let mut out = PathBuf::new();

    for c in path.components() {
        match c {
            Component::CurDir => {},
            Component::Normal(seg) => out.push(seg),
            Component::ParentDir => {
                if !out.pop() {
                    return Err(StorageError::PathTraversalAttempt {
                        message: path.display().to_string().into(),
                        context: Some("Path attempted to escape the virtual root via '..'".into()),
                    });
                }
            },
            Component::RootDir | Component::Prefix(_) => {
                return Err(StorageError::PathTraversalAttempt {
                    message: path.display().to_string().into(),
                    context: Some("Absolute paths are not allowed below a virtual root".into()),
                });
            },
        }
    }

    Ok(out)
}

/// Normalizes a virtual path (`a/./b/../c`) into the `/`-joined key used by pack indexes.
pub(crate) fn pack_key(path: &str) -> Result<String, StorageError> {
    let rel = normalize_relative(Path::new(path.trim_start_matches('/')))?;
    let key = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(seg) => seg.to_str(),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/");
    Ok(key)
}

/// Joins a virtual path below `root` and ensures it doesn't escape through symlinks.
pub(crate) fn resolve_under(root: &Path, path: &str) -> Result<PathBuf, StorageError> {
    let safe_rel = normalize_relative(Path::new(path.trim_start_matches('/')))?;
    let joined = root.join(safe_rel);

    let Ok(root) = root.canonicalize() else {
        // The root itself is gone; reads will report the missing file.
        return Ok(joined);
    };

    match joined.canonicalize() {
        Ok(canonical) => validate_canonical(&root, canonical),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(joined),
        Err(e) => Err(StorageError::Io { source: e, context: None }),
    }
}

fn validate_canonical(root: &Path, canonical: PathBuf) -> Result<PathBuf, StorageError> {
    if canonical.starts_with(root) {
        Ok(canonical)
    } else {
        Err(StorageError::PathTraversalAttempt {
            message: canonical.display().to_string().into(),
            context: Some("Path resolved outside of the resource root".into()),
        })
    }
}
