//! Path comparison that is not fooled by `./`, `..` or symlinked parents.

use std::path::{Component, Path, PathBuf};

/// Absolute form of `path` for containment checks.
///
/// The longest existing ancestor is canonicalized and the rest is appended,
/// so the result is stable before and after the directory is created.
pub fn resolve(path: &Path) -> PathBuf {
    let absolute = normalize(path);
    for ancestor in absolute.ancestors() {
        if let Ok(canonical) = ancestor.canonicalize() {
            return match absolute.strip_prefix(ancestor) {
                Ok(rest) if !rest.as_os_str().is_empty() => canonical.join(rest),
                _ => canonical,
            };
        }
    }
    absolute
}

/// `path` lies below `ancestor` and is not `ancestor` itself.
pub fn is_strictly_under(path: &Path, ancestor: &Path) -> bool {
    path != ancestor && path.starts_with(ancestor)
}

/// Resolved location of `entry`, a path produced by walking `root`.
pub fn rebase(entry: &Path, root: &Path, resolved_root: &Path) -> PathBuf {
    match entry.strip_prefix(root) {
        Ok(rest) if !rest.as_os_str().is_empty() => resolved_root.join(rest),
        Ok(_) => resolved_root.to_path_buf(),
        Err(_) => resolve(entry),
    }
}

fn normalize(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn dotted_and_plain_spellings_agree() {
        let dir = tempdir().unwrap();
        let processed = dir.path().join("processed_data");
        std::fs::create_dir_all(processed.join("GSM1.txt")).unwrap();

        let plain = resolve(&processed.join("probes"));
        let dotted = resolve(&processed.join("GSM1.txt/../probes"));
        assert_eq!(plain, dotted);
        assert!(is_strictly_under(&dotted, &resolve(&processed)));
        assert!(!is_strictly_under(&resolve(&processed), &resolve(&processed)));
    }

    #[test]
    fn relative_paths_resolve_against_working_directory() {
        let cwd = std::env::current_dir().unwrap().canonicalize().unwrap();
        assert_eq!(resolve(Path::new("./nowhere/probes")), cwd.join("nowhere/probes"));
        assert_eq!(resolve(Path::new("nowhere/probes")), cwd.join("nowhere/probes"));
    }
}
