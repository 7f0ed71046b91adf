use std::path::{Path, PathBuf};

/// Completion marker for a step. A step is done when its target exists.
pub trait Target: Send + Sync {
    /// Presence check only; never reads contents or modifies anything.
    fn exists(&self) -> bool;

    fn path(&self) -> &Path;
}

/// A file or directory on the local filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalTarget {
    path: PathBuf,
}

impl LocalTarget {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Target for LocalTarget {
    fn exists(&self) -> bool {
        self.path.exists()
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn exists_tracks_presence_of_files_and_directories() {
        let dir = tempdir().unwrap();
        let file = LocalTarget::new(dir.path().join("done.txt"));
        let folder = LocalTarget::new(dir.path().join("out"));
        assert!(!file.exists());
        assert!(!folder.exists());

        std::fs::write(file.path(), "").unwrap();
        std::fs::create_dir(folder.path()).unwrap();
        assert!(file.exists());
        assert!(folder.exists());
    }
}
