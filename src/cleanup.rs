//! Best-effort removal of intermediate artifacts.
//!
//! Nothing in here returns an error: every failure becomes a diagnostic and a
//! count in the [`CleanupReport`].

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::paths;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Filesystem removal operations, split out so tests can refuse a delete.
pub trait Remover: Send + Sync {
    fn remove_file(&self, path: &Path) -> io::Result<()>;
    fn remove_dir(&self, path: &Path) -> io::Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FsRemover;

impl Remover for FsRemover {
    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir(path)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub files_removed: usize,
    pub files_failed: usize,
    pub dirs_removed: usize,
    pub dirs_kept: usize,
    pub scan_failures: usize,
    pub root_removed: bool,
}

pub struct Cleanup<'a> {
    root: PathBuf,
    preserve: Vec<PathBuf>,
    remover: &'a dyn Remover,
    sink: &'a dyn DiagnosticSink,
}

impl<'a> Cleanup<'a> {
    pub fn new(root: impl Into<PathBuf>, sink: &'a dyn DiagnosticSink) -> Self {
        Self {
            root: root.into(),
            preserve: Vec::new(),
            remover: &FsRemover,
            sink,
        }
    }

    /// Never touch `path` or anything below it. Only honoured when `path`
    /// lies inside the cleanup root.
    pub fn preserve(mut self, path: impl Into<PathBuf>) -> Self {
        self.preserve.push(path.into());
        self
    }

    pub fn with_remover(mut self, remover: &'a dyn Remover) -> Self {
        self.remover = remover;
        self
    }

    pub fn run(&self) -> CleanupReport {
        let mut report = CleanupReport::default();
        if !self.root.exists() {
            self.sink.emit(Diagnostic::NothingToClean {
                root: self.root.clone(),
            });
            return report;
        }

        // Preserved paths only count when strictly inside the root
        let resolved_root = paths::resolve(&self.root);
        let preserved: Vec<PathBuf> = self
            .preserve
            .iter()
            .map(|p| paths::resolve(p))
            .filter(|p| paths::is_strictly_under(p, &resolved_root))
            .collect();

        let mut files = Vec::new();
        let mut dirs = Vec::new();
        // contents_first gives children before their parent directory
        for entry in WalkDir::new(&self.root).min_depth(1).contents_first(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    self.record_scan_failure(err, &mut report);
                    continue;
                }
            };
            let resolved = paths::rebase(entry.path(), &self.root, &resolved_root);
            if preserved.iter().any(|keep| resolved.starts_with(keep)) {
                continue;
            }
            if entry.file_type().is_dir() {
                dirs.push(entry.into_path());
            } else {
                files.push(entry.into_path());
            }
        }

        if files.is_empty() && dirs.is_empty() && report.scan_failures == 0 {
            self.sink.emit(Diagnostic::NothingToClean {
                root: self.root.clone(),
            });
        }

        for path in files {
            match self.remover.remove_file(&path) {
                Ok(()) => {
                    report.files_removed += 1;
                    self.sink.emit(Diagnostic::FileRemoved { path });
                }
                Err(e) => {
                    report.files_failed += 1;
                    self.sink.emit(Diagnostic::FileRemoveFailed {
                        path,
                        error: e.to_string(),
                    });
                }
            }
        }

        for path in dirs {
            if self.try_remove_dir(&path) {
                report.dirs_removed += 1;
            } else {
                report.dirs_kept += 1;
            }
        }

        report.root_removed = self.try_remove_dir(&self.root);
        report
    }

    fn record_scan_failure(&self, err: walkdir::Error, report: &mut CleanupReport) {
        report.scan_failures += 1;
        self.sink.emit(Diagnostic::ScanFailed {
            path: err
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| self.root.clone()),
            error: err.to_string(),
        });
    }

    fn try_remove_dir(&self, path: &Path) -> bool {
        match self.remover.remove_dir(path) {
            Ok(()) => {
                self.sink.emit(Diagnostic::DirRemoved {
                    path: path.to_path_buf(),
                });
                true
            }
            Err(e) => {
                self.sink.emit(Diagnostic::DirKept {
                    path: path.to_path_buf(),
                    error: e.to_string(),
                });
                false
            }
        }
    }
}
