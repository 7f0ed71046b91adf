//! Structured diagnostic events emitted by the pipeline core.
//!
//! Core code never logs on its own; it reports what happened to a
//! caller-supplied [`DiagnosticSink`]. The binary forwards everything to
//! `tracing` through [`TracingSink`], tests collect into a [`MemorySink`].

use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    RunStarted { run_id: Uuid, root: String, steps: usize },
    RunFinished { run_id: Uuid, executed: usize, skipped: usize },
    StepSkipped { step: String, target: PathBuf },
    StepStarted { step: String },
    StepFinished { step: String, elapsed_ms: u64 },
    StepFailed { step: String, error: String },
    ArchiveDownloaded { url: String, path: PathBuf },
    MemberExtracted { member: String, path: PathBuf },
    SectionWritten { section: String, rows: usize, path: PathBuf },
    TableTrimmed { source: PathBuf, dest: PathBuf, removed: Vec<String> },
    FileRemoved { path: PathBuf },
    FileRemoveFailed { path: PathBuf, error: String },
    DirRemoved { path: PathBuf },
    DirKept { path: PathBuf, error: String },
    ScanFailed { path: PathBuf, error: String },
    NothingToClean { root: PathBuf },
}

impl Diagnostic {
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Diagnostic::DirKept { .. } | Diagnostic::NothingToClean { .. }
        )
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Diagnostic::StepFailed { .. }
                | Diagnostic::FileRemoveFailed { .. }
                | Diagnostic::ScanFailed { .. }
        )
    }
}

/// Receiver for pipeline diagnostics.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, event: Diagnostic);
}

/// Forwards diagnostics to the global `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, event: Diagnostic) {
        match event {
            Diagnostic::RunStarted { run_id, root, steps } => {
                info!(%run_id, %root, steps, "🚀 Starting pipeline run");
            }
            Diagnostic::RunFinished { run_id, executed, skipped } => {
                info!(%run_id, executed, skipped, "🎉 Pipeline run finished");
            }
            Diagnostic::StepSkipped { step, target } => {
                info!(%step, target = %target.display(), "⏭️ Output already present, skipping step");
            }
            Diagnostic::StepStarted { step } => {
                info!(%step, "🔄 Running step");
            }
            Diagnostic::StepFinished { step, elapsed_ms } => {
                info!(%step, elapsed_ms, "✅ Step completed");
            }
            Diagnostic::StepFailed { step, error } => {
                error!(%step, %error, "❌ Step failed");
            }
            Diagnostic::ArchiveDownloaded { url, path } => {
                info!(%url, path = %path.display(), "📡 Archive downloaded");
            }
            Diagnostic::MemberExtracted { member, path } => {
                info!(%member, path = %path.display(), "📦 Member extracted");
            }
            Diagnostic::SectionWritten { section, rows, path } => {
                info!(%section, rows, path = %path.display(), "💾 Section table saved");
            }
            Diagnostic::TableTrimmed { source, dest, removed } => {
                info!(
                    source = %source.display(),
                    dest = %dest.display(),
                    removed = ?removed,
                    "✂️ Probes table trimmed"
                );
            }
            Diagnostic::FileRemoved { path } => {
                info!(path = %path.display(), "File deleted");
            }
            Diagnostic::FileRemoveFailed { path, error } => {
                error!(path = %path.display(), %error, "Error deleting file");
            }
            Diagnostic::DirRemoved { path } => {
                info!(path = %path.display(), "Directory deleted");
            }
            Diagnostic::DirKept { path, error } => {
                warn!(path = %path.display(), %error, "Directory not empty or could not be deleted");
            }
            Diagnostic::ScanFailed { path, error } => {
                error!(path = %path.display(), %error, "Could not read entry during cleanup");
            }
            Diagnostic::NothingToClean { root } => {
                warn!(root = %root.display(), "No original files found to delete");
            }
        }
    }
}

/// Collects diagnostics in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<Diagnostic>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Diagnostic> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn warnings(&self) -> usize {
        self.events().iter().filter(|e| e.is_warning()).count()
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&self, event: Diagnostic) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
