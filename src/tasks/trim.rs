use super::{DatasetParams, ExtractAndProcessFiles};
use crate::diagnostics::Diagnostic;
use crate::error::{PipelineError, Result};
use crate::paths;
use crate::step::{Step, StepContext};
use crate::table::Table;
use crate::target::{LocalTarget, Target};
use crate::trim::{trim_columns, PROBE_COLUMNS_TO_REMOVE};
use async_trait::async_trait;
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

pub const PROBES_SECTION: &str = "Probes";
pub const PROBES_SUFFIX: &str = "_Probes.tsv";
pub const TRIMMED_PROBES_SUFFIX: &str = "_trimmed_Probes.tsv";
pub const SENTINEL_FILE: &str = "Probes_files.tsv";

pub struct TrimProbesTable {
    params: DatasetParams,
}

impl TrimProbesTable {
    pub fn new(params: DatasetParams) -> Self {
        Self { params }
    }

    fn sentinel_path(&self) -> PathBuf {
        self.params.config.probes_dir.join(SENTINEL_FILE)
    }
}

#[async_trait]
impl Step for TrimProbesTable {
    fn name(&self) -> &str {
        "trim_probes"
    }

    fn id(&self) -> String {
        self.params.step_id(self.name())
    }

    fn requires(&self) -> Vec<Arc<dyn Step>> {
        vec![Arc::new(ExtractAndProcessFiles::new(self.params.clone()))]
    }

    fn output(&self) -> Box<dyn Target> {
        Box::new(LocalTarget::new(self.sentinel_path()))
    }

    async fn run(&self, ctx: &StepContext) -> Result<()> {
        let config = &self.params.config;
        let processed = ctx
            .input()
            .cloned()
            .unwrap_or_else(|| config.processed_data_dir.clone());

        if !processed.is_dir() {
            return Err(PipelineError::missing(&processed, "processed data directory"));
        }
        let probes_files = find_probes_files(&processed, &config.probes_dir)?;
        if probes_files.is_empty() {
            return Err(PipelineError::missing(
                &processed,
                format!("Probes tables (*{PROBES_SUFFIX})"),
            ));
        }

        fs::create_dir_all(&config.probes_dir)
            .map_err(|e| PipelineError::fs(&config.probes_dir, e))?;

        let mut written = Vec::with_capacity(probes_files.len());
        for source in probes_files {
            let table = Table::read_headered_tsv(&source, PROBES_SECTION)?;
            let trimmed = trim_columns(&table, PROBES_SECTION, &PROBE_COLUMNS_TO_REMOVE)?;
            let dest = config.probes_dir.join(trimmed_name(&source));
            trimmed.table.write_tsv(&dest)?;
            ctx.sink.emit(Diagnostic::TableTrimmed {
                source,
                dest: dest.clone(),
                removed: trimmed.removed,
            });
            written.push(dest);
        }

        // The sentinel goes last; its presence means every table above is complete.
        let mut sentinel = format!(
            "Trimmed Probes processing completed.\ncompleted_at\t{}\n",
            Utc::now().to_rfc3339()
        );
        for dest in &written {
            sentinel.push_str(&format!("trimmed\t{}\n", dest.display()));
        }
        let path = self.sentinel_path();
        fs::write(&path, sentinel).map_err(|e| PipelineError::fs(&path, e))
    }
}

/// Every `*_Probes.tsv` under `root`, sorted, skipping anything inside
/// `exclude` so earlier trimmed outputs are not picked up again. An entry
/// that cannot be read fails the whole discovery.
pub fn find_probes_files(root: &Path, exclude: &Path) -> Result<Vec<PathBuf>> {
    let resolved_root = paths::resolve(root);
    let exclude = paths::resolve(exclude);

    let mut found = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            PipelineError::fs(path, e.into())
        })?;
        if !entry.file_type().is_file() || !is_probes_table(entry.path()) {
            continue;
        }
        if paths::rebase(entry.path(), root, &resolved_root).starts_with(&exclude) {
            continue;
        }
        found.push(entry.into_path());
    }
    found.sort();
    Ok(found)
}

fn is_probes_table(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.ends_with(PROBES_SUFFIX))
        .unwrap_or(false)
}

/// `GSM1_sample_Probes.tsv` -> `GSM1_sample_trimmed_Probes.tsv`
fn trimmed_name(source: &Path) -> String {
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.strip_suffix(PROBES_SUFFIX) {
        Some(stem) => format!("{stem}{TRIMMED_PROBES_SUFFIX}"),
        None => name,
    }
}
