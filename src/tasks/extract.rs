use super::{DatasetParams, DownloadDataset};
use crate::archive::{extract_members, ExtractedFile};
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::{PipelineError, Result};
use crate::parser::SectionParser;
use crate::step::{Step, StepContext};
use crate::target::{LocalTarget, Target};
use async_trait::async_trait;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Unpacks every `.txt.gz` member into its own directory under the processed
/// directory and splits it into one TSV per section.
///
/// Work happens in `<processed_data_dir>.partial`, which is renamed into
/// place only once every member has been handled. A failed run therefore
/// never leaves the target behind.
pub struct ExtractAndProcessFiles {
    params: DatasetParams,
}

impl ExtractAndProcessFiles {
    pub fn new(params: DatasetParams) -> Self {
        Self { params }
    }

    fn staging_dir(&self) -> PathBuf {
        let mut name = OsString::from(self.params.config.processed_data_dir.as_os_str());
        name.push(".partial");
        PathBuf::from(name)
    }
}

#[async_trait]
impl Step for ExtractAndProcessFiles {
    fn name(&self) -> &str {
        "extract_and_process"
    }

    fn id(&self) -> String {
        self.params.step_id(self.name())
    }

    fn requires(&self) -> Vec<Arc<dyn Step>> {
        vec![Arc::new(DownloadDataset::new(self.params.clone()))]
    }

    fn output(&self) -> Box<dyn Target> {
        Box::new(LocalTarget::new(&self.params.config.processed_data_dir))
    }

    async fn run(&self, ctx: &StepContext) -> Result<()> {
        let tar_path = ctx
            .input()
            .cloned()
            .unwrap_or_else(|| self.params.config.archive_path());
        let members = extract_members(&tar_path)?;

        let staging = self.staging_dir();
        match fs::remove_dir_all(&staging) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(PipelineError::fs(&staging, e)),
        }
        fs::create_dir_all(&staging).map_err(|e| PipelineError::fs(&staging, e))?;

        for member in &members {
            write_member(&staging, member, ctx.sink.as_ref())?;
        }

        let processed = &self.params.config.processed_data_dir;
        if let Some(parent) = processed.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| PipelineError::fs(parent, e))?;
        }
        fs::rename(&staging, processed).map_err(|e| PipelineError::fs(processed, e))?;
        Ok(())
    }
}

/// `<root>/<name>/<name>` holds the decompressed member; sections go next to
/// it as `<stem>_<section>.tsv`.
fn write_member(root: &Path, member: &ExtractedFile, sink: &dyn DiagnosticSink) -> Result<()> {
    let name = member.decompressed_name();
    let dir = root.join(&name);
    fs::create_dir_all(&dir).map_err(|e| PipelineError::fs(&dir, e))?;

    let file_path = dir.join(&name);
    fs::write(&file_path, &member.content).map_err(|e| PipelineError::fs(&file_path, e))?;
    sink.emit(Diagnostic::MemberExtracted {
        member: member.relative_path.display().to_string(),
        path: file_path.clone(),
    });

    let sections = SectionParser::parse_file(&file_path)?;
    let stem = Path::new(&name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.clone());

    for (section, table) in &sections {
        let out = dir.join(format!("{stem}_{section}.tsv"));
        table.write_tsv(&out)?;
        sink.emit(Diagnostic::SectionWritten {
            section: section.clone(),
            rows: table.row_count(),
            path: out,
        });
    }
    Ok(())
}
