use super::DatasetParams;
use crate::diagnostics::Diagnostic;
use crate::error::{PipelineError, Result};
use crate::fetch::raw_archive_url;
use crate::step::{Step, StepContext};
use crate::target::{LocalTarget, Target};
use async_trait::async_trait;
use std::fs;
use std::path::PathBuf;

/// Fetches `<download_dir>/<dataset_id>_RAW.tar`.
pub struct DownloadDataset {
    params: DatasetParams,
}

impl DownloadDataset {
    pub fn new(params: DatasetParams) -> Self {
        Self { params }
    }

    fn archive_path(&self) -> PathBuf {
        self.params.config.archive_path()
    }
}

#[async_trait]
impl Step for DownloadDataset {
    fn name(&self) -> &str {
        "download_dataset"
    }

    fn id(&self) -> String {
        self.params.step_id(self.name())
    }

    fn output(&self) -> Box<dyn Target> {
        Box::new(LocalTarget::new(self.archive_path()))
    }

    async fn run(&self, ctx: &StepContext) -> Result<()> {
        let config = &self.params.config;
        fs::create_dir_all(&config.download_dir)
            .map_err(|e| PipelineError::fs(&config.download_dir, e))?;

        let url = raw_archive_url(&config.base_url, &config.dataset_id);
        let archive = self.archive_path();
        // Download to a side file so an interrupted fetch never looks complete
        let partial = archive.with_extension("tar.part");

        if let Err(e) = self.params.fetcher.fetch(&url, &partial).await {
            let _ = fs::remove_file(&partial);
            return Err(e);
        }
        fs::rename(&partial, &archive).map_err(|e| PipelineError::fs(&archive, e))?;

        ctx.sink.emit(Diagnostic::ArchiveDownloaded { url, path: archive });
        Ok(())
    }
}
