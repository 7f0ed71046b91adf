//! The GEO probes chain: download → extract → trim → delete.

pub mod delete;
pub mod download;
pub mod extract;
pub mod trim;

pub use delete::DeleteOriginalData;
pub use download::DownloadDataset;
pub use extract::ExtractAndProcessFiles;
pub use trim::TrimProbesTable;

use crate::cleanup::{FsRemover, Remover};
use crate::config::PipelineConfig;
use crate::fetch::Fetcher;
use crate::step::Step;
use std::sync::Arc;

/// Parameters shared by every step of the chain.
#[derive(Clone)]
pub struct DatasetParams {
    pub config: Arc<PipelineConfig>,
    pub fetcher: Arc<dyn Fetcher>,
    pub remover: Arc<dyn Remover>,
}

impl DatasetParams {
    pub fn new(config: PipelineConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            config: Arc::new(config),
            fetcher,
            remover: Arc::new(FsRemover),
        }
    }

    /// Replace the filesystem remover used when cleaning intermediates.
    pub fn with_remover(mut self, remover: Arc<dyn Remover>) -> Self {
        self.remover = remover;
        self
    }

    fn step_id(&self, name: &str) -> String {
        format!("{}({})", name, self.config.dataset_id)
    }
}

/// Final step of the chain; running it pulls in everything upstream.
pub fn build_pipeline(params: DatasetParams) -> Arc<dyn Step> {
    Arc::new(DeleteOriginalData::new(params))
}
