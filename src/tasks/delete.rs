use super::{DatasetParams, TrimProbesTable};
use crate::cleanup::Cleanup;
use crate::error::{PipelineError, Result};
use crate::step::{Step, StepContext};
use crate::target::{LocalTarget, Target};
use async_trait::async_trait;
use chrono::Utc;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

pub const DONE_MARKER: &str = "delete_original_data.done";

/// Removes the processed intermediates once the trimmed tables exist.
///
/// Cleanup itself is advisory and cannot fail this step. The processed
/// directory is recreated afterwards to hold the completion marker.
pub struct DeleteOriginalData {
    params: DatasetParams,
}

impl DeleteOriginalData {
    pub fn new(params: DatasetParams) -> Self {
        Self { params }
    }

    fn marker_path(&self) -> PathBuf {
        self.params.config.processed_data_dir.join(DONE_MARKER)
    }
}

#[async_trait]
impl Step for DeleteOriginalData {
    fn name(&self) -> &str {
        "delete_original_data"
    }

    fn id(&self) -> String {
        self.params.step_id(self.name())
    }

    fn requires(&self) -> Vec<Arc<dyn Step>> {
        vec![Arc::new(TrimProbesTable::new(self.params.clone()))]
    }

    fn output(&self) -> Box<dyn Target> {
        Box::new(LocalTarget::new(self.marker_path()))
    }

    async fn run(&self, ctx: &StepContext) -> Result<()> {
        let config = &self.params.config;
        let processed = &config.processed_data_dir;

        let report = Cleanup::new(processed, ctx.sink.as_ref())
            .with_remover(self.params.remover.as_ref())
            .preserve(&config.probes_dir)
            .preserve(&config.download_dir)
            .run();

        fs::create_dir_all(processed).map_err(|e| PipelineError::fs(processed, e))?;
        let marker = self.marker_path();
        let body = serde_json::json!({
            "completed_at": Utc::now().to_rfc3339(),
            "cleanup": report,
        });
        fs::write(&marker, format!("{body:#}\n")).map_err(|e| PipelineError::fs(&marker, e))
    }
}
