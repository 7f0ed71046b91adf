use crate::diagnostics::DiagnosticSink;
use crate::error::Result;
use crate::target::Target;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

/// What a running step gets to see: the output paths of its dependencies
/// (in declaration order) and the diagnostic sink.
pub struct StepContext {
    pub inputs: Vec<PathBuf>,
    pub sink: Arc<dyn DiagnosticSink>,
}

impl StepContext {
    /// Output path of the first declared dependency.
    pub fn input(&self) -> Option<&PathBuf> {
        self.inputs.first()
    }
}

/// A named unit of pipeline work.
#[async_trait]
pub trait Step: Send + Sync {
    fn name(&self) -> &str;

    /// Identity used to run a step at most once per invocation. Defaults to
    /// the name; steps with parameters should include them.
    fn id(&self) -> String {
        self.name().to_string()
    }

    fn requires(&self) -> Vec<Arc<dyn Step>> {
        Vec::new()
    }

    fn output(&self) -> Box<dyn Target>;

    async fn run(&self, ctx: &StepContext) -> Result<()>;
}
