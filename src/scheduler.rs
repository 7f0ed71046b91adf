//! Dependency-ordered, idempotent step execution.

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::{PipelineError, Result};
use crate::step::{Step, StepContext};
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub executed: Vec<String>,
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlannedStep {
    pub id: String,
    pub target: PathBuf,
    pub complete: bool,
}

pub struct Scheduler {
    sink: Arc<dyn DiagnosticSink>,
}

impl Scheduler {
    pub fn new(sink: Arc<dyn DiagnosticSink>) -> Self {
        Self { sink }
    }

    /// Transitive dependencies of `root` followed by `root` itself,
    /// dependencies first, siblings in declaration order.
    pub fn resolve(&self, root: Arc<dyn Step>) -> Result<Vec<Arc<dyn Step>>> {
        let mut order = Vec::new();
        let mut done = HashSet::new();
        let mut visiting = Vec::new();
        visit(root, &mut order, &mut done, &mut visiting)?;
        Ok(order)
    }

    /// Execution order with the current completion state; runs nothing.
    pub fn plan(&self, root: Arc<dyn Step>) -> Result<Vec<PlannedStep>> {
        Ok(self
            .resolve(root)?
            .iter()
            .map(|step| {
                let target = step.output();
                PlannedStep {
                    id: step.id(),
                    target: target.path().to_path_buf(),
                    complete: target.exists(),
                }
            })
            .collect())
    }

    /// Run every incomplete step needed for `root`. Stops at the first failure.
    pub async fn run(&self, root: Arc<dyn Step>) -> Result<RunSummary> {
        let steps = self.resolve(root.clone())?;
        let run_id = Uuid::new_v4();
        self.sink.emit(Diagnostic::RunStarted {
            run_id,
            root: root.id(),
            steps: steps.len(),
        });

        let mut summary = RunSummary {
            run_id,
            executed: Vec::new(),
            skipped: Vec::new(),
        };

        for step in &steps {
            let id = step.id();
            let target = step.output();
            if target.exists() {
                self.sink.emit(Diagnostic::StepSkipped {
                    step: id.clone(),
                    target: target.path().to_path_buf(),
                });
                summary.skipped.push(id);
                continue;
            }

            let ctx = StepContext {
                inputs: step
                    .requires()
                    .iter()
                    .map(|dep| dep.output().path().to_path_buf())
                    .collect(),
                sink: self.sink.clone(),
            };

            self.sink.emit(Diagnostic::StepStarted { step: id.clone() });
            let started = Instant::now();
            let outcome = match step.run(&ctx).await {
                Ok(()) if target.exists() => Ok(()),
                Ok(()) => Err(PipelineError::TargetNotCreated {
                    step: id.clone(),
                    path: target.path().to_path_buf(),
                }),
                Err(e) => Err(PipelineError::Step {
                    step: id.clone(),
                    source: Box::new(e),
                }),
            };

            if let Err(e) = outcome {
                self.sink.emit(Diagnostic::StepFailed {
                    step: id,
                    error: e.to_string(),
                });
                return Err(e);
            }

            self.sink.emit(Diagnostic::StepFinished {
                step: id.clone(),
                elapsed_ms: started.elapsed().as_millis() as u64,
            });
            summary.executed.push(id);
        }

        self.sink.emit(Diagnostic::RunFinished {
            run_id,
            executed: summary.executed.len(),
            skipped: summary.skipped.len(),
        });
        Ok(summary)
    }
}

fn visit(
    step: Arc<dyn Step>,
    order: &mut Vec<Arc<dyn Step>>,
    done: &mut HashSet<String>,
    visiting: &mut Vec<String>,
) -> Result<()> {
    let id = step.id();
    if done.contains(&id) {
        return Ok(());
    }
    if visiting.contains(&id) {
        return Err(PipelineError::Cycle { step: id });
    }

    visiting.push(id.clone());
    for dep in step.requires() {
        visit(dep, order, done, visiting)?;
    }
    visiting.pop();

    done.insert(id);
    order.push(step);
    Ok(())
}
