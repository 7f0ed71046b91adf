use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("missing input {what}: {}", path.display())]
    MissingInput { path: PathBuf, what: String },

    #[error("parse error in {} section [{section}] at line {line}: {reason}", path.display())]
    Parse {
        path: PathBuf,
        section: String,
        line: usize,
        reason: String,
    },

    #[error("section [{section}] has no header row; columns cannot be trimmed by name")]
    HeaderlessTable { section: String },

    #[error("filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("fetch of {url} failed: {reason}")]
    Fetch { url: String, reason: String },

    #[error("archive error in {}: {reason}", path.display())]
    Archive { path: PathBuf, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("dependency cycle detected at step '{step}'")]
    Cycle { step: String },

    #[error("step '{step}' reported success but produced no output at {}", path.display())]
    TargetNotCreated { step: String, path: PathBuf },

    #[error("step '{step}' failed: {source}")]
    Step {
        step: String,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    /// Wrap an `io::Error` with the path it happened on.
    pub fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Filesystem {
            path: path.into(),
            source,
        }
    }

    pub fn missing(path: impl Into<PathBuf>, what: impl Into<String>) -> Self {
        PipelineError::MissingInput {
            path: path.into(),
            what: what.into(),
        }
    }

    /// Strip any `Step` wrappers and return the underlying cause.
    pub fn root_cause(&self) -> &PipelineError {
        match self {
            PipelineError::Step { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_wrapper_exposes_root_cause_and_names_step() {
        let err = PipelineError::Step {
            step: "trim_probes(GSE1)".to_string(),
            source: Box::new(PipelineError::missing("processed_data", "Probes tables")),
        };
        assert!(matches!(err.root_cause(), PipelineError::MissingInput { .. }));
        let msg = err.to_string();
        assert!(msg.contains("trim_probes(GSE1)"));
        assert!(msg.contains("processed_data"));
    }
}
