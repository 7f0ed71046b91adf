pub mod archive;
pub mod cleanup;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod parser;
pub mod paths;
pub mod scheduler;
pub mod step;
pub mod table;
pub mod target;
pub mod tasks;
pub mod trim;

pub use config::PipelineConfig;
pub use diagnostics::{Diagnostic, DiagnosticSink, MemorySink, TracingSink};
pub use error::{PipelineError, Result};
pub use parser::SectionParser;
pub use scheduler::{RunSummary, Scheduler};
pub use step::{Step, StepContext};
pub use table::{TabularSection, Table};
pub use target::{LocalTarget, Target};
