use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use geo_pipeline::config::PipelineConfig;
use geo_pipeline::diagnostics::{DiagnosticSink, TracingSink};
use geo_pipeline::fetch::{Fetcher, HttpFetcher, LocalFileFetcher};
use geo_pipeline::logging;
use geo_pipeline::parser::SectionParser;
use geo_pipeline::scheduler::Scheduler;
use geo_pipeline::tasks::{build_pipeline, DatasetParams};

#[derive(Parser)]
#[command(name = "geo_pipeline")]
#[command(about = "Download a GEO series, split its section files into TSV tables and trim the Probes tables")]
#[command(version = "0.1.0")]
struct Cli {
    /// Directory for rotated JSON log files
    #[arg(long, global = true, default_value = "logs")]
    log_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the whole chain up to and including cleanup
    Run {
        #[command(flatten)]
        dataset: DatasetArgs,
        /// Use a local archive instead of downloading it
        #[arg(long)]
        archive: Option<PathBuf>,
        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show which steps are already complete without running anything
    Status {
        #[command(flatten)]
        dataset: DatasetArgs,
    },
    /// Parse a single section file and list its sections
    Sections {
        file: PathBuf,
        /// Write one `<stem>_<section>.tsv` per section into this directory
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Args)]
struct DatasetArgs {
    /// TOML config file (defaults to ./geo_pipeline.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,
    /// GEO series identifier, e.g. GSE68849
    #[arg(long)]
    dataset_id: Option<String>,
    #[arg(long)]
    download_dir: Option<PathBuf>,
    #[arg(long)]
    processed_dir: Option<PathBuf>,
    #[arg(long)]
    probes_dir: Option<PathBuf>,
}

impl DatasetArgs {
    fn resolve(self) -> Result<PipelineConfig> {
        let mut config = PipelineConfig::load(self.config.as_deref())?;
        if let Some(v) = self.dataset_id {
            config.dataset_id = v;
        }
        if let Some(v) = self.download_dir {
            config.download_dir = v;
        }
        if let Some(v) = self.processed_dir {
            config.processed_data_dir = v;
        }
        if let Some(v) = self.probes_dir {
            config.probes_dir = v;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let _log_guard = logging::init_logging(&cli.log_dir);

    let sink: Arc<dyn DiagnosticSink> = Arc::new(TracingSink);

    match cli.command {
        Commands::Run { dataset, archive, json } => {
            let config = dataset.resolve()?;
            let fetcher: Arc<dyn Fetcher> = match archive {
                Some(path) => Arc::new(LocalFileFetcher::new(path)),
                None => Arc::new(HttpFetcher::new()),
            };
            let root = build_pipeline(DatasetParams::new(config, fetcher));

            info!("Running GEO probes pipeline");
            match Scheduler::new(sink).run(root).await {
                Ok(summary) => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(&summary)?);
                    } else {
                        println!("✅ Pipeline completed (run {})", summary.run_id);
                        println!("   Executed: {}", summary.executed.join(", "));
                        println!("   Skipped:  {}", summary.skipped.join(", "));
                    }
                }
                Err(e) => {
                    error!("Pipeline failed: {}", e);
                    return Err(e).context("GEO probes pipeline failed");
                }
            }
        }
        Commands::Status { dataset } => {
            let config = dataset.resolve()?;
            let root = build_pipeline(DatasetParams::new(config, Arc::new(HttpFetcher::new())));
            for step in Scheduler::new(sink).plan(root)? {
                let mark = if step.complete { "done" } else { "pending" };
                println!("{:<8} {:<40} {}", mark, step.id, step.target.display());
            }
        }
        Commands::Sections { file, out } => {
            let sections = SectionParser::parse_file(&file)
                .with_context(|| format!("failed to parse {}", file.display()))?;
            let stem = file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            if let Some(dir) = &out {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("failed to create {}", dir.display()))?;
            }
            for (name, table) in &sections {
                let header = if table.has_header() { "header" } else { "no header" };
                println!("[{}] {} rows, {}", name, table.row_count(), header);
                if let Some(dir) = &out {
                    table.write_tsv(&dir.join(format!("{stem}_{name}.tsv")))?;
                }
            }
        }
    }

    Ok(())
}
