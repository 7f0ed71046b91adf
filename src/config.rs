use crate::error::{PipelineError, Result};
use crate::fetch::DEFAULT_GEO_BASE_URL;
use crate::paths;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "geo_pipeline.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub dataset_id: String,
    pub download_dir: PathBuf,
    pub processed_data_dir: PathBuf,
    pub probes_dir: PathBuf,
    pub base_url: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dataset_id: "GSE68849".to_string(),
            download_dir: PathBuf::from("data"),
            processed_data_dir: PathBuf::from("processed_data"),
            probes_dir: PathBuf::from("probes_data"),
            base_url: DEFAULT_GEO_BASE_URL.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Defaults, then the TOML file (explicit path, or the default file if it
    /// exists), then `GEO_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| PipelineError::Config(e.to_string()))
    }

    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("GEO_DATASET_ID") {
            self.dataset_id = v;
        }
        if let Some(v) = lookup("GEO_DOWNLOAD_DIR") {
            self.download_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("GEO_PROCESSED_DIR") {
            self.processed_data_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("GEO_PROBES_DIR") {
            self.probes_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("GEO_BASE_URL") {
            self.base_url = v;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.dataset_id.trim().is_empty() {
            return Err(PipelineError::Config("dataset_id must not be empty".into()));
        }
        let processed = paths::resolve(&self.processed_data_dir);
        if processed.starts_with(paths::resolve(&self.probes_dir)) {
            return Err(PipelineError::Config(
                "probes_dir must not be processed_data_dir or one of its parents; the processed directory is cleaned up".into(),
            ));
        }
        if paths::resolve(&self.download_dir).starts_with(&processed) {
            return Err(PipelineError::Config(
                "download_dir must not be inside processed_data_dir".into(),
            ));
        }
        Ok(())
    }

    pub fn archive_path(&self) -> PathBuf {
        self.download_dir
            .join(format!("{}_RAW.tar", self.dataset_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_overrides_only_given_keys() {
        let config = PipelineConfig::from_toml(
            r#"
            dataset_id = "GSE1234"
            probes_dir = "out/probes"
            "#,
        )
        .unwrap();
        assert_eq!(config.dataset_id, "GSE1234");
        assert_eq!(config.probes_dir, PathBuf::from("out/probes"));
        assert_eq!(config.download_dir, PathBuf::from("data"));
        assert_eq!(config.archive_path(), PathBuf::from("data/GSE1234_RAW.tar"));
    }

    #[test]
    fn env_wins_over_file_values() {
        let mut config = PipelineConfig::default();
        config.apply_env(|key| match key {
            "GEO_DATASET_ID" => Some("GSE99".to_string()),
            "GEO_PROCESSED_DIR" => Some("/tmp/processed".to_string()),
            _ => None,
        });
        assert_eq!(config.dataset_id, "GSE99");
        assert_eq!(config.processed_data_dir, PathBuf::from("/tmp/processed"));
        assert_eq!(config.probes_dir, PathBuf::from("probes_data"));
    }

    #[test]
    fn validate_rejects_shared_probes_and_processed_dirs() {
        let config = PipelineConfig {
            probes_dir: PathBuf::from("processed_data"),
            ..PipelineConfig::default()
        };
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));

        let empty = PipelineConfig {
            dataset_id: " ".into(),
            ..PipelineConfig::default()
        };
        assert!(empty.validate().is_err());
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_compares_resolved_paths() {
        let dotted = PipelineConfig {
            probes_dir: PathBuf::from("./processed_data"),
            ..PipelineConfig::default()
        };
        assert!(matches!(dotted.validate(), Err(PipelineError::Config(_))));

        let probes_above_processed = PipelineConfig {
            probes_dir: PathBuf::from("work"),
            processed_data_dir: PathBuf::from("work/processed"),
            ..PipelineConfig::default()
        };
        assert!(probes_above_processed.validate().is_err());

        let download_inside_processed = PipelineConfig {
            download_dir: PathBuf::from("processed_data/./data"),
            ..PipelineConfig::default()
        };
        assert!(download_inside_processed.validate().is_err());

        let nested_outputs = PipelineConfig {
            download_dir: PathBuf::from("work"),
            processed_data_dir: PathBuf::from("work/processed"),
            probes_dir: PathBuf::from("./work/processed/probes"),
            ..PipelineConfig::default()
        };
        assert!(nested_outputs.validate().is_ok());
    }

    #[test]
    fn unknown_toml_types_are_config_errors() {
        let err = PipelineConfig::from_toml("dataset_id = 5").unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }
}
