use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub const DEFAULT_GEO_BASE_URL: &str = "https://ftp.ncbi.nlm.nih.gov/geo/series";

/// Retrieves a remote resource into a local file.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<PathBuf>;
}

/// Plain HTTP(S) GET.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<PathBuf> {
        let fetch_err = |reason: String| PipelineError::Fetch {
            url: url.to_string(),
            reason,
        };

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_err(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(fetch_err(format!("HTTP status {}", status.as_u16())));
        }
        let bytes = resp.bytes().await.map_err(|e| fetch_err(e.to_string()))?;

        tokio::fs::write(dest, &bytes)
            .await
            .map_err(|e| PipelineError::fs(dest, e))?;
        Ok(dest.to_path_buf())
    }
}

/// Copies an archive that is already on disk; the URL is ignored.
pub struct LocalFileFetcher {
    source: PathBuf,
}

impl LocalFileFetcher {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

#[async_trait]
impl Fetcher for LocalFileFetcher {
    async fn fetch(&self, _url: &str, dest: &Path) -> Result<PathBuf> {
        if !self.source.is_file() {
            return Err(PipelineError::missing(&self.source, "source archive"));
        }
        tokio::fs::copy(&self.source, dest)
            .await
            .map_err(|e| PipelineError::fs(dest, e))?;
        Ok(dest.to_path_buf())
    }
}

/// GEO groups series by thousands: `GSE68849` lives under `GSE68nnn`.
pub fn series_stub(dataset_id: &str) -> String {
    let digits_at = dataset_id
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(dataset_id.len());
    let (prefix, digits) = dataset_id.split_at(digits_at);
    let keep = digits.len().saturating_sub(3);
    format!("{}{}nnn", prefix, &digits[..keep])
}

/// Download URL of the raw supplementary archive of a series.
pub fn raw_archive_url(base_url: &str, dataset_id: &str) -> String {
    format!(
        "{}/{}/{}/suppl/{}_RAW.tar",
        base_url.trim_end_matches('/'),
        series_stub(dataset_id),
        dataset_id,
        dataset_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn stub_replaces_last_three_digits() {
        assert_eq!(series_stub("GSE68849"), "GSE68nnn");
        assert_eq!(series_stub("GSE1234"), "GSE1nnn");
        assert_eq!(series_stub("GSE123"), "GSEnnn");
        assert_eq!(series_stub("GSE12"), "GSEnnn");
    }

    #[test]
    fn archive_url_matches_geo_layout() {
        assert_eq!(
            raw_archive_url("https://ftp.ncbi.nlm.nih.gov/geo/series/", "GSE68849"),
            "https://ftp.ncbi.nlm.nih.gov/geo/series/GSE68nnn/GSE68849/suppl/GSE68849_RAW.tar"
        );
    }

    #[tokio::test]
    async fn local_fetcher_copies_and_reports_missing_source() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src.tar");
        std::fs::write(&src, b"archive").unwrap();
        let dest = dir.path().join("dest.tar");

        let got = LocalFileFetcher::new(&src).fetch("ignored", &dest).await.unwrap();
        assert_eq!(got, dest);
        assert_eq!(std::fs::read(&dest).unwrap(), b"archive");

        let err = LocalFileFetcher::new(dir.path().join("nope.tar"))
            .fetch("ignored", &dest)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::MissingInput { .. }));
    }
}
