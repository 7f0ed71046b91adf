use crate::error::{PipelineError, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Suffix of the archive members that hold section files.
pub const MEMBER_SUFFIX: &str = ".txt.gz";

/// A decompressed archive member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFile {
    pub relative_path: PathBuf,
    pub content: Vec<u8>,
}

impl ExtractedFile {
    /// Member file name with the `.gz` dropped, e.g. `GSM1_sample.txt`.
    pub fn decompressed_name(&self) -> String {
        let name = self
            .relative_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        name.strip_suffix(".gz").map(str::to_string).unwrap_or(name)
    }
}

/// Decompress every regular `*.txt.gz` member of a tar archive, in archive order.
pub fn extract_members(tar_path: &Path) -> Result<Vec<ExtractedFile>> {
    if !tar_path.is_file() {
        return Err(PipelineError::missing(tar_path, "TAR archive"));
    }
    let file = File::open(tar_path).map_err(|e| PipelineError::fs(tar_path, e))?;
    let archive_err = |reason: String| PipelineError::Archive {
        path: tar_path.to_path_buf(),
        reason,
    };

    let mut archive = tar::Archive::new(file);
    let mut extracted = Vec::new();
    for entry in archive.entries().map_err(|e| archive_err(e.to_string()))? {
        let entry = entry.map_err(|e| archive_err(e.to_string()))?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let relative_path = entry
            .path()
            .map_err(|e| archive_err(e.to_string()))?
            .into_owned();
        if !relative_path.to_string_lossy().ends_with(MEMBER_SUFFIX) {
            continue;
        }

        let mut content = Vec::new();
        GzDecoder::new(entry)
            .read_to_end(&mut content)
            .map_err(|e| archive_err(format!("{}: {}", relative_path.display(), e)))?;
        extracted.push(ExtractedFile {
            relative_path,
            content,
        });
    }
    Ok(extracted)
}
