use crate::error::{PipelineError, Result};
use csv::{QuoteStyle, ReaderBuilder, Terminator, WriterBuilder};
use std::path::Path;

pub const FIELD_SEPARATOR: char = '\t';

/// A table decoded from one section. Whether the first line is a column-name
/// row is decided once, at parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Table {
    Headered {
        header: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    Headless {
        rows: Vec<Vec<String>>,
    },
}

impl Table {
    pub fn rows(&self) -> &[Vec<String>] {
        match self {
            Table::Headered { rows, .. } | Table::Headless { rows } => rows,
        }
    }

    pub fn header(&self) -> Option<&[String]> {
        match self {
            Table::Headered { header, .. } => Some(header),
            Table::Headless { .. } => None,
        }
    }

    pub fn has_header(&self) -> bool {
        self.header().is_some()
    }

    pub fn row_count(&self) -> usize {
        self.rows().len()
    }

    /// Write as tab-separated text, fields unquoted. Headless tables have no
    /// header line.
    pub fn write_tsv(&self, path: &Path) -> Result<()> {
        let mut writer = WriterBuilder::new()
            .delimiter(FIELD_SEPARATOR as u8)
            .quote_style(QuoteStyle::Never)
            .terminator(Terminator::Any(b'\n'))
            .from_path(path)
            .map_err(|e| PipelineError::fs(path, e.into()))?;

        if let Some(header) = self.header() {
            writer
                .write_record(header)
                .map_err(|e| PipelineError::fs(path, e.into()))?;
        }
        for row in self.rows() {
            writer
                .write_record(row)
                .map_err(|e| PipelineError::fs(path, e.into()))?;
        }
        writer.flush().map_err(|e| PipelineError::fs(path, e))
    }

    /// Read a headered TSV file, as written by [`Table::write_tsv`]. Empty
    /// lines are skipped; a line of empty fields is still a row.
    pub fn read_headered_tsv(path: &Path, section: &str) -> Result<Table> {
        let mut reader = ReaderBuilder::new()
            .delimiter(FIELD_SEPARATOR as u8)
            .quoting(false)
            .flexible(false)
            .from_path(path)
            .map_err(|e| PipelineError::fs(path, e.into()))?;

        let header: Vec<String> = reader
            .headers()
            .map_err(|e| read_error(path, section, e))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| read_error(path, section, e))?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(Table::Headered { header, rows })
    }
}

/// One named section of a section-delimited file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabularSection {
    pub name: String,
    pub table: Table,
}

pub fn split_fields(line: &str) -> Vec<String> {
    line.trim_end_matches(['\r', '\n'])
        .split(FIELD_SEPARATOR)
        .map(str::to_string)
        .collect()
}

fn read_error(path: &Path, section: &str, err: csv::Error) -> PipelineError {
    let line = err.position().map(|p| p.line() as usize).unwrap_or_default();
    let reason = match err.into_kind() {
        csv::ErrorKind::Io(e) => return PipelineError::fs(path, e),
        csv::ErrorKind::UnequalLengths {
            expected_len, len, ..
        } => format!("expected {expected_len} fields, found {len}"),
        csv::ErrorKind::Utf8 { err, .. } => err.to_string(),
        other => format!("{other:?}"),
    };
    PipelineError::Parse {
        path: path.to_path_buf(),
        section: section.to_string(),
        line,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn headless_tables_are_written_without_header_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("GSM1_Heading.tsv");
        let table = Table::Headless {
            rows: vec![strings(&["Date", "2015-05-01"]), strings(&["Scanner", "iScan"])],
        };
        table.write_tsv(&path).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "Date\t2015-05-01\nScanner\tiScan\n"
        );
        assert!(!table.has_header());
    }

    #[test]
    fn headered_tsv_reads_back_what_was_written() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("GSM1_Probes.tsv");
        let table = Table::Headered {
            header: strings(&["ID", "Definition"]),
            rows: vec![strings(&["1", "\"quoted\" foo"]), strings(&["2", ""])],
        };
        table.write_tsv(&path).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "ID\tDefinition\n1\t\"quoted\" foo\n2\t\n"
        );
        assert_eq!(Table::read_headered_tsv(&path, "Probes").unwrap(), table);
    }

    #[test]
    fn rows_of_empty_fields_are_kept() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("GSM1_Probes.tsv");
        fs::write(&path, "ID\tDefinition\n1\tfoo\n\t\n2\tbaz\n").unwrap();

        let table = Table::read_headered_tsv(&path, "Probes").unwrap();
        assert_eq!(
            table.rows(),
            &[strings(&["1", "foo"]), strings(&["", ""]), strings(&["2", "baz"])]
        );
    }

    #[test]
    fn ragged_tsv_reports_line_and_section() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("GSM1_Extra_Probes.tsv");
        fs::write(&path, "ID\tDefinition\n1\tfoo\n2\n").unwrap();

        match Table::read_headered_tsv(&path, "Extra_Probes") {
            Err(PipelineError::Parse { section, line, .. }) => {
                assert_eq!(section, "Extra_Probes");
                assert_eq!(line, 3);
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }
}
