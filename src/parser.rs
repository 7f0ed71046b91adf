//! Section-delimited text parser.
//!
//! A file is a run of sections. A line starting with `[` opens a section
//! named by the bracketed text; the tab-separated lines that follow belong to
//! it. Every section starts with a column-name row except `Heading`, which is
//! plain data.

use crate::error::{PipelineError, Result};
use crate::table::{split_fields, TabularSection, Table};
use indexmap::IndexMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the one section kind that carries no header row.
pub const HEADLESS_SECTION: &str = "Heading";

/// Sections in first-seen order.
pub type Sections = IndexMap<String, Table>;

#[derive(Debug, Default)]
pub struct SectionParser {
    source: Option<PathBuf>,
}

// Buffered line with its 1-based position in the file.
struct BufferedLine<'a> {
    number: usize,
    text: &'a str,
}

impl SectionParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a file path used in error messages.
    pub fn with_source(path: impl Into<PathBuf>) -> Self {
        Self {
            source: Some(path.into()),
        }
    }

    /// Read and parse a file. Invalid UTF-8 is replaced rather than rejected.
    pub fn parse_file(path: &Path) -> Result<Sections> {
        let bytes = fs::read(path).map_err(|e| PipelineError::fs(path, e))?;
        let text = String::from_utf8_lossy(&bytes);
        SectionParser::with_source(path).parse_str(&text)
    }

    pub fn parse_str(&self, text: &str) -> Result<Sections> {
        let mut sections = Sections::new();
        let mut current: Option<String> = None;
        let mut buffer: Vec<BufferedLine<'_>> = Vec::new();

        for (idx, line) in text.lines().enumerate() {
            if line.starts_with('[') {
                if let Some(name) = current.take() {
                    let table = self.finalize(&name, &buffer)?;
                    sections.insert(name, table);
                }
                buffer.clear();
                current = Some(section_name(line));
                continue;
            }

            if current.is_some() {
                buffer.push(BufferedLine {
                    number: idx + 1,
                    text: line,
                });
            }
        }

        if let Some(name) = current {
            let table = self.finalize(&name, &buffer)?;
            sections.insert(name, table);
        }

        Ok(sections)
    }

    /// Parse into owned [`TabularSection`]s, keeping file order.
    pub fn parse_sections(&self, text: &str) -> Result<Vec<TabularSection>> {
        Ok(self
            .parse_str(text)?
            .into_iter()
            .map(|(name, table)| TabularSection { name, table })
            .collect())
    }

    fn finalize(&self, name: &str, buffer: &[BufferedLine<'_>]) -> Result<Table> {
        let mut lines = buffer
            .iter()
            .filter(|l| !l.text.trim_end_matches('\r').is_empty())
            .map(|l| (l.number, split_fields(l.text)));

        if name == HEADLESS_SECTION {
            let mut rows: Vec<Vec<String>> = Vec::new();
            for (number, row) in lines {
                if let Some(first) = rows.first() {
                    if first.len() != row.len() {
                        return Err(self.ragged(name, number, first.len(), row.len()));
                    }
                }
                rows.push(row);
            }
            return Ok(Table::Headless { rows });
        }

        let header = match lines.next() {
            Some((_, header)) => header,
            None => {
                return Ok(Table::Headered {
                    header: Vec::new(),
                    rows: Vec::new(),
                })
            }
        };
        let mut rows = Vec::new();
        for (number, row) in lines {
            if row.len() != header.len() {
                return Err(self.ragged(name, number, header.len(), row.len()));
            }
            rows.push(row);
        }
        Ok(Table::Headered { header, rows })
    }

    fn ragged(&self, section: &str, line: usize, expected: usize, found: usize) -> PipelineError {
        PipelineError::Parse {
            path: self.source.clone().unwrap_or_default(),
            section: section.to_string(),
            line,
            reason: format!("expected {expected} fields, found {found}"),
        }
    }
}

fn section_name(line: &str) -> String {
    line.trim_end_matches(['\r', '\n'])
        .trim_matches(|c| c == '[' || c == ']')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn heading_is_headless_and_probes_has_header() {
        let text = "[Heading]\nX\n[Probes]\nID\tDefinition\n1\tfoo\n2\tbar\n";
        let sections = SectionParser::new().parse_str(text).unwrap();

        assert_eq!(sections.len(), 2);
        assert_eq!(
            sections["Heading"],
            Table::Headless {
                rows: vec![strings(&["X"])]
            }
        );
        assert_eq!(
            sections["Probes"],
            Table::Headered {
                header: strings(&["ID", "Definition"]),
                rows: vec![strings(&["1", "foo"]), strings(&["2", "bar"])],
            }
        );
    }

    #[test]
    fn sections_keep_first_seen_order() {
        let text = "[Probes]\nID\n1\n[Heading]\nX\n[Controls]\nID\n9\n";
        let names: Vec<_> = SectionParser::new()
            .parse_str(text)
            .unwrap()
            .keys()
            .cloned()
            .collect();
        assert_eq!(names, vec!["Probes", "Heading", "Controls"]);
    }

    #[test]
    fn heading_stays_headless_when_it_is_the_last_section() {
        let text = "[Probes]\nID\n1\n[Heading]\nDate\t2015\nScanner\tiScan\n";
        let sections = SectionParser::new().parse_str(text).unwrap();
        assert_eq!(sections["Heading"].header(), None);
        assert_eq!(sections["Heading"].row_count(), 2);
    }

    #[test]
    fn lines_before_first_section_are_dropped() {
        let text = "preamble\tjunk\n\n[Heading]\nX\n";
        let sections = SectionParser::new().parse_str(text).unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections["Heading"].rows(), &[strings(&["X"])]);
    }

    #[test]
    fn crlf_and_blank_lines_are_tolerated() {
        let text = "[Probes]\r\nID\tSymbol\r\n\r\n1\tA\r\n";
        let sections = SectionParser::new().parse_str(text).unwrap();
        assert_eq!(
            sections["Probes"],
            Table::Headered {
                header: strings(&["ID", "Symbol"]),
                rows: vec![strings(&["1", "A"])],
            }
        );
    }

    #[test]
    fn empty_section_yields_empty_table() {
        let sections = SectionParser::new().parse_str("[Controls]\n[Heading]\n").unwrap();
        assert_eq!(
            sections["Controls"],
            Table::Headered {
                header: vec![],
                rows: vec![]
            }
        );
        assert_eq!(sections["Heading"], Table::Headless { rows: vec![] });
    }

    #[test]
    fn row_wider_than_header_is_a_parse_error() {
        let parser = SectionParser::with_source("GSM1.txt");
        let err = parser
            .parse_str("[Heading]\nX\n[Probes]\nID\tDefinition\n1\tfoo\textra\n")
            .unwrap_err();
        match err {
            PipelineError::Parse { path, section, line, .. } => {
                assert_eq!(path, PathBuf::from("GSM1.txt"));
                assert_eq!(section, "Probes");
                assert_eq!(line, 5);
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn ragged_heading_is_a_parse_error() {
        let err = SectionParser::new()
            .parse_str("[Heading]\nA\tB\nC\n")
            .unwrap_err();
        assert!(matches!(err, PipelineError::Parse { line: 3, .. }));
    }

    #[test]
    fn repeated_section_replaces_table_but_keeps_position() {
        let text = "[Probes]\nID\n1\n[Heading]\nX\n[Probes]\nID\n2\n";
        let sections = SectionParser::new().parse_str(text).unwrap();
        let names: Vec<_> = sections.keys().cloned().collect();
        assert_eq!(names, vec!["Probes", "Heading"]);
        assert_eq!(sections["Probes"].rows(), &[strings(&["2"])]);
    }

    #[test]
    fn parse_sections_returns_named_sections() {
        let sections = SectionParser::new()
            .parse_sections("[Heading]\nX\n[Probes]\nID\n1\n")
            .unwrap();
        assert_eq!(sections[1].name, "Probes");
        assert!(sections[1].table.has_header());
    }
}
