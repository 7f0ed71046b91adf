use crate::error::{PipelineError, Result};
use crate::table::Table;

/// Annotation columns dropped from every Probes table.
pub const PROBE_COLUMNS_TO_REMOVE: [&str; 7] = [
    "Definition",
    "Ontology_Component",
    "Ontology_Process",
    "Ontology_Function",
    "Synonyms",
    "Obsolete_Probe_Id",
    "Probe_Sequence",
];

/// Result of a trim: the new table and the columns that were actually present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trimmed {
    pub table: Table,
    pub removed: Vec<String>,
}

/// Drop the named columns from a headered table. Names that are not in the
/// header are ignored; the remaining columns keep their order.
pub fn trim_columns<S: AsRef<str>>(table: &Table, section: &str, columns: &[S]) -> Result<Trimmed> {
    let (header, rows) = match table {
        Table::Headered { header, rows } => (header, rows),
        Table::Headless { .. } => {
            return Err(PipelineError::HeaderlessTable {
                section: section.to_string(),
            })
        }
    };

    let keep: Vec<bool> = header
        .iter()
        .map(|name| !columns.iter().any(|c| c.as_ref() == name))
        .collect();
    let removed = header
        .iter()
        .zip(&keep)
        .filter(|(_, keep)| !**keep)
        .map(|(name, _)| name.clone())
        .collect();

    let project = |row: &Vec<String>| -> Vec<String> {
        row.iter()
            .zip(&keep)
            .filter(|(_, keep)| **keep)
            .map(|(field, _)| field.clone())
            .collect()
    };

    Ok(Trimmed {
        table: Table::Headered {
            header: project(header),
            rows: rows.iter().map(project).collect(),
        },
        removed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn probes() -> Table {
        Table::Headered {
            header: strings(&["ID", "Definition"]),
            rows: vec![strings(&["1", "foo"]), strings(&["2", "bar"])],
        }
    }

    #[test]
    fn removes_named_column_from_header_and_rows() {
        let trimmed = trim_columns(&probes(), "Probes", &["Definition"]).unwrap();
        assert_eq!(
            trimmed.table,
            Table::Headered {
                header: strings(&["ID"]),
                rows: vec![strings(&["1"]), strings(&["2"])],
            }
        );
        assert_eq!(trimmed.removed, strings(&["Definition"]));
    }

    #[test]
    fn unknown_column_leaves_table_unchanged() {
        let trimmed = trim_columns(&probes(), "Probes", &["Nonexistent"]).unwrap();
        assert_eq!(trimmed.table, probes());
        assert!(trimmed.removed.is_empty());
    }

    #[test]
    fn fixed_probe_columns_preserve_remaining_order() {
        let table = Table::Headered {
            header: strings(&["Species", "Synonyms", "Symbol", "Probe_Sequence", "ID"]),
            rows: vec![strings(&["Hs", "s", "A1BG", "ACGT", "ILMN_1"])],
        };
        let trimmed = trim_columns(&table, "Probes", &PROBE_COLUMNS_TO_REMOVE).unwrap();
        assert_eq!(trimmed.table.header().unwrap(), strings(&["Species", "Symbol", "ID"]).as_slice());
        assert_eq!(trimmed.table.rows(), &[strings(&["Hs", "A1BG", "ILMN_1"])]);
        assert_eq!(trimmed.removed, strings(&["Synonyms", "Probe_Sequence"]));
    }

    #[test]
    fn headless_table_is_rejected() {
        let table = Table::Headless {
            rows: vec![strings(&["X"])],
        };
        let err = trim_columns(&table, "Heading", &["X"]).unwrap_err();
        assert!(matches!(err, PipelineError::HeaderlessTable { section } if section == "Heading"));
    }
}
