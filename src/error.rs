use thiserror::Error;

/// The input file lacks columns the format needs. Aborts the whole conversion.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Missing column(s) in {format} input: {}", .missing.join(", "))]
pub struct SchemaError {
    pub format: &'static str,
    pub missing: Vec<String>,
}

/// A single source row could not be turned into a record. The row is skipped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Error processing row {row}{}: {reason}", .invoice.as_ref().map(|i| format!(" (factuur {i})")).unwrap_or_default())]
pub struct RowError {
    /// 1-based row number as shown by a spreadsheet program
    pub row: usize,
    pub invoice: Option<String>,
    pub reason: RowErrorReason,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowErrorReason {
    #[error("invalid or missing date in column '{0}'")]
    InvalidDate(&'static str),
    #[error("invalid or missing amount in column '{0}'")]
    InvalidAmount(&'static str),
    #[error("malformed invoice number '{0}'")]
    MalformedInvoiceNumber(String),
    #[error("due date {0} days after the document date is out of range")]
    DueDateOutOfRange(i64),
}

/// A reference table maps one name to more than one code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Reference file {file} has conflicting codes: {}", format_conflicts(.conflicts))]
pub struct DataConsistencyError {
    pub file: String,
    pub conflicts: Vec<Conflict>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub name: String,
    pub codes: Vec<String>,
}

fn format_conflicts(conflicts: &[Conflict]) -> String {
    conflicts
        .iter()
        .map(|conflict| format!("'{}' => [{}]", conflict.name, conflict.codes.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_error_lists_columns() {
        let err = SchemaError {
            format: "Billit",
            missing: vec!["Datum".to_string(), "Vervaldag".to_string()],
        };
        assert_eq!(
            "Missing column(s) in Billit input: Datum, Vervaldag",
            err.to_string()
        );
    }

    #[test]
    fn row_error_with_and_without_invoice() {
        let err = RowError {
            row: 7,
            invoice: Some("AF1/XX00456".to_string()),
            reason: RowErrorReason::InvalidDate("Vervaldag"),
        };
        assert_eq!(
            "Error processing row 7 (factuur AF1/XX00456): invalid or missing date in column 'Vervaldag'",
            err.to_string()
        );
        let err = RowError {
            row: 3,
            invoice: None,
            reason: RowErrorReason::InvalidAmount("Totaal netto"),
        };
        assert_eq!(
            "Error processing row 3: invalid or missing amount in column 'Totaal netto'",
            err.to_string()
        );
    }

    #[test]
    fn consistency_error_names_conflicts() {
        let err = DataConsistencyError {
            file: "relatiecodes.csv".to_string(),
            conflicts: vec![Conflict {
                name: "Residentie Zon".to_string(),
                codes: vec!["H1".to_string(), "H2".to_string()],
            }],
        };
        assert_eq!(
            "Reference file relatiecodes.csv has conflicting codes: 'Residentie Zon' => [H1, H2]",
            err.to_string()
        );
    }
}
