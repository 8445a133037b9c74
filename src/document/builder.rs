use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use super::{Document, LedgerRule};
use crate::error::{RowError, RowErrorReason};

/// Per-format knobs the rows need to build a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRules {
    pub ledger: LedgerRule,
    /// Days between document date and due date, for formats without a due date column
    pub due_days: i64,
}

/// A validated input row of one of the formats.
pub trait SourceRow {
    /// 1-based row number in the input file
    fn row_number(&self) -> usize;

    /// The invoice identifier as it appears in the input, for error messages
    fn invoice(&self) -> Option<String>;

    fn to_document(&self, rules: &BuildRules) -> Result<Document, RowErrorReason>;
}

/// Lowest, highest and all invoice numbers of a batch, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvoiceNumbers {
    seen: Vec<String>,
}

impl InvoiceNumbers {
    pub fn record(&mut self, number: &str) {
        self.seen.push(number.to_string());
    }

    pub fn seen(&self) -> &[String] {
        &self.seen
    }

    /// Numeric numbers compare by value and come before non-numeric ones.
    pub fn lowest(&self) -> Option<&str> {
        self.seen.iter().min_by(|a, b| order_key(a).cmp(&order_key(b))).map(String::as_str)
    }

    pub fn highest(&self) -> Option<&str> {
        self.seen.iter().max_by(|a, b| order_key(a).cmp(&order_key(b))).map(String::as_str)
    }

    /// Runs of numbers missing between consecutive numeric invoice numbers, as inclusive ranges.
    pub fn gaps(&self) -> Vec<RangeInclusive<u64>> {
        let numbers: BTreeSet<u64> = self.seen.iter().filter_map(|n| numeric(n)).collect();
        numbers
            .iter()
            .zip(numbers.iter().skip(1))
            .filter(|(previous, next)| *next - *previous > 1)
            .map(|(previous, next)| previous + 1..=next - 1)
            .collect()
    }
}

fn numeric(number: &str) -> Option<u64> {
    if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    number.parse().ok()
}

fn order_key(number: &str) -> (bool, Option<u64>, &str) {
    let value = numeric(number);
    (value.is_none(), value, number)
}

#[derive(Debug, Default)]
pub struct Batch {
    pub documents: Vec<Document>,
    pub row_errors: Vec<RowError>,
    pub invoice_numbers: InvoiceNumbers,
}

/// Builds one record per row. Rows that fail are logged, collected in
/// [Batch::row_errors] and left out; the remaining rows are still processed.
pub fn build_documents<R: SourceRow>(rows: &[R], rules: &BuildRules) -> Batch {
    let mut batch = Batch::default();
    for row in rows {
        match row.to_document(rules) {
            Ok(document) => {
                if let Some(number) = &document.number {
                    batch.invoice_numbers.record(number);
                }
                batch.documents.push(document);
            }
            Err(reason) => {
                let err = RowError {
                    row: row.row_number(),
                    invoice: row.invoice(),
                    reason,
                };
                log::warn!("{}", err);
                batch.row_errors.push(err);
            }
        }
    }
    log::info!(
        "Built {} records, skipped {} rows",
        batch.documents.len(),
        batch.row_errors.len()
    );
    batch
}
