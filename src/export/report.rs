use anyhow::{anyhow, Context as _, Result};
use std::path::{Path, PathBuf};

use super::MissingCell;
use crate::document::{Document, InvoiceNumbers, LedgerAccount, VatCode};

pub const MISSING_VALUES_FILE: &str = "missing_values.txt";
pub const MISSING_ORDER_NUMBERS_FILE: &str = "missing_order_nummers.txt";

/// Things the operator should look at before importing: gaps in the invoice
/// numbering, records without a ledger account and records without a VAT code.
pub fn review_notes(documents: &[Document], invoice_numbers: &InvoiceNumbers) -> Vec<String> {
    let mut notes = vec![];
    let gaps = invoice_numbers.gaps();
    if !gaps.is_empty() {
        let ranges: Vec<String> = gaps
            .iter()
            .map(|gap| {
                if gap.start() == gap.end() {
                    gap.start().to_string()
                } else {
                    format!("{}-{}", gap.start(), gap.end())
                }
            })
            .collect();
        notes.push(format!("Missing invoice numbers: {}", ranges.join(", ")));
    }
    for document in documents {
        let label = document
            .number
            .clone()
            .unwrap_or_else(|| format!("row {}", document.source_row));
        if document.ledger_account == LedgerAccount::NeedsReview {
            notes.push(format!("Please check grootboekrekening for factuur: {label}"));
        }
        if document.vat_code() == VatCode::Undetermined {
            notes.push(format!("Please check btwcode for factuur: {label}"));
        }
    }
    notes
}

/// Writes the missing values report. Nothing is written if there is nothing to report.
pub(super) fn write_missing_values(
    folder: &Path,
    missing: &[MissingCell],
    notes: &[String],
) -> Result<Option<PathBuf>> {
    let lines = missing
        .iter()
        .map(ToString::to_string)
        .chain(notes.iter().cloned());
    write_lines(&folder.join(MISSING_VALUES_FILE), lines)
}

pub fn write_missing_order_numbers(
    folder: &Path,
    invoices: &[String],
) -> Result<Option<PathBuf>> {
    let lines = invoices
        .iter()
        .map(|invoice| format!("Missing Order nummer for factuurnr: {invoice}"));
    write_lines(&folder.join(MISSING_ORDER_NUMBERS_FILE), lines)
}

fn write_lines(path: &Path, lines: impl Iterator<Item = String>) -> Result<Option<PathBuf>> {
    let content: String = lines.map(|line| line + "\n").collect();
    if content.is_empty() {
        return Ok(None);
    }
    std::fs::write(path, content).with_context(|| anyhow!("Failed to write {}", path.display()))?;
    log::info!("Wrote {}", path.display());
    Ok(Some(path.to_path_buf()))
}
