//! Writes records to the accounting import workbook.

mod report;

pub use report::{
    review_notes, write_missing_order_numbers, MISSING_ORDER_NUMBERS_FILE, MISSING_VALUES_FILE,
};

use anyhow::{anyhow, Context as _, Result};
use rust_decimal::prelude::ToPrimitive as _;
use rust_decimal::Decimal;
use rust_xlsxwriter::Workbook;
use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};

use crate::document::{Document, LedgerAccount, CURRENCY, STATUS, VAT_REGIME};

/// Suffix used instead of the regular one when required cells are empty.
pub const INCOMPLETE_SUFFIX: &str = "withemptycells";

const DATE_FORMAT: &str = "%d/%m/%Y";
const NEEDS_REVIEW: &str = "CONTROLEREN";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub required: bool,
}

const fn column(name: &'static str, required: bool) -> Column {
    Column { name, required }
}

pub const COLUMNS: [Column; 30] = [
    column("boekjaar_boekjaar (H)", true),
    column("dagboek_dagboek (H)", true),
    column("factuur (H)", true),
    column("periode_periode (H)", true),
    column("btwregimes_btwregime (H)", true),
    column("factdat (H)", true),
    column("relaties_code (H)", true),
    column("vervdat (H)", true),
    column("omschrijving (H)", false),
    column("valuta_code (H)", true),
    column("koers (H)", false),
    column("vertegenw_code (H)", false),
    column("tebet (H)", true),
    column("statusfact_status (H)", true),
    column("codefcbd_codefcbd (H)", true),
    column("kortcont (H)", false),
    column("bedragkc (H)", false),
    column("basis (H)", true),
    column("btwtebet (H)", true),
    column("betvoorw_code (H)", false),
    column("ogm (H)", false),
    column("kredbep (H)", false),
    column("driehoeksverkeer (H)", false),
    column("boekhpl_reknr (D)", true),
    column("omschr (D)", false),
    column("datum (D)", true),
    column("bedrag (D)", true),
    column("btwcodes_btwcode (D)", true),
    column("code (A)", false),
    column("bedrag (A)", false),
];

#[derive(Debug, Clone, PartialEq)]
pub enum OutputCell {
    Empty,
    Text(String),
    Number(f64),
}

impl OutputCell {
    fn text(value: &str) -> Self {
        if value.trim().is_empty() {
            OutputCell::Empty
        } else {
            OutputCell::Text(value.to_string())
        }
    }

    fn optional(value: Option<&str>) -> Self {
        value.map(Self::text).unwrap_or(OutputCell::Empty)
    }

    /// Codes that consist of digits only are written as numbers.
    fn code(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(code) if !code.is_empty() && code.chars().all(|c| c.is_ascii_digit()) => code
                .parse::<u64>()
                .map(|number| OutputCell::Number(number as f64))
                .unwrap_or_else(|_| OutputCell::text(code)),
            other => Self::optional(other),
        }
    }

    fn amount(value: Decimal) -> Self {
        value
            .to_f64()
            .map(OutputCell::Number)
            .unwrap_or_else(|| OutputCell::Text(value.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, OutputCell::Empty)
    }
}

/// The cells of one output row, in [COLUMNS] order.
pub fn record_cells(document: &Document) -> Vec<OutputCell> {
    use OutputCell::Empty;

    let date = document.date.format(DATE_FORMAT).to_string();
    let ledger_account = match &document.ledger_account {
        LedgerAccount::Account(account) => OutputCell::code(Some(account.as_str())),
        LedgerAccount::NeedsReview => OutputCell::Text(NEEDS_REVIEW.to_string()),
    };
    let vat_code = document.vat_code().to_string();
    vec![
        OutputCell::code(document.fiscal_year.as_deref()),
        OutputCell::optional(document.journal.as_deref()),
        OutputCell::code(document.number.as_deref()),
        OutputCell::text(&document.period()),
        OutputCell::text(VAT_REGIME),
        OutputCell::text(&date),
        OutputCell::optional(document.relation_code.as_deref()),
        OutputCell::text(&document.due_date.format(DATE_FORMAT).to_string()),
        OutputCell::text(&document.description),
        OutputCell::text(CURRENCY),
        Empty,
        Empty,
        OutputCell::amount(document.amount_payable),
        OutputCell::text(STATUS),
        OutputCell::text(document.kind.code()),
        Empty,
        Empty,
        OutputCell::amount(document.base_amount),
        OutputCell::amount(document.vat_payable()),
        Empty,
        Empty,
        Empty,
        Empty,
        ledger_account,
        Empty,
        OutputCell::text(&date),
        OutputCell::amount(document.base_amount),
        OutputCell::code(Some(vat_code.as_str())),
        Empty,
        Empty,
    ]
}

/// Excel column name for a 1-based column index: 1 is A, 27 is AA.
pub fn column_letter(mut index: usize) -> String {
    let mut letters = Vec::new();
    while index > 0 {
        let remainder = (index - 1) % 26;
        letters.push(char::from(b'A' + remainder as u8));
        index = (index - 1) / 26;
    }
    letters.iter().rev().collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingCell {
    pub column: &'static str,
    pub letter: String,
    /// Row as shown in a spreadsheet program, the header being row 1
    pub row: usize,
}

impl Display for MissingCell {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Missing value in cell '{}' at location: ({}, {})",
            self.column, self.letter, self.row
        )
    }
}

/// Empty required cells, column by column.
pub fn missing_cells(rows: &[Vec<OutputCell>]) -> Vec<MissingCell> {
    let mut missing = vec![];
    for (index, column) in COLUMNS.iter().enumerate() {
        if !column.required {
            continue;
        }
        for (row_index, row) in rows.iter().enumerate() {
            if row.get(index).map_or(true, OutputCell::is_empty) {
                missing.push(MissingCell {
                    column: column.name,
                    letter: column_letter(index + 1),
                    row: row_index + 2,
                });
            }
        }
    }
    missing
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportStatus {
    Complete,
    /// Written anyway, under the [INCOMPLETE_SUFFIX] name
    Incomplete { missing: Vec<MissingCell> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutcome {
    pub path: PathBuf,
    pub status: ExportStatus,
    /// The missing values report, if anything needed reporting
    pub report: Option<PathBuf>,
}

/// Writes `<stem><suffix>.xlsx` into `folder`. When required cells are empty
/// the file is named `<stem>withemptycells.xlsx` instead, and the empty cells
/// go to the missing values report together with `notes`.
pub fn export(
    documents: &[Document],
    folder: &Path,
    stem: &str,
    suffix: &str,
    notes: &[String],
) -> Result<ExportOutcome> {
    let rows: Vec<Vec<OutputCell>> = documents.iter().map(record_cells).collect();
    let missing = missing_cells(&rows);
    let (status, suffix) = if missing.is_empty() {
        (ExportStatus::Complete, suffix)
    } else {
        log::warn!("{} required cells are empty", missing.len());
        (ExportStatus::Incomplete { missing }, INCOMPLETE_SUFFIX)
    };
    let path = folder.join(format!("{stem}{suffix}.xlsx"));
    write_workbook(&rows, &path)?;

    let missing_lines: &[MissingCell] = match &status {
        ExportStatus::Complete => &[],
        ExportStatus::Incomplete { missing } => missing,
    };
    let report = report::write_missing_values(folder, missing_lines, notes)?;
    Ok(ExportOutcome {
        path,
        status,
        report,
    })
}

fn write_workbook(rows: &[Vec<OutputCell>], path: &Path) -> Result<()> {
    log::info!("Writing {}...", path.display());
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    for (col, column) in COLUMNS.iter().enumerate() {
        worksheet
            .write_string(0, col as u16, column.name)
            .with_context(|| anyhow!("Failed to write header {}", column.name))?;
    }
    for (index, row) in rows.iter().enumerate() {
        let row_number = (index + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            match cell {
                OutputCell::Empty => {}
                OutputCell::Text(text) => {
                    worksheet.write_string(row_number, col as u16, text)?;
                }
                OutputCell::Number(number) => {
                    worksheet.write_number(row_number, col as u16, *number)?;
                }
            }
        }
    }
    workbook
        .save(path)
        .with_context(|| anyhow!("Failed to save {}", path.display()))?;
    log::info!("Writing {}...done", path.display());
    Ok(())
}
