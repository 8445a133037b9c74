//! The three supported input layouts. Each adapter checks the columns it needs,
//! turns sheet rows into typed rows and knows how its records are parsed.

mod billit;
mod erelonen;
mod rappels;

pub use billit::{parse_order_number, BillitInput, BillitRow, OrderNumber};
pub use erelonen::{parse_erelonen_number, ErelonenNumber, ErelonenRow, Period};
pub use rappels::RappelsRow;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fmt::{self, Display, Formatter};

use crate::document::{sort_by_number, sort_by_numeric_number, Document, InvoiceNumbers};
use crate::error::{RowErrorReason, SchemaError};
use crate::sheet::{Cell, SheetRow, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Billit,
    Erelonen,
    Rappels,
}

impl Format {
    pub fn name(self) -> &'static str {
        match self {
            Format::Billit => "Billit",
            Format::Erelonen => "Erelonen",
            Format::Rappels => "Rappels",
        }
    }

    pub fn sort(self, documents: &mut [Document]) {
        match self {
            Format::Billit | Format::Erelonen => sort_by_numeric_number(documents),
            Format::Rappels => sort_by_number(documents),
        }
    }

    /// Suffix of the output file name for a run without empty required cells.
    pub fn file_suffix(self, invoice_numbers: &InvoiceNumbers) -> String {
        match self {
            Format::Billit => "billit".to_string(),
            Format::Erelonen => invoice_numbers.lowest().unwrap_or("erelonen").to_string(),
            Format::Rappels => "rappels".to_string(),
        }
    }
}

impl Display for Format {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn check_columns(table: &Table, format: Format, required: &[&str]) -> Result<(), SchemaError> {
    let missing = table.missing_columns(required);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(SchemaError {
            format: format.name(),
            missing,
        })
    }
}

/// Index of a column that [check_columns] has already confirmed.
fn column(table: &Table, name: &str) -> usize {
    table.column(name).unwrap_or(usize::MAX)
}

fn text(row: &SheetRow, column: Option<usize>) -> Option<String> {
    column.and_then(|column| row.get(column).as_text())
}

fn required_date(value: &Cell, column: &'static str) -> Result<NaiveDate, RowErrorReason> {
    value.as_date().ok_or(RowErrorReason::InvalidDate(column))
}

/// Amounts are booked without sign; credit notes are marked by their invoice code.
fn required_amount(value: &Cell, column: &'static str) -> Result<Decimal, RowErrorReason> {
    value
        .as_amount()
        .map(|amount| amount.abs())
        .ok_or(RowErrorReason::InvalidAmount(column))
}
