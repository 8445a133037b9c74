use chrono::{Datelike as _, Duration};

use super::{check_columns, column, required_amount, required_date, text, Format};
use crate::document::{BuildRules, Document, InvoiceKind, SourceRow};
use crate::error::{RowErrorReason, SchemaError};
use crate::resolve::RelationTarget;
use crate::sheet::{Cell, Table};

const BUILDING: &str = "Gebouw";
const RELATION_CODE: &str = "Relatiecode";
const TOTAL_GROSS: &str = "Totaal brutto";
const TOTAL_NET: &str = "Totaal netto";
const DOCUMENT_DATE: &str = "Documentdatum";
/// Either of these names holds the invoice number
const INVOICE_NUMBER_COLUMNS: &[&str] = &["Factuurnr", "Factuurnummer"];

const REQUIRED_COLUMNS: &[&str] = &[
    BUILDING,
    RELATION_CODE,
    TOTAL_GROSS,
    TOTAL_NET,
    "Totaal BTW",
    "Doc nr",
    DOCUMENT_DATE,
];

const JOURNAL: &str = "VK4";
/// Characters in front of the sequence number
const NUMBER_PREFIX_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct RappelsRow {
    row: usize,
    building: Option<String>,
    relation_code: Option<String>,
    invoice_number: Option<String>,
    total_gross: Cell,
    total_net: Cell,
    document_date: Cell,
}

impl RappelsRow {
    pub fn from_table(table: &Table) -> Result<Vec<RappelsRow>, SchemaError> {
        let invoice_number = INVOICE_NUMBER_COLUMNS
            .iter()
            .find_map(|name| table.column(name));
        let mut required = REQUIRED_COLUMNS.to_vec();
        if invoice_number.is_none() {
            required.push(INVOICE_NUMBER_COLUMNS[0]);
        }
        check_columns(table, Format::Rappels, &required)?;
        let building = table.column(BUILDING);
        let relation_code = table.column(RELATION_CODE);
        let total_gross = column(table, TOTAL_GROSS);
        let total_net = column(table, TOTAL_NET);
        let document_date = column(table, DOCUMENT_DATE);

        Ok(table
            .rows()
            .iter()
            .map(|row| RappelsRow {
                row: row.number,
                building: text(row, building),
                relation_code: text(row, relation_code),
                invoice_number: text(row, invoice_number),
                total_gross: row.get(total_gross).clone(),
                total_net: row.get(total_net).clone(),
                document_date: row.get(document_date).clone(),
            })
            .collect())
    }
}

fn sequence_number(invoice: &str) -> Result<String, RowErrorReason> {
    let number: String = invoice.trim().chars().skip(NUMBER_PREFIX_LEN).collect();
    if number.is_empty() {
        Err(RowErrorReason::MalformedInvoiceNumber(invoice.to_string()))
    } else {
        Ok(number)
    }
}

impl SourceRow for RappelsRow {
    fn row_number(&self) -> usize {
        self.row
    }

    fn invoice(&self) -> Option<String> {
        self.invoice_number.clone()
    }

    fn to_document(&self, rules: &BuildRules) -> Result<Document, RowErrorReason> {
        let date = required_date(&self.document_date, DOCUMENT_DATE)?;
        let number = match &self.invoice_number {
            Some(invoice) => Some(sequence_number(invoice)?),
            None => None,
        };
        Ok(Document {
            source_row: self.row,
            fiscal_year: Some(date.year().to_string()),
            journal: Some(JOURNAL.to_string()),
            number,
            date,
            due_date: Duration::try_days(rules.due_days)
                .and_then(|days| date.checked_add_signed(days))
                .ok_or(RowErrorReason::DueDateOutOfRange(rules.due_days))?,
            relation_code: self.relation_code.clone(),
            amount_payable: required_amount(&self.total_gross, TOTAL_GROSS)?,
            base_amount: required_amount(&self.total_net, TOTAL_NET)?,
            kind: InvoiceKind::Invoice,
            description: String::new(),
            ledger_account: rules.ledger.apply(self.relation_code.as_deref()),
        })
    }
}

/// The relation code column wins; the building name is only looked up when it is empty.
impl RelationTarget for RappelsRow {
    fn lookup_name(&self) -> Option<&str> {
        self.building.as_deref()
    }

    fn relation_code(&self) -> Option<&str> {
        self.relation_code.as_deref()
    }

    fn set_relation_code(&mut self, code: String) {
        self.relation_code = Some(code);
    }
}
