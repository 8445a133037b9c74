use chrono::{Datelike as _, NaiveDate};

use super::{check_columns, column, required_amount, required_date, text, Format};
use crate::document::{BuildRules, Document, InvoiceKind, SourceRow};
use crate::error::{RowErrorReason, SchemaError};
use crate::resolve::RelationTarget;
use crate::sheet::{Cell, Table};

const BUILDING: &str = "Gebouw";
const INVOICE_NUMBER: &str = "Factuurnr";
const TOTAL_GROSS: &str = "Totaal brutto";
const TOTAL_NET: &str = "Totaal netto";
const DUE_DATE: &str = "Vervaldag";
const DOCUMENT_DATE: &str = "Documentdatum";
const RELATION_CODE: &str = "Relatiecode";

/// The export has no usable header row, its columns come in this order.
const POSITIONAL_COLUMNS: &[&str] = &[
    BUILDING,
    INVOICE_NUMBER,
    TOTAL_GROSS,
    TOTAL_NET,
    "Totaal BTW",
    DUE_DATE,
    "Betaald",
    "Documentnummer",
    DOCUMENT_DATE,
];

const REQUIRED_COLUMNS: &[&str] = &[
    BUILDING,
    INVOICE_NUMBER,
    TOTAL_GROSS,
    TOTAL_NET,
    DUE_DATE,
    DOCUMENT_DATE,
];

const INVOICE_PREFIX: &str = "AF";
const NUMBER_SEPARATOR: char = '/';
/// Characters in front of the sequence number, after the separator
const NUMBER_PREFIX_LEN: usize = 2;
const JOURNALS: &[(&str, &str)] = &[("AF1", "VK2"), ("AF2", "VK3")];

/// Month filter on the document date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn contains(self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErelonenNumber {
    pub journal: String,
    pub number: String,
}

/// Splits `AF1/XX00456` into journal `VK2` and number `456`.
pub fn parse_erelonen_number(invoice: &str) -> Result<ErelonenNumber, RowErrorReason> {
    let malformed = || RowErrorReason::MalformedInvoiceNumber(invoice.to_string());
    let Some((journal, tail)) = invoice.trim().split_once(NUMBER_SEPARATOR) else {
        return Err(malformed());
    };
    if tail.contains(NUMBER_SEPARATOR) {
        return Err(malformed());
    }
    let sequence: String = tail.trim().chars().skip(NUMBER_PREFIX_LEN).collect();
    if sequence.is_empty() {
        return Err(malformed());
    }
    let number = match sequence.trim_start_matches('0') {
        "" => "0".to_string(),
        number => number.to_string(),
    };
    let journal = JOURNALS
        .iter()
        .find(|(from, _)| *from == journal)
        .map(|(_, to)| to.to_string())
        .unwrap_or_else(|| journal.to_string());
    Ok(ErelonenNumber { journal, number })
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErelonenRow {
    row: usize,
    building: Option<String>,
    invoice_number: String,
    relation_code: Option<String>,
    total_gross: Cell,
    total_net: Cell,
    due_date: Cell,
    document_date: Cell,
}

impl ErelonenRow {
    /// Keeps only `AF` invoices, and of those only the ones in `period` when given.
    /// Rows with an unreadable document date are kept so they get reported.
    pub fn from_table(
        mut table: Table,
        period: Option<Period>,
    ) -> Result<Vec<ErelonenRow>, SchemaError> {
        table.rename_positional(POSITIONAL_COLUMNS);
        check_columns(&table, Format::Erelonen, REQUIRED_COLUMNS)?;
        let building = table.column(BUILDING);
        let invoice_number = table.column(INVOICE_NUMBER);
        let relation_code = table.column(RELATION_CODE);
        let total_gross = column(&table, TOTAL_GROSS);
        let total_net = column(&table, TOTAL_NET);
        let due_date = column(&table, DUE_DATE);
        let document_date = column(&table, DOCUMENT_DATE);

        let mut rows = vec![];
        let mut skipped = 0;
        for row in table.rows() {
            let Some(invoice) = text(row, invoice_number).filter(|i| i.starts_with(INVOICE_PREFIX))
            else {
                skipped += 1;
                continue;
            };
            let date = row.get(document_date);
            if let (Some(period), Some(date)) = (period, date.as_date()) {
                if !period.contains(date) {
                    skipped += 1;
                    continue;
                }
            }
            rows.push(ErelonenRow {
                row: row.number,
                building: text(row, building),
                invoice_number: invoice,
                relation_code: text(row, relation_code),
                total_gross: row.get(total_gross).clone(),
                total_net: row.get(total_net).clone(),
                due_date: row.get(due_date).clone(),
                document_date: date.clone(),
            });
        }
        log::info!("Kept {} Erelonen rows, filtered out {}", rows.len(), skipped);
        Ok(rows)
    }
}

impl SourceRow for ErelonenRow {
    fn row_number(&self) -> usize {
        self.row
    }

    fn invoice(&self) -> Option<String> {
        Some(self.invoice_number.clone())
    }

    fn to_document(&self, rules: &BuildRules) -> Result<Document, RowErrorReason> {
        let date = required_date(&self.document_date, DOCUMENT_DATE)?;
        let due_date = required_date(&self.due_date, DUE_DATE)?;
        let number = parse_erelonen_number(&self.invoice_number)?;
        Ok(Document {
            source_row: self.row,
            fiscal_year: Some(date.year().to_string()),
            journal: Some(number.journal),
            number: Some(number.number),
            date,
            due_date,
            relation_code: self.relation_code.clone(),
            amount_payable: required_amount(&self.total_gross, TOTAL_GROSS)?,
            base_amount: required_amount(&self.total_net, TOTAL_NET)?,
            kind: InvoiceKind::Invoice,
            description: String::new(),
            ledger_account: rules.ledger.apply(self.relation_code.as_deref()),
        })
    }
}

impl RelationTarget for ErelonenRow {
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

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use rust_decimal::Decimal;

    use super::*;
    use crate::document::{LedgerAccount, LedgerRule};

    #[rstest]
    #[case("AF1/XX00456", "VK2", "456")]
    #[case("AF2/XX12", "VK3", "12")]
    #[case("AF3/XX077", "AF3", "77")]
    #[case("AF1/XX000", "VK2", "0")]
    fn splits_invoice_number(#[case] input: &str, #[case] journal: &str, #[case] number: &str) {
        assert_eq!(
            Ok(ErelonenNumber {
                journal: journal.to_string(),
                number: number.to_string(),
            }),
            parse_erelonen_number(input)
        );
    }

    #[rstest]
    fn rejects_malformed_invoice_number(#[values("AF100456", "AF1/X", "AF1/XX1/2")] input: &str) {
        assert_eq!(
            Err(RowErrorReason::MalformedInvoiceNumber(input.to_string())),
            parse_erelonen_number(input)
        );
    }

    fn table(rows: Vec<Vec<Cell>>) -> Table {
        let mut all = vec![
            vec![Cell::text("Erelonen per gebouw")],
            vec![],
            vec![Cell::Empty; 9],
        ];
        all.extend(rows);
        Table::from_rows(all, 2)
    }

    fn row(building: &str, invoice: &str, date: &str) -> Vec<Cell> {
        vec![
            Cell::text(building),
            Cell::text(invoice),
            Cell::Number(-121.0),
            Cell::Number(-100.0),
            Cell::Number(-21.0),
            Cell::text("15/04/2024"),
            Cell::Empty,
            Cell::text("D1"),
            Cell::text(date),
        ]
    }

    #[test]
    fn positional_columns_and_filters() {
        let table = table(vec![
            row("Zon", "AF1/XX00456", "16/03/2024"),
            row("Zon", "VF1/XX00457", "16/03/2024"),
            row("Maan", "AF1/XX00458", "16/02/2024"),
            row("Maan", "AF2/XX00459", "geen datum"),
        ]);

        let rows = ErelonenRow::from_table(
            table,
            Some(Period {
                year: 2024,
                month: 3,
            }),
        )
        .unwrap();

        let kept: Vec<(usize, Option<String>)> =
            rows.iter().map(|row| (row.row, row.invoice())).collect();
        assert_eq!(
            vec![
                (4, Some("AF1/XX00456".to_string())),
                (7, Some("AF2/XX00459".to_string()))
            ],
            kept
        );
        assert_eq!(Some("Zon"), rows[0].lookup_name());
    }

    #[test]
    fn missing_positional_columns() {
        let table = Table::from_rows(
            vec![vec![], vec![], vec![Cell::Empty, Cell::Empty, Cell::Empty]],
            2,
        );
        let err = ErelonenRow::from_table(table, None).unwrap_err();
        assert_eq!(vec![TOTAL_NET, DUE_DATE, DOCUMENT_DATE], err.missing);
    }

    #[test]
    fn builds_document_with_prefix_ledger_account() {
        let table = table(vec![row("Zon", "AF1/XX00456", "16/03/2024")]);
        let mut rows = ErelonenRow::from_table(table, None).unwrap();
        rows[0].set_relation_code("H2201".to_string());
        let rules = BuildRules {
            ledger: LedgerRule::ByRelationPrefix,
            due_days: 15,
        };

        let document = rows[0].to_document(&rules).unwrap();

        assert_eq!(Some("2024"), document.fiscal_year.as_deref());
        assert_eq!(Some("VK2"), document.journal.as_deref());
        assert_eq!(Some("456"), document.number.as_deref());
        assert_eq!(NaiveDate::from_ymd_opt(2024, 4, 15).unwrap(), document.due_date);
        assert_eq!(Decimal::new(121, 0), document.amount_payable);
        assert_eq!(Decimal::new(100, 0), document.base_amount);
        assert_eq!(
            LedgerAccount::Account("700010".to_string()),
            document.ledger_account
        );
    }

    #[test]
    fn unknown_prefix_needs_review() {
        let table = table(vec![row("Zon", "AF1/XX00456", "16/03/2024")]);
        let mut rows = ErelonenRow::from_table(table, None).unwrap();
        rows[0].set_relation_code("X900".to_string());
        let rules = BuildRules {
            ledger: LedgerRule::ByRelationPrefix,
            due_days: 15,
        };

        let document = rows[0].to_document(&rules).unwrap();

        assert_eq!(LedgerAccount::NeedsReview, document.ledger_account);
    }
}
