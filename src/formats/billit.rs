use super::{check_columns, column, required_amount, required_date, text, Format};
use crate::document::{BuildRules, Document, InvoiceKind, SourceRow};
use crate::error::{RowErrorReason, SchemaError};
use crate::resolve::RelationTarget;
use crate::sheet::{Cell, Table};

const ORDER_NUMBER: &str = "Order nummer";
const DATE: &str = "Datum";
const DUE_DATE: &str = "Vervaldag";
const TOTAL_INCL: &str = "Totaal inclusief";
const TOTAL_EXCL: &str = "Totaal exclusief";
const COMPANY: &str = "Bedrijf";
const INVOICE_NUMBER: &str = "Factuurnr";
const DESCRIPTION: &str = "Betreft";
const RELATION_CODE: &str = "Relatiecode";

const REQUIRED_COLUMNS: &[&str] = &[ORDER_NUMBER, DATE, DUE_DATE, TOTAL_INCL, TOTAL_EXCL, COMPANY];

const ORDER_SEPARATOR: char = '-';
const CREDIT_NOTE_JOURNAL: &str = "CN1";
const CREDIT_NOTE_JOURNAL_RENAMED: &str = "CN";
/// Journals Billit is expected to export. Others are converted but logged.
const KNOWN_JOURNALS: &[&str] = &["VK", CREDIT_NOTE_JOURNAL];

/// The parts of a Billit order number like `VK-2024-00123`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderNumber {
    pub journal: Option<String>,
    pub fiscal_year: Option<String>,
    pub number: Option<String>,
    pub kind: InvoiceKind,
}

/// Without a separator the order number carries no parts at all, which is
/// accepted; the record is then flagged for its empty cells on export.
pub fn parse_order_number(order_number: &str) -> Result<OrderNumber, RowErrorReason> {
    let order_number = order_number.trim();
    if !order_number.contains(ORDER_SEPARATOR) {
        return Ok(OrderNumber {
            journal: None,
            fiscal_year: None,
            number: None,
            kind: InvoiceKind::Invoice,
        });
    }
    let parts: Vec<&str> = order_number.split(ORDER_SEPARATOR).collect();
    let [journal, fiscal_year, number] = parts.as_slice() else {
        return Err(RowErrorReason::MalformedInvoiceNumber(
            order_number.to_string(),
        ));
    };
    let non_empty = |part: &str| {
        let part = part.trim();
        (!part.is_empty()).then(|| part.to_string())
    };
    let journal = non_empty(*journal);
    if let Some(journal) = journal.as_deref().filter(|j| !KNOWN_JOURNALS.contains(j)) {
        log::warn!(
            "Unexpected journal '{journal}' in order number {order_number}, converting it as is"
        );
    }
    let (journal, kind) = match journal {
        Some(journal) if journal == CREDIT_NOTE_JOURNAL => (
            Some(CREDIT_NOTE_JOURNAL_RENAMED.to_string()),
            InvoiceKind::CreditNote,
        ),
        journal => (journal, InvoiceKind::Invoice),
    };
    Ok(OrderNumber {
        journal,
        fiscal_year: non_empty(*fiscal_year),
        number: non_empty(*number),
        kind,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct BillitRow {
    row: usize,
    order_number: String,
    company: Option<String>,
    description: Option<String>,
    relation_code: Option<String>,
    date: Cell,
    due_date: Cell,
    total_incl: Cell,
    total_excl: Cell,
}

/// Rows of a Billit export. Rows without an order number can't be booked and
/// are listed separately by their invoice number or row.
#[derive(Debug, Clone, PartialEq)]
pub struct BillitInput {
    pub rows: Vec<BillitRow>,
    pub missing_order_numbers: Vec<String>,
}

impl BillitRow {
    pub fn from_table(table: &Table) -> Result<BillitInput, SchemaError> {
        check_columns(table, Format::Billit, REQUIRED_COLUMNS)?;
        let order_number = column(table, ORDER_NUMBER);
        let date = column(table, DATE);
        let due_date = column(table, DUE_DATE);
        let total_incl = column(table, TOTAL_INCL);
        let total_excl = column(table, TOTAL_EXCL);
        let company = table.column(COMPANY);
        let invoice_number = table.column(INVOICE_NUMBER);
        let description = table.column(DESCRIPTION);
        let relation_code = table.column(RELATION_CODE);

        let mut input = BillitInput {
            rows: vec![],
            missing_order_numbers: vec![],
        };
        for row in table.rows() {
            let invoice = text(row, invoice_number);
            let Some(order) = row.get(order_number).as_text() else {
                let label = invoice.unwrap_or_else(|| format!("Row {}", row.number));
                log::warn!("Missing {ORDER_NUMBER} for factuurnr: {label}");
                input.missing_order_numbers.push(label);
                continue;
            };
            input.rows.push(BillitRow {
                row: row.number,
                order_number: order,
                company: text(row, company),
                description: text(row, description),
                relation_code: text(row, relation_code),
                date: row.get(date).clone(),
                due_date: row.get(due_date).clone(),
                total_incl: row.get(total_incl).clone(),
                total_excl: row.get(total_excl).clone(),
            });
        }
        Ok(input)
    }
}

impl SourceRow for BillitRow {
    fn row_number(&self) -> usize {
        self.row
    }

    fn invoice(&self) -> Option<String> {
        Some(self.order_number.clone())
    }

    fn to_document(&self, rules: &BuildRules) -> Result<Document, RowErrorReason> {
        let order = parse_order_number(&self.order_number)?;
        let date = required_date(&self.date, DATE)?;
        let due_date = required_date(&self.due_date, DUE_DATE)?;
        Ok(Document {
            source_row: self.row,
            fiscal_year: order.fiscal_year,
            journal: order.journal,
            number: order.number,
            date,
            due_date,
            relation_code: self.relation_code.clone(),
            amount_payable: required_amount(&self.total_incl, TOTAL_INCL)?,
            base_amount: required_amount(&self.total_excl, TOTAL_EXCL)?,
            kind: order.kind,
            description: self.description.clone().unwrap_or_default(),
            ledger_account: rules.ledger.apply(self.relation_code.as_deref()),
        })
    }
}

impl RelationTarget for BillitRow {
    fn lookup_name(&self) -> Option<&str> {
        self.company.as_deref()
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
    use chrono::NaiveDate;
    use rstest::rstest;
    use rust_decimal::Decimal;

    use super::*;
    use crate::document::{LedgerAccount, LedgerRule};

    #[rstest]
    #[case("VK-2024-00123", Some("VK"), Some("2024"), Some("00123"), InvoiceKind::Invoice)]
    #[case("CN1-2024-00045", Some("CN"), Some("2024"), Some("00045"), InvoiceKind::CreditNote)]
    #[case(" VK-2023-7 ", Some("VK"), Some("2023"), Some("7"), InvoiceKind::Invoice)]
    #[case("VK2024", None, None, None, InvoiceKind::Invoice)]
    #[case("OF-2024-1", Some("OF"), Some("2024"), Some("1"), InvoiceKind::Invoice)]
    #[case("VK--00123", Some("VK"), None, Some("00123"), InvoiceKind::Invoice)]
    fn splits_order_number(
        #[case] input: &str,
        #[case] journal: Option<&str>,
        #[case] fiscal_year: Option<&str>,
        #[case] number: Option<&str>,
        #[case] kind: InvoiceKind,
    ) {
        let parsed = parse_order_number(input).unwrap();
        assert_eq!(journal, parsed.journal.as_deref());
        assert_eq!(fiscal_year, parsed.fiscal_year.as_deref());
        assert_eq!(number, parsed.number.as_deref());
        assert_eq!(kind, parsed.kind);
    }

    #[rstest]
    fn rejects_wrong_number_of_parts(#[values("VK-2024", "VK-2024-1-2")] input: &str) {
        assert_eq!(
            Err(RowErrorReason::MalformedInvoiceNumber(input.to_string())),
            parse_order_number(input)
        );
    }

    fn table(rows: Vec<Vec<&str>>) -> Table {
        let header = vec![
            ORDER_NUMBER,
            DATE,
            DUE_DATE,
            TOTAL_INCL,
            TOTAL_EXCL,
            COMPANY,
            INVOICE_NUMBER,
            DESCRIPTION,
        ];
        Table::from_rows(
            std::iter::once(header)
                .chain(rows)
                .map(|row| row.into_iter().map(Cell::text).collect())
                .collect(),
            0,
        )
    }

    fn rules() -> BuildRules {
        BuildRules {
            ledger: LedgerRule::Fixed("700002".to_string()),
            due_days: 15,
        }
    }

    #[test]
    fn missing_columns_are_listed() {
        let table = Table::from_rows(
            vec![vec![Cell::text(ORDER_NUMBER), Cell::text(DATE)]],
            0,
        );
        let err = BillitRow::from_table(&table).unwrap_err();
        assert_eq!(
            vec![DUE_DATE, TOTAL_INCL, TOTAL_EXCL, COMPANY],
            err.missing
        );
    }

    #[test]
    fn rows_without_order_number_are_listed() {
        let table = table(vec![
            vec!["", "05/03/2024", "04/04/2024", "121", "100", "Zon", "F-17", ""],
            vec!["", "05/03/2024", "04/04/2024", "121", "100", "Zon", "", ""],
            vec!["VK-2024-00001", "05/03/2024", "04/04/2024", "121", "100", "Zon", "", ""],
        ]);

        let input = BillitRow::from_table(&table).unwrap();

        assert_eq!(1, input.rows.len());
        assert_eq!(
            vec!["F-17".to_string(), "Row 3".to_string()],
            input.missing_order_numbers
        );
    }

    #[test]
    fn builds_credit_note() {
        let table = table(vec![vec![
            "CN1-2024-00045",
            "05/03/2024",
            "04/04/2024",
            "-121,00",
            "-100,00",
            "Résidence Zon",
            "",
            "Creditnota maart",
        ]]);
        let mut input = BillitRow::from_table(&table).unwrap();
        assert_eq!(Some("Résidence Zon"), input.rows[0].lookup_name());
        input.rows[0].set_relation_code("G500".to_string());

        let document = input.rows[0].to_document(&rules()).unwrap();

        assert_eq!(Some("CN"), document.journal.as_deref());
        assert_eq!(Some("2024"), document.fiscal_year.as_deref());
        assert_eq!(Some("00045"), document.number.as_deref());
        assert_eq!(InvoiceKind::CreditNote, document.kind);
        assert_eq!(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(), document.date);
        assert_eq!(NaiveDate::from_ymd_opt(2024, 4, 4).unwrap(), document.due_date);
        assert_eq!(Decimal::new(121, 0), document.amount_payable);
        assert_eq!(Decimal::new(100, 0), document.base_amount);
        assert_eq!(Some("G500"), document.relation_code.as_deref());
        assert_eq!("Creditnota maart", document.description);
        assert_eq!(
            LedgerAccount::Account("700002".to_string()),
            document.ledger_account
        );
    }

    #[test]
    fn invalid_due_date_is_a_row_error() {
        let table = table(vec![vec![
            "VK-2024-00001",
            "05/03/2024",
            "binnenkort",
            "121",
            "100",
            "Zon",
            "",
            "",
        ]]);
        let input = BillitRow::from_table(&table).unwrap();
        assert_eq!(
            Err(RowErrorReason::InvalidDate(DUE_DATE)),
            input.rows[0].to_document(&rules())
        );
    }
}
