mod builder;
mod vat;

pub use builder::{build_documents, Batch, BuildRules, InvoiceNumbers, SourceRow};
pub use vat::VatCode;

use chrono::{Datelike as _, NaiveDate};
use rust_decimal::Decimal;

pub const VAT_REGIME: &str = "H";
pub const CURRENCY: &str = "EUR";
pub const STATUS: &str = "OK";

/// Ledger accounts by the first letter of the relation code.
const LEDGER_ACCOUNTS_BY_PREFIX: &[(char, &str)] = &[
    ('H', "700010"),
    ('D', "700020"),
    ('L', "700030"),
    ('G', "700040"),
    ('R', "700050"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerAccount {
    Account(String),
    /// No rule applied. Must be looked up or asked before the record is complete.
    NeedsReview,
}

impl LedgerAccount {
    pub fn for_relation_code(relation_code: &str) -> Self {
        let Some(first) = relation_code.trim().chars().next() else {
            return LedgerAccount::NeedsReview;
        };
        LEDGER_ACCOUNTS_BY_PREFIX
            .iter()
            .find(|(prefix, _)| *prefix == first)
            .map(|(_, account)| LedgerAccount::Account(account.to_string()))
            .unwrap_or(LedgerAccount::NeedsReview)
    }

    pub fn account(&self) -> Option<&str> {
        match self {
            LedgerAccount::Account(account) => Some(account),
            LedgerAccount::NeedsReview => None,
        }
    }
}

/// How a format assigns ledger accounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerRule {
    Fixed(String),
    ByRelationPrefix,
}

impl LedgerRule {
    pub fn apply(&self, relation_code: Option<&str>) -> LedgerAccount {
        match (self, relation_code) {
            (LedgerRule::Fixed(account), _) => LedgerAccount::Account(account.clone()),
            (LedgerRule::ByRelationPrefix, Some(code)) => LedgerAccount::for_relation_code(code),
            (LedgerRule::ByRelationPrefix, None) => LedgerAccount::NeedsReview,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceKind {
    Invoice,
    CreditNote,
}

impl InvoiceKind {
    pub fn code(self) -> &'static str {
        match self {
            InvoiceKind::Invoice => "F",
            InvoiceKind::CreditNote => "C",
        }
    }
}

/// One record of the accounting import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub source_row: usize,
    pub fiscal_year: Option<String>,
    pub journal: Option<String>,
    pub number: Option<String>,
    pub date: NaiveDate,
    pub due_date: NaiveDate,
    pub relation_code: Option<String>,
    /// Always non-negative
    pub amount_payable: Decimal,
    /// Always non-negative
    pub base_amount: Decimal,
    pub kind: InvoiceKind,
    pub description: String,
    pub ledger_account: LedgerAccount,
}

impl Document {
    pub fn period(&self) -> String {
        format!("{:02}", self.date.month())
    }

    pub fn vat_payable(&self) -> Decimal {
        self.amount_payable - self.base_amount
    }

    pub fn vat_code(&self) -> VatCode {
        VatCode::derive(self.amount_payable, self.base_amount)
    }

    /// The invoice number without leading zeros, if it is numeric.
    pub fn numeric_number(&self) -> Option<u64> {
        self.number
            .as_deref()
            .map(str::trim)
            .filter(|number| !number.is_empty() && number.chars().all(|c| c.is_ascii_digit()))
            .and_then(|number| number.parse().ok())
    }
}

/// Sorts by invoice number as text. Records without a number go last.
pub fn sort_by_number(documents: &mut [Document]) {
    documents.sort_by(|a, b| match (&a.number, &b.number) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

/// Sorts by the numeric value of the invoice number. Non-numeric ones go last.
pub fn sort_by_numeric_number(documents: &mut [Document]) {
    documents.sort_by_key(|document| {
        let number = document.numeric_number();
        (number.is_none(), number)
    });
}

#[cfg(test)]
pub(crate) mod testutils {
    use super::*;

    pub fn document(number: Option<&str>) -> Document {
        Document {
            source_row: 2,
            fiscal_year: Some("2024".to_string()),
            journal: Some("VK".to_string()),
            number: number.map(str::to_string),
            date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2024, 4, 4).unwrap(),
            relation_code: Some("H2201".to_string()),
            amount_payable: Decimal::new(121, 0),
            base_amount: Decimal::new(100, 0),
            kind: InvoiceKind::Invoice,
            description: String::new(),
            ledger_account: LedgerAccount::Account("700002".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::testutils::document;
    use super::*;

    #[rstest]
    #[case("H2201", LedgerAccount::Account("700010".to_string()))]
    #[case("D17", LedgerAccount::Account("700020".to_string()))]
    #[case("L3", LedgerAccount::Account("700030".to_string()))]
    #[case("G100", LedgerAccount::Account("700040".to_string()))]
    #[case("R9", LedgerAccount::Account("700050".to_string()))]
    #[case("X900", LedgerAccount::NeedsReview)]
    #[case("h2201", LedgerAccount::NeedsReview)]
    #[case("", LedgerAccount::NeedsReview)]
    fn ledger_account_by_prefix(#[case] code: &str, #[case] expected: LedgerAccount) {
        assert_eq!(expected, LedgerAccount::for_relation_code(code));
    }

    #[test]
    fn ledger_rule() {
        assert_eq!(
            LedgerAccount::Account("700010".to_string()),
            LedgerRule::ByRelationPrefix.apply(Some("H2201"))
        );
        assert_eq!(
            LedgerAccount::NeedsReview,
            LedgerRule::ByRelationPrefix.apply(None)
        );
        assert_eq!(
            LedgerAccount::Account("700002".to_string()),
            LedgerRule::Fixed("700002".to_string()).apply(Some("H2201"))
        );
    }

    #[test]
    fn derived_fields() {
        let document = document(Some("00123"));
        assert_eq!("03", document.period());
        assert_eq!(Decimal::new(21, 0), document.vat_payable());
        assert_eq!(VatCode::Code(4), document.vat_code());
        assert_eq!(Some(123), document.numeric_number());
    }

    #[test]
    fn sorting() {
        let mut documents = vec![
            document(Some("010")),
            document(None),
            document(Some("9")),
            document(Some("A1")),
        ];
        sort_by_numeric_number(&mut documents);
        let numbers: Vec<Option<&str>> = documents.iter().map(|d| d.number.as_deref()).collect();
        assert_eq!(vec![Some("9"), Some("010"), None, Some("A1")], numbers);

        sort_by_number(&mut documents);
        let numbers: Vec<Option<&str>> = documents.iter().map(|d| d.number.as_deref()).collect();
        assert_eq!(vec![Some("010"), Some("9"), Some("A1"), None], numbers);
    }
}
