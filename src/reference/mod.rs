mod file;
mod store;

pub use store::ReferenceStore;

use crate::normalize::{clean_name, ledger_key};

/// The two mapping tables the converter keeps on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// Name of a building/customer to its relation code
    RelationCodes,
    /// Relation code to the ledger account that code books on
    LedgerAccounts,
}

impl ReferenceKind {
    pub fn key_header(self) -> &'static str {
        match self {
            ReferenceKind::RelationCodes => "Name",
            ReferenceKind::LedgerAccounts => "Code",
        }
    }

    pub fn value_header(self) -> &'static str {
        match self {
            ReferenceKind::RelationCodes => "Relatiecode",
            ReferenceKind::LedgerAccounts => "Grootboekrekening",
        }
    }

    pub fn normalize_key(self, key: &str) -> String {
        match self {
            ReferenceKind::RelationCodes => clean_name(key),
            ReferenceKind::LedgerAccounts => ledger_key(key),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Entry {
    pub name: String,
    pub code: String,
}

impl Entry {
    pub fn new(kind: ReferenceKind, name: &str, code: &str) -> Self {
        Self {
            name: kind.normalize_key(name),
            code: code.trim().to_string(),
        }
    }
}
