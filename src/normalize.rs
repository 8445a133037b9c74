//! Cleaning of free-text names before they are matched against a reference table.

use deunicode::deunicode;

/// Transliterates accents and special characters to ASCII, unifies dashes and
/// collapses whitespace. Applying it twice gives the same result as applying it once.
pub fn clean_name(name: &str) -> String {
    deunicode(&name.replace(['\u{2013}', '\u{2014}'], "-"))
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Key used for the ledger account table, which matches case-insensitively.
pub fn ledger_key(code: &str) -> String {
    clean_name(code).to_lowercase()
}
