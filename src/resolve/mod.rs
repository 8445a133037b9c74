//! Fills in relation codes and ledger accounts the reference tables don't know yet.
//!
//! Every distinct missing key is asked for exactly once through a [Prompter], the answer is
//! written to the reference file right away and then applied to all rows sharing that key.

mod answers;

pub use answers::AnswerFile;

use anyhow::Result;
use std::collections::HashSet;

use crate::document::{Document, LedgerAccount};
use crate::normalize::ledger_key;
use crate::reference::ReferenceStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Code(String),
    /// The prompter has no answer for this key. The rows stay unresolved.
    Skip,
}

/// Where answers for missing codes come from: an operator at a terminal, a
/// dialog, or a mapping supplied up front.
pub trait Prompter {
    /// `position` is 1-based, out of `total` distinct names still missing.
    fn ask_relation_code(&mut self, name: &str, position: usize, total: usize) -> Result<Answer>;

    fn ask_ledger_account(
        &mut self,
        relation_code: &str,
        position: usize,
        total: usize,
    ) -> Result<Answer>;
}

/// A row that gets its relation code by matching a name against the relation table.
pub trait RelationTarget {
    /// The name to look up, as it appears in the input
    fn lookup_name(&self) -> Option<&str>;
    fn relation_code(&self) -> Option<&str>;
    fn set_relation_code(&mut self, code: String);
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Rows filled from the reference table without asking
    pub from_reference: usize,
    /// Distinct keys that were answered through the prompter
    pub answered: Vec<String>,
    /// Distinct keys that are still missing after asking
    pub unresolved: Vec<String>,
}

pub fn resolve_relation_codes<T: RelationTarget>(
    rows: &mut [T],
    store: &mut ReferenceStore,
    prompter: &mut dyn Prompter,
) -> Result<Resolution> {
    let kind = store.kind();
    let mut resolution = Resolution::default();

    for row in rows.iter_mut() {
        if row.relation_code().is_some() {
            continue;
        }
        if let Some(code) = row.lookup_name().and_then(|name| store.lookup(name)) {
            row.set_relation_code(code.to_string());
            resolution.from_reference += 1;
        }
    }

    let missing = distinct(
        rows.iter()
            .filter(|row| row.relation_code().is_none())
            .filter_map(|row| row.lookup_name())
            .map(|name| kind.normalize_key(name))
            .filter(|key| !key.is_empty()),
    );
    let total = missing.len();
    if total > 0 {
        log::info!("{} names without a relation code", total);
    }

    for (index, key) in missing.into_iter().enumerate() {
        let position = index + 1;
        log::info!("Entering relation code {position} of {total} for {key}");
        let Some(code) = ask_until_not_empty(|| prompter.ask_relation_code(&key, position, total))?
        else {
            log::warn!("No relation code for '{key}', leaving it empty");
            resolution.unresolved.push(key);
            continue;
        };
        store.record(&key, &code)?;
        for row in rows.iter_mut() {
            let matches = row.relation_code().is_none()
                && row
                    .lookup_name()
                    .is_some_and(|name| kind.normalize_key(name) == key);
            if matches {
                row.set_relation_code(code.clone());
            }
        }
        resolution.answered.push(key);
    }

    if total > 0 {
        log::info!("All missing relation codes have been handled");
    }
    Ok(resolution)
}

/// Settles records whose ledger account needs review: first through the
/// ledger table (keyed by relation code), then by asking.
pub fn resolve_ledger_accounts(
    documents: &mut [Document],
    store: &mut ReferenceStore,
    prompter: &mut dyn Prompter,
) -> Result<Resolution> {
    let mut resolution = Resolution::default();

    let missing = distinct(
        documents
            .iter()
            .filter(|document| document.ledger_account == LedgerAccount::NeedsReview)
            .filter_map(|document| document.relation_code.as_deref())
            .map(ledger_key)
            .filter(|key| !key.is_empty()),
    );
    let total = missing.len();

    for (index, key) in missing.into_iter().enumerate() {
        let position = index + 1;
        let account = match store.lookup(&key) {
            Some(existing) => {
                log::info!("Using existing ledger account for {key}: {existing}");
                resolution.from_reference += 1;
                existing.to_string()
            }
            None => {
                let Some(account) =
                    ask_until_not_empty(|| prompter.ask_ledger_account(&key, position, total))?
                else {
                    log::warn!("No ledger account for '{key}', record needs review");
                    resolution.unresolved.push(key);
                    continue;
                };
                store.record(&key, &account)?;
                resolution.answered.push(key.clone());
                account
            }
        };
        for document in documents.iter_mut() {
            let matches = document.ledger_account == LedgerAccount::NeedsReview
                && document
                    .relation_code
                    .as_deref()
                    .is_some_and(|code| ledger_key(code) == key);
            if matches {
                document.ledger_account = LedgerAccount::Account(account.clone());
            }
        }
    }

    Ok(resolution)
}

fn ask_until_not_empty(mut ask: impl FnMut() -> Result<Answer>) -> Result<Option<String>> {
    loop {
        match ask()? {
            Answer::Code(code) if code.trim().is_empty() => {
                log::warn!("Empty answer, asking again");
            }
            Answer::Code(code) => return Ok(Some(code.trim().to_string())),
            Answer::Skip => return Ok(None),
        }
    }
}

/// Keeps the first occurrence of every key, in input order.
fn distinct(keys: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    keys.filter(|key| seen.insert(key.clone())).collect()
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::fs;

    use super::*;
    use crate::document::testutils::document;
    use crate::reference::ReferenceKind;

    #[derive(Default)]
    struct ScriptedPrompter {
        answers: VecDeque<Answer>,
        asked: Vec<(String, usize, usize)>,
    }

    impl ScriptedPrompter {
        fn new(answers: &[&str]) -> Self {
            Self {
                answers: answers
                    .iter()
                    .map(|answer| Answer::Code(answer.to_string()))
                    .collect(),
                asked: vec![],
            }
        }

        fn next(&mut self, key: &str, position: usize, total: usize) -> Result<Answer> {
            self.asked.push((key.to_string(), position, total));
            Ok(self.answers.pop_front().unwrap_or(Answer::Skip))
        }
    }

    impl Prompter for ScriptedPrompter {
        fn ask_relation_code(&mut self, name: &str, position: usize, total: usize) -> Result<Answer> {
            self.next(name, position, total)
        }

        fn ask_ledger_account(
            &mut self,
            relation_code: &str,
            position: usize,
            total: usize,
        ) -> Result<Answer> {
            self.next(relation_code, position, total)
        }
    }

    #[derive(Debug, PartialEq)]
    struct Row {
        name: Option<&'static str>,
        code: Option<String>,
    }

    impl Row {
        fn named(name: &'static str) -> Self {
            Self {
                name: Some(name),
                code: None,
            }
        }
    }

    impl RelationTarget for Row {
        fn lookup_name(&self) -> Option<&str> {
            self.name
        }

        fn relation_code(&self) -> Option<&str> {
            self.code.as_deref()
        }

        fn set_relation_code(&mut self, code: String) {
            self.code = Some(code);
        }
    }

    fn store(content: &str, kind: ReferenceKind) -> (tempfile::TempDir, ReferenceStore) {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("reference.csv");
        fs::write(&path, content).unwrap();
        let store = ReferenceStore::open(&path, kind).unwrap();
        (tempdir, store)
    }

    #[test]
    fn asks_once_per_distinct_name_and_persists() {
        let (dir, mut store) = store(
            "Name;Relatiecode\nDe Linde;H1\n",
            ReferenceKind::RelationCodes,
        );
        let mut rows = vec![
            Row::named("De Linde"),
            Row::named("Résidence Zon"),
            Row::named("Residence  Zon"),
            Row::named("Parkhof"),
        ];
        let mut prompter = ScriptedPrompter::new(&["G500", "H7"]);

        let resolution = resolve_relation_codes(&mut rows, &mut store, &mut prompter).unwrap();

        assert_eq!(
            vec![
                ("Residence Zon".to_string(), 1, 2),
                ("Parkhof".to_string(), 2, 2)
            ],
            prompter.asked
        );
        let codes: Vec<Option<&str>> = rows.iter().map(|row| row.code.as_deref()).collect();
        assert_eq!(
            vec![Some("H1"), Some("G500"), Some("G500"), Some("H7")],
            codes
        );
        assert_eq!(1, resolution.from_reference);
        assert_eq!(Some("G500"), store.lookup("Résidence Zon"));
        assert_eq!(
            "Name;Relatiecode\nDe Linde;H1\nResidence Zon;G500\nParkhof;H7\n",
            fs::read_to_string(dir.path().join("reference.csv")).unwrap()
        );
    }

    #[test]
    fn empty_answer_is_asked_again() {
        let (_dir, mut store) = store("Name;Relatiecode\n", ReferenceKind::RelationCodes);
        let mut rows = vec![Row::named("Zon")];
        let mut prompter = ScriptedPrompter::new(&["", "  ", "G1"]);

        resolve_relation_codes(&mut rows, &mut store, &mut prompter).unwrap();

        assert_eq!(3, prompter.asked.len());
        assert_eq!(Some("G1".to_string()), rows[0].code);
    }

    #[test]
    fn skipped_names_stay_unresolved() {
        let (_dir, mut store) = store("Name;Relatiecode\n", ReferenceKind::RelationCodes);
        let mut rows = vec![Row::named("Zon"), Row::named("Maan")];
        let mut prompter = ScriptedPrompter::new(&["G1"]);

        let resolution = resolve_relation_codes(&mut rows, &mut store, &mut prompter).unwrap();

        assert_eq!(vec!["Maan".to_string()], resolution.unresolved);
        assert_eq!(None, rows[1].code);
        assert_eq!(None, store.lookup("Maan"));
    }

    #[test]
    fn present_codes_are_kept() {
        let (_dir, mut store) = store(
            "Name;Relatiecode\nZon;G1\n",
            ReferenceKind::RelationCodes,
        );
        let mut rows = vec![Row {
            name: Some("Zon"),
            code: Some("G9".to_string()),
        }];
        let mut prompter = ScriptedPrompter::default();

        resolve_relation_codes(&mut rows, &mut store, &mut prompter).unwrap();

        assert_eq!(Some("G9".to_string()), rows[0].code);
        assert!(prompter.asked.is_empty());
    }

    #[test]
    fn ledger_accounts_from_table_then_prompt() {
        let (dir, mut store) = store(
            "Code;Grootboekrekening\nx900;700060\n",
            ReferenceKind::LedgerAccounts,
        );
        let mut documents = vec![
            document(Some("1")),
            document(Some("2")),
            document(Some("3")),
            document(Some("4")),
        ];
        documents[0].relation_code = Some("X900".to_string());
        documents[0].ledger_account = LedgerAccount::NeedsReview;
        documents[1].relation_code = Some("Z1".to_string());
        documents[1].ledger_account = LedgerAccount::NeedsReview;
        documents[2].relation_code = Some("z1".to_string());
        documents[2].ledger_account = LedgerAccount::NeedsReview;
        let mut prompter = ScriptedPrompter::new(&["700099"]);

        let resolution = resolve_ledger_accounts(&mut documents, &mut store, &mut prompter).unwrap();

        assert_eq!(vec![("z1".to_string(), 2, 2)], prompter.asked);
        assert_eq!(1, resolution.from_reference);
        let accounts: Vec<Option<&str>> = documents
            .iter()
            .map(|document| document.ledger_account.account())
            .collect();
        assert_eq!(
            vec![
                Some("700060"),
                Some("700099"),
                Some("700099"),
                Some("700002")
            ],
            accounts
        );
        assert_eq!(
            "Code;Grootboekrekening\nx900;700060\nz1;700099\n",
            fs::read_to_string(dir.path().join("reference.csv")).unwrap()
        );
    }
}
