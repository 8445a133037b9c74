use anyhow::{bail, Context as _, Result};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use super::{file, Entry, ReferenceKind};
use crate::error::{Conflict, DataConsistencyError};

/// A name to code mapping backed by a semicolon separated file.
///
/// Lookups and new entries go through [ReferenceKind::normalize_key], so a
/// name recorded during a run is found again by any spelling that cleans to
/// the same key. New entries are appended to the file immediately.
#[derive(Debug)]
pub struct ReferenceStore {
    kind: ReferenceKind,
    path: PathBuf,
    entries: Vec<Entry>,
    index: HashMap<String, String>,
}

impl ReferenceStore {
    /// Loads the table, creating an empty one (header only) if the file doesn't exist.
    pub fn open(path: &Path, kind: ReferenceKind) -> Result<Self> {
        let entries = match file::load(path, kind)? {
            Some(entries) => entries,
            None => {
                log::info!(
                    "{} not found, creating it with header {};{}",
                    path.display(),
                    kind.key_header(),
                    kind.value_header(),
                );
                file::save(&[], path, kind)?;
                vec![]
            }
        };
        Ok(Self::new(path.to_path_buf(), kind, entries))
    }

    fn new(path: PathBuf, kind: ReferenceKind, entries: Vec<Entry>) -> Self {
        let mut store = Self {
            kind,
            path,
            entries: vec![],
            index: HashMap::new(),
        };
        store.set_entries(entries);
        store
    }

    fn set_entries(&mut self, entries: Vec<Entry>) {
        let mut index = HashMap::new();
        for entry in &entries {
            index
                .entry(entry.name.clone())
                .or_insert_with(|| entry.code.clone());
        }
        self.entries = entries;
        self.index = index;
    }

    pub fn kind(&self) -> ReferenceKind {
        self.kind
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fails if any name maps to more than one distinct code. Several names
    /// sharing a code is fine.
    pub fn validate(&self) -> Result<(), DataConsistencyError> {
        let mut codes_by_name: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for entry in &self.entries {
            codes_by_name
                .entry(entry.name.as_str())
                .or_default()
                .insert(entry.code.as_str());
        }
        let conflicts: Vec<Conflict> = codes_by_name
            .into_iter()
            .filter(|(_, codes)| codes.len() > 1)
            .map(|(name, codes)| Conflict {
                name: name.to_string(),
                codes: codes.into_iter().map(str::to_string).collect(),
            })
            .collect();
        if conflicts.is_empty() {
            log::info!(
                "Reference file {} is valid, no name has more than one {}",
                self.path.display(),
                self.kind.value_header(),
            );
            Ok(())
        } else {
            Err(DataConsistencyError {
                file: self.path.display().to_string(),
                conflicts,
            })
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.index
            .get(&self.kind.normalize_key(name))
            .map(String::as_str)
    }

    /// Adds a mapping and appends it to the backing file before returning.
    pub fn record(&mut self, name: &str, code: &str) -> Result<()> {
        let entry = Entry::new(self.kind, name, code);
        match self.index.get(&entry.name) {
            Some(existing) if *existing == entry.code => return Ok(()),
            Some(existing) => bail!(
                "'{}' is already mapped to {} {}, refusing to add {}",
                entry.name,
                self.kind.value_header(),
                existing,
                entry.code,
            ),
            None => {}
        }
        file::append(&self.path, &entry)
            .with_context(|| format!("Failed to append to {}", self.path.display()))?;
        log::info!(
            "Recorded {} '{}' => {}",
            self.kind.value_header(),
            entry.name,
            entry.code
        );
        self.index.insert(entry.name.clone(), entry.code.clone());
        self.entries.push(entry);
        Ok(())
    }

    /// Entries whose name and code contain the given substrings, case-insensitively.
    pub fn search<'a>(
        &'a self,
        name: Option<&'a str>,
        code: Option<&'a str>,
    ) -> impl Iterator<Item = &'a Entry> + 'a {
        let name = name.map(|name| name.trim().to_lowercase());
        let code = code.map(|code| code.trim().to_lowercase());
        self.entries.iter().filter(move |entry| {
            name.as_ref()
                .map_or(true, |name| entry.name.to_lowercase().contains(name))
                && code
                    .as_ref()
                    .map_or(true, |code| entry.code.to_lowercase().contains(code))
        })
    }

    /// Drops rows that repeat an earlier (name, code) pair. Returns how many were dropped.
    pub fn remove_duplicates(&mut self) -> usize {
        let mut seen = HashSet::new();
        let before = self.entries.len();
        let entries: Vec<Entry> = self
            .entries
            .drain(..)
            .filter(|entry| seen.insert(entry.clone()))
            .collect();
        self.set_entries(entries);
        before - self.entries.len()
    }

    /// The table as file content, for editing.
    pub fn to_text(&self) -> Result<String> {
        file::render(&self.entries, self.kind)
    }

    /// Replaces all entries with the parsed text. The new content must validate.
    pub fn replace_from_text(&mut self, text: &str) -> Result<()> {
        let entries = file::parse(text, self.kind)?;
        let candidate = Self::new(self.path.clone(), self.kind, entries);
        candidate.validate()?;
        self.set_entries(candidate.entries);
        Ok(())
    }

    /// Rewrites the whole file from memory.
    pub fn save(&self) -> Result<()> {
        file::save(&self.entries, &self.path, self.kind)
    }
}
