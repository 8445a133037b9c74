use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::document::{BuildRules, LedgerRule};
use crate::formats::Format;

pub const DEFAULT_CONFIG_PATH: &str = "factuur-import.yaml";

const MAX_DUE_DAYS: i64 = 3650;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub relation_codes_file: PathBuf,
    pub ledger_accounts_file: PathBuf,
    pub output_folder: PathBuf,
    /// Rows above the (empty) header row of an Erelonen export
    pub erelonen_header_rows: usize,
    pub billit_ledger_account: String,
    pub rappels_ledger_account: String,
    pub rappels_due_days: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            relation_codes_file: PathBuf::from("relatiecodes.csv"),
            ledger_accounts_file: PathBuf::from("grootboekrekeningen.csv"),
            output_folder: PathBuf::from("."),
            erelonen_header_rows: 2,
            billit_ledger_account: "700002".to_string(),
            rappels_ledger_account: "700002".to_string(),
            rappels_due_days: 15,
        }
    }
}

impl Config {
    /// Loads the config file. A file that doesn't exist gives the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| anyhow!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| anyhow!("Failed to parse config file {}", path.display()))?;
        config
            .validate()
            .with_context(|| anyhow!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, path) in [
            ("relation_codes_file", &self.relation_codes_file),
            ("ledger_accounts_file", &self.ledger_accounts_file),
            ("output_folder", &self.output_folder),
        ] {
            if path.as_os_str().is_empty() {
                bail!("{name} must not be empty");
            }
        }
        for (name, account) in [
            ("billit_ledger_account", &self.billit_ledger_account),
            ("rappels_ledger_account", &self.rappels_ledger_account),
        ] {
            if account.is_empty() || !account.chars().all(|c| c.is_ascii_digit()) {
                bail!("{name} must be a numeric account, got '{account}'");
            }
        }
        if !(0..=MAX_DUE_DAYS).contains(&self.rappels_due_days) {
            bail!(
                "rappels_due_days must be between 0 and {MAX_DUE_DAYS}, got {}",
                self.rappels_due_days
            );
        }
        Ok(())
    }

    pub fn build_rules(&self, format: Format) -> BuildRules {
        let ledger = match format {
            Format::Billit => LedgerRule::Fixed(self.billit_ledger_account.clone()),
            Format::Erelonen => LedgerRule::ByRelationPrefix,
            Format::Rappels => LedgerRule::Fixed(self.rappels_ledger_account.clone()),
        };
        BuildRules {
            ledger,
            due_days: self.rappels_due_days,
        }
    }
}
