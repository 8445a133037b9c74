use anyhow::{anyhow, Context as _, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::path::Path;

use super::{Answer, Prompter};
use crate::normalize::{clean_name, ledger_key};

/// Answers supplied up front in a YAML file, for runs without an operator.
///
/// ```yaml
/// relation_codes:
///   Residence Zon: G500
/// ledger_accounts:
///   x900: 700060
/// ```
///
/// Keys are matched after cleaning, the same way the reference tables match.
/// Numbers may be written unquoted; codes with leading zeros must be quoted.
/// Anything not in the file is skipped and stays unresolved.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AnswerFile {
    #[serde(default, deserialize_with = "scalar_map")]
    relation_codes: HashMap<String, String>,
    #[serde(default, deserialize_with = "scalar_map")]
    ledger_accounts: HashMap<String, String>,
}

#[derive(Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Integer(u64),
}

impl From<Scalar> for String {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::Text(text) => text,
            Scalar::Integer(number) => number.to_string(),
        }
    }
}

fn scalar_map<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let map = HashMap::<Scalar, Scalar>::deserialize(deserializer)?;
    Ok(map
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect())
}

impl AnswerFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| anyhow!("Failed to read answers file {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| anyhow!("Failed to parse answers file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let parsed: AnswerFile = serde_yaml::from_str(content)?;
        Ok(Self {
            relation_codes: parsed
                .relation_codes
                .into_iter()
                .map(|(name, code)| (clean_name(&name), code))
                .collect(),
            ledger_accounts: parsed
                .ledger_accounts
                .into_iter()
                .map(|(code, account)| (ledger_key(&code), account))
                .collect(),
        })
    }

    fn answer(table: &HashMap<String, String>, key: &str) -> Answer {
        match table.get(key) {
            Some(code) => Answer::Code(code.clone()),
            None => Answer::Skip,
        }
    }
}

impl Prompter for AnswerFile {
    fn ask_relation_code(&mut self, name: &str, _position: usize, _total: usize) -> Result<Answer> {
        Ok(Self::answer(&self.relation_codes, &clean_name(name)))
    }

    fn ask_ledger_account(
        &mut self,
        relation_code: &str,
        _position: usize,
        _total: usize,
    ) -> Result<Answer> {
        Ok(Self::answer(&self.ledger_accounts, &ledger_key(relation_code)))
    }
}

#[cfg(test)]
mod tests {
    use common_macros::hash_map;

    use super::*;

    #[test]
    fn answers_by_cleaned_key() {
        let mut answers = AnswerFile::parse(
            "relation_codes:\n  \"Résidence  Zon\": G500\nledger_accounts:\n  X900: \"700060\"\n",
        )
        .unwrap();

        assert_eq!(
            Answer::Code("G500".to_string()),
            answers.ask_relation_code("Residence Zon", 1, 1).unwrap()
        );
        assert_eq!(
            Answer::Code("700060".to_string()),
            answers.ask_ledger_account("x900", 1, 1).unwrap()
        );
        assert_eq!(Answer::Skip, answers.ask_relation_code("Parkhof", 1, 1).unwrap());
    }

    #[test]
    fn accepts_unquoted_numbers() {
        let mut answers = AnswerFile::parse(
            "relation_codes:\n  Zon: 2201\nledger_accounts:\n  x900: 700060\n  2201: 700070\n",
        )
        .unwrap();

        assert_eq!(
            Answer::Code("2201".to_string()),
            answers.ask_relation_code("Zon", 1, 1).unwrap()
        );
        assert_eq!(
            Answer::Code("700060".to_string()),
            answers.ask_ledger_account("X900", 1, 1).unwrap()
        );
        assert_eq!(
            Answer::Code("700070".to_string()),
            answers.ask_ledger_account("2201", 1, 1).unwrap()
        );
    }

    #[test]
    fn sections_are_optional() {
        let mut answers = AnswerFile::parse("relation_codes:\n  Zon: G1\n").unwrap();
        assert_eq!(Answer::Skip, answers.ask_ledger_account("G1", 1, 1).unwrap());
    }

    #[test]
    fn accepts_what_serde_writes() {
        let answers = AnswerFile {
            relation_codes: hash_map!["Zon".to_string() => "G1".to_string()],
            ledger_accounts: hash_map![],
        };
        let parsed = AnswerFile::parse(&serde_yaml::to_string(&answers).unwrap()).unwrap();
        assert_eq!(answers.relation_codes, parsed.relation_codes);
        assert!(parsed.ledger_accounts.is_empty());
    }
}
