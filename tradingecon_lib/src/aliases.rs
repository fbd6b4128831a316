//! Canonical names for macro indicators.
//!
//! The site labels the same series several ways ("CPI Inflation",
//! "Inflation YoY", ...). The alias table is compiled in from
//! `seed_data/indicator_aliases.yml` and parsed once.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::Deserialize;
use thiserror::Error;

use crate::numeric::collapse_whitespace;

#[derive(Error, Debug)]
pub enum AliasError {
    #[error("Failed to parse indicator alias YAML: {0}")]
    YamlParse(#[from] serde_yml::Error),
    #[error("Duplicate label in alias file: {0}")]
    DuplicateLabel(String),
}

#[derive(Deserialize, Debug)]
pub struct AliasFile {
    pub aliases: Vec<AliasGroup>,
}

/// All labels that name one canonical indicator.
#[derive(Deserialize, Debug, Clone)]
pub struct AliasGroup {
    pub canonical: String,
    pub labels: Vec<String>,
}

/// Lookup from lowercase label to canonical indicator name.
#[derive(Debug, Clone, Default)]
pub struct IndicatorAliases {
    map: HashMap<String, String>,
}

impl IndicatorAliases {
    /// Parses an alias table. Labels are matched case-insensitively.
    pub fn parse(yaml_content: &str) -> Result<Self, AliasError> {
        let file: AliasFile = serde_yml::from_str(yaml_content)?;

        let mut map = HashMap::new();
        for group in file.aliases {
            for label in group.labels {
                let key = collapse_whitespace(&label).to_lowercase();
                if map.contains_key(&key) {
                    return Err(AliasError::DuplicateLabel(key));
                }
                map.insert(key, group.canonical.clone());
            }
        }
        Ok(Self { map })
    }

    /// Loads the embedded table.
    pub fn load() -> Result<Self, AliasError> {
        Self::parse(include_str!("../../seed_data/indicator_aliases.yml"))
    }

    /// Maps a raw label to its canonical name, or returns the cleaned label.
    pub fn canonicalize(&self, raw: &str) -> String {
        let cleaned = collapse_whitespace(raw);
        self.map
            .get(&cleaned.to_lowercase())
            .cloned()
            .unwrap_or(cleaned)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Process-wide embedded alias table.
///
/// A broken embedded file degrades to an empty table (labels pass through
/// unchanged) and is logged once.
pub fn embedded() -> &'static IndicatorAliases {
    static TABLE: OnceLock<IndicatorAliases> = OnceLock::new();
    TABLE.get_or_init(|| {
        IndicatorAliases::load().unwrap_or_else(|e| {
            tracing::error!("Indicator alias table unavailable: {}", e);
            IndicatorAliases::default()
        })
    })
}
