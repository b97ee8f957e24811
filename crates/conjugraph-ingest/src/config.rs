//! Configuration for the conjugraph converters.

use std::str::FromStr;

use serde::Deserialize;

/// Top-level ingest configuration.
///
/// Loaded from `conjugraph.toml` `[ingest]` section or
/// `CONJUGRAPH__INGEST__` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    /// How participle branches pick the gender they hang off.
    #[serde(default)]
    pub participle_genders: ParticipleGenders,

    /// Default script path for the generic tree converter.
    #[serde(default = "default_tree_output")]
    pub tree_output: String,
}

/// Gender resolution for participle branches.
///
/// Participle data is keyed `participle → gender → number`, with no person
/// level. The gender node written directly under a participle tense can come
/// from two places.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ParticipleGenders {
    /// Reuse the tense and gender most recently bound by the finite-tense
    /// loops (the masdar step rebinds the tense to `masdar`). One gender
    /// node per participle, keyed under that carried tense; numbers are then
    /// read from the participle under the carried gender.
    #[default]
    Carried,
    /// Write one gender node per gender key found under the participle.
    PerKey,
}

impl FromStr for ParticipleGenders {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "carried" => Ok(Self::Carried),
            "per-key" | "per_key" => Ok(Self::PerKey),
            _ => Err(format!(
                "Invalid participle gender mode: {s}. Choose: carried, per-key"
            )),
        }
    }
}

fn default_tree_output() -> String {
    "create_graph.cypher".to_string()
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            participle_genders: ParticipleGenders::default(),
            tree_output: default_tree_output(),
        }
    }
}
