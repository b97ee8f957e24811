//! Conjugation document model and hierarchy accessors.
//!
//! The document is a single-key JSON object whose key is the verb root:
//!
//! ```text
//! { root: { voice: { tense:      { person: { gender: { number: form } } },
//!                    participle: { gender: { number: form } },
//!                    "masdar":   { "default": form, "alternates": [form, ...] } } } }
//! ```
//!
//! Source key order is preserved and is the traversal order.

use std::fs;
use std::io::Read;
use std::path::Path;

use serde_json::{Map, Value};

use conjugraph_core::cypher::json_text;

use crate::error::Result;

/// Reserved tense key holding the verbal noun.
pub const MASDAR: &str = "masdar";
/// Key of the masdar's primary surface form.
pub const MASDAR_DEFAULT: &str = "default";
/// Key of the masdar's alternate surface forms.
pub const MASDAR_ALTERNATES: &str = "alternates";

/// Lookup failures against the expected hierarchy.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("Document has no root key")]
    EmptyDocument,

    #[error("Expected a JSON object at {path}")]
    NotAMapping { path: String },

    #[error("Missing key '{key}' under {path}")]
    MissingKey { path: String, key: String },

    #[error("Unexpected value at {path}: expected {expected}")]
    UnexpectedShape {
        path: String,
        expected: &'static str,
    },

    #[error("Participle '{participle}' under voice '{voice}' has no gender bound by a preceding finite tense")]
    NoFiniteContext { voice: String, participle: String },
}

/// How a key directly under a voice is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenseKind {
    /// Inflected for person, gender, and number.
    Finite,
    /// Inflected for gender and number only.
    Participle,
    /// Excluded from the finite and participle loops.
    Masdar,
}

impl TenseKind {
    /// Classify by case-insensitive substring: `participle` wins over `masdar`.
    pub fn classify(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.contains("participle") {
            Self::Participle
        } else if lower.contains(MASDAR) {
            Self::Masdar
        } else {
            Self::Finite
        }
    }
}

/// A loaded conjugation document.
#[derive(Debug, Clone)]
pub struct ConjugationDocument {
    root: String,
    voices: Map<String, Value>,
}

impl ConjugationDocument {
    /// Build from parsed JSON. The first top-level key is the verb root.
    pub fn from_value(value: Value) -> std::result::Result<Self, DocumentError> {
        let Value::Object(top) = value else {
            return Err(DocumentError::NotAMapping {
                path: "<document>".to_string(),
            });
        };

        let (root, voices) = top.into_iter().next().ok_or(DocumentError::EmptyDocument)?;
        let Value::Object(voices) = voices else {
            return Err(DocumentError::NotAMapping { path: root });
        };

        Ok(Self { root, voices })
    }

    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let value: Value = serde_json::from_reader(reader)?;
        Ok(Self::from_value(value)?)
    }

    /// Read a UTF-8 JSON document from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path.as_ref())?;
        let value: Value = serde_json::from_str(&json)?;
        Ok(Self::from_value(value)?)
    }

    // ── Level Accessors ──────────────────────────────────────────

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn voices(&self) -> Vec<String> {
        self.voices.keys().cloned().collect()
    }

    /// Finite tenses of a voice, in source order.
    pub fn tenses(&self, voice: &str) -> std::result::Result<Vec<String>, DocumentError> {
        self.keys_of_kind(voice, TenseKind::Finite)
    }

    /// Participle keys of a voice, in source order.
    pub fn participles(&self, voice: &str) -> std::result::Result<Vec<String>, DocumentError> {
        self.keys_of_kind(voice, TenseKind::Participle)
    }

    pub fn persons(&self, voice: &str, tense: &str) -> std::result::Result<Vec<String>, DocumentError> {
        self.keys(&[voice, tense])
    }

    pub fn genders(
        &self,
        voice: &str,
        tense: &str,
        person: &str,
    ) -> std::result::Result<Vec<String>, DocumentError> {
        self.keys(&[voice, tense, person])
    }

    pub fn numbers(
        &self,
        voice: &str,
        tense: &str,
        person: &str,
        gender: &str,
    ) -> std::result::Result<Vec<String>, DocumentError> {
        self.keys(&[voice, tense, person, gender])
    }

    pub fn participle_genders(
        &self,
        voice: &str,
        participle: &str,
    ) -> std::result::Result<Vec<String>, DocumentError> {
        self.keys(&[voice, participle])
    }

    pub fn participle_numbers(
        &self,
        voice: &str,
        participle: &str,
        gender: &str,
    ) -> std::result::Result<Vec<String>, DocumentError> {
        self.keys(&[voice, participle, gender])
    }

    // ── Surface Forms ────────────────────────────────────────────

    pub fn conjugated_verb(
        &self,
        voice: &str,
        tense: &str,
        person: &str,
        gender: &str,
        number: &str,
    ) -> std::result::Result<String, DocumentError> {
        self.surface_form(&[voice, tense, person, gender], number)
    }

    pub fn participle_conjugated_verb(
        &self,
        voice: &str,
        participle: &str,
        gender: &str,
        number: &str,
    ) -> std::result::Result<String, DocumentError> {
        self.surface_form(&[voice, participle, gender], number)
    }

    pub fn masdar_default(&self, voice: &str) -> std::result::Result<String, DocumentError> {
        self.surface_form(&[voice, MASDAR], MASDAR_DEFAULT)
    }

    pub fn masdar_alternates(&self, voice: &str) -> std::result::Result<Vec<String>, DocumentError> {
        let parents = [voice, MASDAR];
        match self.lookup(&parents, MASDAR_ALTERNATES)? {
            Value::Array(items) => Ok(items.iter().map(json_text).collect()),
            _ => Err(DocumentError::UnexpectedShape {
                path: self.describe(&[voice, MASDAR, MASDAR_ALTERNATES]),
                expected: "a list of surface forms",
            }),
        }
    }

    // ── Navigation ───────────────────────────────────────────────

    fn keys_of_kind(
        &self,
        voice: &str,
        kind: TenseKind,
    ) -> std::result::Result<Vec<String>, DocumentError> {
        Ok(self
            .keys(&[voice])?
            .into_iter()
            .filter(|name| TenseKind::classify(name) == kind)
            .collect())
    }

    fn keys(&self, path: &[&str]) -> std::result::Result<Vec<String>, DocumentError> {
        Ok(self.mapping(path)?.keys().cloned().collect())
    }

    /// Walk to the object at `path` (relative to the root's voices).
    fn mapping(&self, path: &[&str]) -> std::result::Result<&Map<String, Value>, DocumentError> {
        let mut current = &self.voices;
        for (depth, key) in path.iter().enumerate() {
            current = match self.lookup_in(current, &path[..depth], key)? {
                Value::Object(map) => map,
                _ => {
                    return Err(DocumentError::NotAMapping {
                        path: self.describe(&path[..=depth]),
                    })
                }
            };
        }
        Ok(current)
    }

    fn lookup(&self, parents: &[&str], key: &str) -> std::result::Result<&Value, DocumentError> {
        let map = self.mapping(parents)?;
        self.lookup_in(map, parents, key)
    }

    fn lookup_in<'a>(
        &self,
        map: &'a Map<String, Value>,
        parents: &[&str],
        key: &str,
    ) -> std::result::Result<&'a Value, DocumentError> {
        map.get(key).ok_or_else(|| DocumentError::MissingKey {
            path: self.describe(parents),
            key: key.to_string(),
        })
    }

    fn surface_form(&self, parents: &[&str], key: &str) -> std::result::Result<String, DocumentError> {
        match self.lookup(parents, key)? {
            Value::Object(_) | Value::Array(_) => {
                let mut path = parents.to_vec();
                path.push(key);
                Err(DocumentError::UnexpectedShape {
                    path: self.describe(&path),
                    expected: "a surface form",
                })
            }
            scalar => Ok(json_text(scalar)),
        }
    }

    fn describe(&self, path: &[&str]) -> String {
        std::iter::once(self.root.as_str())
            .chain(path.iter().copied())
            .collect::<Vec<_>>()
            .join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> ConjugationDocument {
        ConjugationDocument::from_value(json!({
            "كتب": {
                "active": {
                    "past": {"first": {"masculine": {"singular": "كتبتُ"}}},
                    "Active Participle": {"masculine": {"singular": "كاتب"}},
                    "masdar": {"default": "كتابة", "alternates": ["كتب", "كتاب"]},
                    "present": {"third": {"feminine": {"plural": "يكتبن"}}}
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_classify_tense_names() {
        assert_eq!(TenseKind::classify("past"), TenseKind::Finite);
        assert_eq!(TenseKind::classify("Passive Participle"), TenseKind::Participle);
        assert_eq!(TenseKind::classify("ACTIVE_PARTICIPLE"), TenseKind::Participle);
        assert_eq!(TenseKind::classify("Masdar"), TenseKind::Masdar);
        assert_eq!(TenseKind::classify("masdar participle"), TenseKind::Participle);
    }

    #[test]
    fn test_tense_partitions_preserve_order() {
        let d = doc();
        assert_eq!(d.root(), "كتب");
        assert_eq!(d.voices(), vec!["active"]);
        assert_eq!(d.tenses("active").unwrap(), vec!["past", "present"]);
        assert_eq!(d.participles("active").unwrap(), vec!["Active Participle"]);
    }

    #[test]
    fn test_level_lookups() {
        let d = doc();
        assert_eq!(d.persons("active", "past").unwrap(), vec!["first"]);
        assert_eq!(d.genders("active", "past", "first").unwrap(), vec!["masculine"]);
        assert_eq!(
            d.numbers("active", "past", "first", "masculine").unwrap(),
            vec!["singular"]
        );
        assert_eq!(
            d.conjugated_verb("active", "past", "first", "masculine", "singular").unwrap(),
            "كتبتُ"
        );
        assert_eq!(
            d.participle_numbers("active", "Active Participle", "masculine").unwrap(),
            vec!["singular"]
        );
        assert_eq!(
            d.participle_conjugated_verb("active", "Active Participle", "masculine", "singular")
                .unwrap(),
            "كاتب"
        );
    }

    #[test]
    fn test_masdar_lookups() {
        let d = doc();
        assert_eq!(d.masdar_default("active").unwrap(), "كتابة");
        assert_eq!(d.masdar_alternates("active").unwrap(), vec!["كتب", "كتاب"]);
    }

    #[test]
    fn test_missing_key_reports_path() {
        let d = doc();
        let err = d.persons("active", "future").unwrap_err();
        match err {
            DocumentError::MissingKey { path, key } => {
                assert_eq!(path, "كتب/active");
                assert_eq!(key, "future");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_leaf_is_not_a_mapping() {
        let d = doc();
        let err = d
            .keys(&["active", "past", "first", "masculine", "singular"])
            .unwrap_err();
        assert!(matches!(err, DocumentError::NotAMapping { ref path } if path.ends_with("singular")));
    }

    #[test]
    fn test_alternates_must_be_a_list() {
        let d = ConjugationDocument::from_value(json!({
            "r": {"active": {"masdar": {"default": "x", "alternates": "y"}}}
        }))
        .unwrap();
        assert!(matches!(
            d.masdar_alternates("active"),
            Err(DocumentError::UnexpectedShape { .. })
        ));
    }

    #[test]
    fn test_document_shape_errors() {
        assert!(matches!(
            ConjugationDocument::from_value(json!({})),
            Err(DocumentError::EmptyDocument)
        ));
        assert!(matches!(
            ConjugationDocument::from_value(json!([1, 2])),
            Err(DocumentError::NotAMapping { .. })
        ));
        assert!(matches!(
            ConjugationDocument::from_value(json!({"r": "flat"})),
            Err(DocumentError::NotAMapping { .. })
        ));
    }

    #[test]
    fn test_first_key_is_root() {
        let d = ConjugationDocument::from_reader(
            r#"{"قرأ": {"active": {}}, "كتب": {"passive": {}}}"#.as_bytes(),
        )
        .unwrap();
        assert_eq!(d.root(), "قرأ");
        assert_eq!(d.voices(), vec!["active"]);
    }
}
