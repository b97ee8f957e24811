//! Morphology levels of the conjugation graph.
//!
//! Every node written by the schema-aware converter belongs to one of these
//! levels. A level knows its node label, the property name it contributes to
//! the keys of its descendants, and the relationship type that leads into it.

use serde::{Deserialize, Serialize};

/// Relationship type used by the generic tree converter.
pub const HAS_CHILD: &str = "HAS_CHILD";

/// Label given to generic tree nodes that carry none.
pub const DEFAULT_LABEL: &str = "Node";

// ── Levels ────────────────────────────────────────────────────────

/// A level of the Arabic verb hierarchy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Root,
    Voice,
    Tense,
    Person,
    Gender,
    Number,
    ConjugatedVerb,
}

impl Level {
    /// Neo4j node label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Root => "Root",
            Self::Voice => "Voice",
            Self::Tense => "Tense",
            Self::Person => "Person",
            Self::Gender => "Gender",
            Self::Number => "Number",
            Self::ConjugatedVerb => "ConjugatedVerb",
        }
    }

    /// Property name under which this level's value appears in descendant keys.
    pub fn property(&self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Voice => "voice",
            Self::Tense => "tense",
            Self::Person => "person",
            Self::Gender => "gender",
            Self::Number => "number",
            Self::ConjugatedVerb => "conjugated_verb",
        }
    }

    /// Cypher variable used for nodes of this level inside a statement.
    pub fn variable(&self) -> &'static str {
        match self {
            Self::Root => "r",
            Self::Voice => "v",
            Self::Tense => "t",
            Self::Person => "p",
            Self::Gender => "g",
            Self::Number => "n",
            Self::ConjugatedVerb => "c",
        }
    }

    /// Relationship type from the parent level into this one.
    ///
    /// `None` for the root, which has no parent.
    pub fn relationship(&self) -> Option<&'static str> {
        match self {
            Self::Root => None,
            Self::Voice => Some("VOICED_AS"),
            Self::Tense => Some("TENSED_AS"),
            Self::Person => Some("PERSONED_AS"),
            Self::Gender => Some("GENDERED_AS"),
            Self::Number => Some("NUMBERED_AS"),
            Self::ConjugatedVerb => Some("CONJUGATED_AS"),
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
