//! Schema-aware converter for Arabic verb conjugation documents.
//!
//! Every node is upserted by its own value plus the values of all its
//! ancestors, and every relationship statement re-states both endpoint keys.
//! Re-running a conversion therefore yields the same upsert keys, and
//! replaying the statements never duplicates nodes or relationships.
//!
//! Visitation order per voice: finite tenses (person → gender → number →
//! form), then participles (gender → number → form), then the masdar. Only
//! the masdar step is allowed to fail without aborting the run.

use conjugraph_core::{Level, NodePattern, PropertyValue, Statement, StatementSink};

use crate::config::ParticipleGenders;
use crate::document::{ConjugationDocument, DocumentError, MASDAR};
use crate::error::Result;

/// Non-key property holding the masdar's alternate forms.
pub const ALTERNATIVES: &str = "alternatives";

/// Outcome of a conversion run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkSummary {
    /// Statements handed to the sink.
    pub statements: usize,
    /// ConjugatedVerb node upserts (finite, participle, and masdar).
    pub conjugated_verbs: usize,
    /// Voices whose masdar branch was abandoned.
    pub masdar_skipped: Vec<MasdarSkip>,
}

/// A masdar branch that was skipped, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasdarSkip {
    pub voice: String,
    pub reason: String,
}

/// Converts a `ConjugationDocument` into upsert statements.
pub struct ConjugationWalker<'a> {
    doc: &'a ConjugationDocument,
    participle_genders: ParticipleGenders,
}

impl<'a> ConjugationWalker<'a> {
    pub fn new(doc: &'a ConjugationDocument) -> Self {
        Self {
            doc,
            participle_genders: ParticipleGenders::default(),
        }
    }

    pub fn participle_genders(mut self, mode: ParticipleGenders) -> Self {
        self.participle_genders = mode;
        self
    }

    /// Stream every statement of the document into `sink`, then finish it.
    pub async fn run(&self, sink: &mut dyn StatementSink) -> Result<WalkSummary> {
        let mut walk = Walk {
            doc: self.doc,
            mode: self.participle_genders,
            sink,
            summary: WalkSummary::default(),
            carried: Carried::default(),
        };
        walk.document().await?;
        walk.sink.finish().await?;

        tracing::info!(
            root = %self.doc.root(),
            statements = walk.summary.statements,
            conjugated_verbs = walk.summary.conjugated_verbs,
            masdar_skipped = walk.summary.masdar_skipped.len(),
            "Conjugation document converted"
        );
        Ok(walk.summary)
    }
}

// ── Key Paths ────────────────────────────────────────────────────

/// The ancestor values leading to a position in the hierarchy.
#[derive(Debug, Clone)]
struct KeyPath {
    root: String,
    steps: Vec<(Level, String)>,
}

impl KeyPath {
    fn new(root: &str) -> Self {
        Self {
            root: root.to_string(),
            steps: Vec::new(),
        }
    }

    fn child(&self, level: Level, name: &str) -> Self {
        let mut steps = self.steps.clone();
        steps.push((level, name.to_string()));
        Self {
            root: self.root.clone(),
            steps,
        }
    }

    /// Node pattern for `name` at `level` below this path.
    ///
    /// Key order: `name`, ancestors from the voice downward, then `root`.
    fn node(&self, level: Level, name: &str) -> NodePattern {
        let pattern = NodePattern::new(level.variable(), level.label()).with("name", name);
        let pattern = self
            .steps
            .iter()
            .fold(pattern, |p, (l, value)| p.with(l.property(), value.as_str()));
        if level == Level::Root {
            pattern
        } else {
            pattern.with(Level::Root.property(), self.root.as_str())
        }
    }
}

// ── Traversal ────────────────────────────────────────────────────

/// Loop variables that outlive their loops.
///
/// Carried-gender participles read the tense and gender bound last, across
/// voices.
#[derive(Debug, Default)]
struct Carried {
    tense: Option<String>,
    gender: Option<String>,
}

struct Walk<'a, 's> {
    doc: &'a ConjugationDocument,
    mode: ParticipleGenders,
    sink: &'s mut (dyn StatementSink + 's),
    summary: WalkSummary,
    carried: Carried,
}

impl Walk<'_, '_> {
    async fn document(&mut self) -> Result<()> {
        let doc = self.doc;
        let root = doc.root();
        let base = KeyPath::new(root);
        let root_node = base.node(Level::Root, root);
        self.emit(Statement::merge_node(root_node.clone())).await?;

        for voice in doc.voices() {
            let voice_node = self.upsert(&root_node, &base, Level::Voice, &voice).await?;
            let voice_path = base.child(Level::Voice, &voice);

            self.finite_tenses(&voice, &voice_path, &voice_node).await?;
            self.participles(&voice, &voice_path, &voice_node).await?;
            self.masdar(&voice, &voice_path, &voice_node).await;

            tracing::debug!(voice = %voice, statements = self.summary.statements, "Voice converted");
        }
        Ok(())
    }

    async fn finite_tenses(
        &mut self,
        voice: &str,
        voice_path: &KeyPath,
        voice_node: &NodePattern,
    ) -> Result<()> {
        for tense in self.doc.tenses(voice)? {
            self.carried.tense = Some(tense.clone());
            let tense_node = self.upsert(voice_node, voice_path, Level::Tense, &tense).await?;
            let tense_path = voice_path.child(Level::Tense, &tense);

            for person in self.doc.persons(voice, &tense)? {
                let person_node = self
                    .upsert(&tense_node, &tense_path, Level::Person, &person)
                    .await?;
                let person_path = tense_path.child(Level::Person, &person);

                for gender in self.doc.genders(voice, &tense, &person)? {
                    self.carried.gender = Some(gender.clone());
                    let gender_node = self
                        .upsert(&person_node, &person_path, Level::Gender, &gender)
                        .await?;
                    let gender_path = person_path.child(Level::Gender, &gender);

                    for number in self.doc.numbers(voice, &tense, &person, &gender)? {
                        let number_node = self
                            .upsert(&gender_node, &gender_path, Level::Number, &number)
                            .await?;
                        let form = self
                            .doc
                            .conjugated_verb(voice, &tense, &person, &gender, &number)?;
                        let number_path = gender_path.child(Level::Number, &number);
                        self.upsert(&number_node, &number_path, Level::ConjugatedVerb, &form)
                            .await?;
                    }
                }
            }
        }
        Ok(())
    }

    async fn participles(
        &mut self,
        voice: &str,
        voice_path: &KeyPath,
        voice_node: &NodePattern,
    ) -> Result<()> {
        for participle in self.doc.participles(voice)? {
            let participle_node = self
                .upsert(voice_node, voice_path, Level::Tense, &participle)
                .await?;
            let participle_path = voice_path.child(Level::Tense, &participle);

            match self.mode {
                ParticipleGenders::Carried => {
                    let (Some(tense), Some(gender)) =
                        (self.carried.tense.clone(), self.carried.gender.clone())
                    else {
                        return Err(DocumentError::NoFiniteContext {
                            voice: voice.to_string(),
                            participle,
                        }
                        .into());
                    };
                    // Gender hangs off the carried tense, not the participle.
                    let carried_tense = voice_path.node(Level::Tense, &tense);
                    let carried_path = voice_path.child(Level::Tense, &tense);
                    self.upsert(&carried_tense, &carried_path, Level::Gender, &gender)
                        .await?;
                    self.participle_numbers(voice, &participle, &participle_path, &gender)
                        .await?;
                }
                ParticipleGenders::PerKey => {
                    for gender in self.doc.participle_genders(voice, &participle)? {
                        self.upsert(&participle_node, &participle_path, Level::Gender, &gender)
                            .await?;
                        self.participle_numbers(voice, &participle, &participle_path, &gender)
                            .await?;
                    }
                }
            }
        }
        Ok(())
    }

    async fn participle_numbers(
        &mut self,
        voice: &str,
        participle: &str,
        participle_path: &KeyPath,
        gender: &str,
    ) -> Result<()> {
        let gender_node = participle_path.node(Level::Gender, gender);
        let gender_path = participle_path.child(Level::Gender, gender);

        for number in self.doc.participle_numbers(voice, participle, gender)? {
            let number_node = self
                .upsert(&gender_node, &gender_path, Level::Number, &number)
                .await?;
            let form = self
                .doc
                .participle_conjugated_verb(voice, participle, gender, &number)?;
            let number_path = gender_path.child(Level::Number, &number);
            self.upsert(&number_node, &number_path, Level::ConjugatedVerb, &form)
                .await?;
        }
        Ok(())
    }

    /// Masdar branch: failures are logged and recorded, never propagated.
    async fn masdar(&mut self, voice: &str, voice_path: &KeyPath, voice_node: &NodePattern) {
        self.carried.tense = Some(MASDAR.to_string());

        if let Err(e) = self.try_masdar(voice, voice_path, voice_node).await {
            tracing::warn!(voice = %voice, error = %e, "Skipping masdar branch");
            self.summary.masdar_skipped.push(MasdarSkip {
                voice: voice.to_string(),
                reason: e.to_string(),
            });
        }
    }

    async fn try_masdar(
        &mut self,
        voice: &str,
        voice_path: &KeyPath,
        voice_node: &NodePattern,
    ) -> Result<()> {
        let tense_node = self.upsert(voice_node, voice_path, Level::Tense, MASDAR).await?;
        let masdar_path = voice_path.child(Level::Tense, MASDAR);

        let form = self.doc.masdar_default(voice)?;
        let alternates = self.doc.masdar_alternates(voice)?;

        self.upsert_with(
            &tense_node,
            &masdar_path,
            Level::ConjugatedVerb,
            &form,
            vec![(ALTERNATIVES.to_string(), PropertyValue::List(alternates))],
        )
        .await?;
        Ok(())
    }

    // ── Emission ─────────────────────────────────────────────────

    async fn upsert(
        &mut self,
        parent: &NodePattern,
        path: &KeyPath,
        level: Level,
        name: &str,
    ) -> Result<NodePattern> {
        self.upsert_with(parent, path, level, name, Vec::new()).await
    }

    /// Upsert a node below `path`, then the relationship from `parent` into it.
    async fn upsert_with(
        &mut self,
        parent: &NodePattern,
        path: &KeyPath,
        level: Level,
        name: &str,
        set: Vec<(String, PropertyValue)>,
    ) -> Result<NodePattern> {
        let node = path.node(level, name);
        self.emit(Statement::merge_node_with(node.clone(), set)).await?;

        if let Some(rel_type) = level.relationship() {
            self.emit(Statement::merge_relationship(parent.clone(), rel_type, node.clone()))
                .await?;
        }
        Ok(node)
    }

    async fn emit(&mut self, statement: Statement) -> Result<()> {
        self.sink.execute(&statement).await?;
        self.summary.statements += 1;
        if statement.node_label() == Some(Level::ConjugatedVerb.label()) {
            self.summary.conjugated_verbs += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use conjugraph_core::{MemorySink, SinkError};
    use serde_json::{json, Value};

    use crate::error::IngestError;

    fn document(value: Value) -> ConjugationDocument {
        ConjugationDocument::from_value(value).unwrap()
    }

    fn small() -> ConjugationDocument {
        document(json!({
            "كتب": {
                "active": {
                    "past": {"first": {"masculine": {"singular": "كتبتُ"}}},
                    "masdar": {"default": "كتابة", "alternates": ["كتب"]}
                }
            }
        }))
    }

    /// Two voices, each 2 tenses × 2 persons × 2 genders × 2 numbers.
    fn full_grid() -> ConjugationDocument {
        let numbers = json!({"singular": "x", "plural": "y"});
        let genders = json!({"masculine": numbers, "feminine": numbers});
        let persons = json!({"first": genders, "third": genders});
        document(json!({
            "كتب": {
                "active": {
                    "past": persons,
                    "present": persons,
                    "masdar": {"default": "كتابة", "alternates": []}
                },
                "passive": {
                    "past": persons,
                    "present": persons,
                    "masdar": {"default": "كتابة", "alternates": []}
                }
            }
        }))
    }

    async fn convert(doc: &ConjugationDocument, mode: ParticipleGenders) -> (WalkSummary, MemorySink) {
        let mut sink = MemorySink::new();
        let summary = ConjugationWalker::new(doc)
            .participle_genders(mode)
            .run(&mut sink)
            .await
            .unwrap();
        (summary, sink)
    }

    fn shape(statements: &[Statement]) -> Vec<String> {
        statements
            .iter()
            .map(|s| match s {
                Statement::MergeNode { node, .. } => node.label.clone(),
                Statement::MergeRelationship { rel_type, .. } => rel_type.clone(),
            })
            .collect()
    }

    fn nodes<'s>(statements: &'s [Statement], label: &str) -> Vec<&'s NodePattern> {
        statements
            .iter()
            .filter_map(|s| match s {
                Statement::MergeNode { node, .. } if node.label == label => Some(node),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_visitation_order() {
        let (summary, sink) = convert(&small(), ParticipleGenders::Carried).await;
        assert_eq!(
            shape(sink.statements()),
            vec![
                "Root",
                "Voice",
                "VOICED_AS",
                "Tense",
                "TENSED_AS",
                "Person",
                "PERSONED_AS",
                "Gender",
                "GENDERED_AS",
                "Number",
                "NUMBERED_AS",
                "ConjugatedVerb",
                "CONJUGATED_AS",
                "Tense",
                "TENSED_AS",
                "ConjugatedVerb",
                "CONJUGATED_AS",
            ]
        );
        assert_eq!(summary.statements, 17);
        assert_eq!(summary.conjugated_verbs, 2);
        assert!(summary.masdar_skipped.is_empty());
    }

    #[tokio::test]
    async fn test_keys_carry_full_ancestor_path() {
        let (_, sink) = convert(&small(), ParticipleGenders::Carried).await;
        let st = sink.statements();

        assert_eq!(st[0].to_string(), "MERGE (r:Root {name: 'كتب'})");
        assert_eq!(
            st[11].to_string(),
            "MERGE (c:ConjugatedVerb {name: 'كتبتُ', voice: 'active', tense: 'past', \
             person: 'first', gender: 'masculine', number: 'singular', root: 'كتب'})"
        );
        assert_eq!(
            st[12].to_string(),
            "MERGE (n:Number {name: 'singular', voice: 'active', tense: 'past', person: 'first', \
             gender: 'masculine', root: 'كتب'}) \
             MERGE (c:ConjugatedVerb {name: 'كتبتُ', voice: 'active', tense: 'past', \
             person: 'first', gender: 'masculine', number: 'singular', root: 'كتب'}) \
             MERGE (n)-[:CONJUGATED_AS]->(c)"
        );
        assert_eq!(
            st[15].to_string(),
            "MERGE (c:ConjugatedVerb {name: 'كتابة', voice: 'active', tense: 'masdar', \
             root: 'كتب'}) SET c.alternatives = ['كتب']"
        );
    }

    #[tokio::test]
    async fn test_finite_form_count_matches_leaves() {
        let (summary, sink) = convert(&full_grid(), ParticipleGenders::Carried).await;

        let finite = nodes(sink.statements(), "ConjugatedVerb")
            .into_iter()
            .filter(|n| n.property("person").is_some())
            .count();
        // 2 voices × 2 tenses × 2 persons × 2 genders × 2 numbers
        assert_eq!(finite, 32);
        assert_eq!(summary.conjugated_verbs, 32 + 2);
        assert_eq!(sink.count_relationships("CONJUGATED_AS"), 34);
        assert_eq!(sink.count_nodes("Root"), 1);
        assert_eq!(sink.count_nodes("Voice"), 2);
    }

    #[tokio::test]
    async fn test_rerun_produces_identical_statements() {
        let doc = full_grid();
        let (_, first) = convert(&doc, ParticipleGenders::Carried).await;
        let (_, second) = convert(&doc, ParticipleGenders::Carried).await;
        assert_eq!(first.statements(), second.statements());
    }

    #[tokio::test]
    async fn test_missing_alternates_skips_only_that_masdar() {
        let doc = document(json!({
            "كتب": {
                "active": {
                    "past": {"first": {"masculine": {"singular": "كتبتُ"}}},
                    "masdar": {"default": "كتابة"}
                },
                "passive": {
                    "past": {"third": {"masculine": {"singular": "كُتب"}}},
                    "masdar": {"default": "كتابة", "alternates": ["كتب"]}
                }
            }
        }));
        let (summary, sink) = convert(&doc, ParticipleGenders::Carried).await;

        assert_eq!(summary.masdar_skipped.len(), 1);
        assert_eq!(summary.masdar_skipped[0].voice, "active");
        assert!(summary.masdar_skipped[0].reason.contains("alternates"));

        // The next voice is still fully converted.
        let voices: Vec<_> = nodes(sink.statements(), "Voice")
            .into_iter()
            .filter_map(|n| n.name())
            .collect();
        assert_eq!(voices, vec!["active", "passive"]);

        // Masdar tense is written for both voices, its form only for the passive one.
        let masdar_tenses = nodes(sink.statements(), "Tense")
            .into_iter()
            .filter(|n| n.name() == Some(MASDAR))
            .count();
        assert_eq!(masdar_tenses, 2);
        let masdar_forms: Vec<_> = nodes(sink.statements(), "ConjugatedVerb")
            .into_iter()
            .filter(|n| n.property("tense") == Some(&PropertyValue::from(MASDAR)))
            .filter_map(|n| n.property("voice").and_then(PropertyValue::as_str))
            .collect();
        assert_eq!(masdar_forms, vec!["passive"]);
    }

    #[tokio::test]
    async fn test_absent_masdar_is_reported() {
        let doc = document(json!({
            "كتب": {"active": {"past": {"first": {"masculine": {"singular": "كتبتُ"}}}}}
        }));
        let (summary, sink) = convert(&doc, ParticipleGenders::Carried).await;

        assert_eq!(summary.masdar_skipped.len(), 1);
        assert!(sink.statements().iter().any(|s| s.to_string().contains("name: 'masdar'")));
    }

    #[tokio::test]
    async fn test_participle_excluded_from_finite_loop() {
        let doc = document(json!({
            "كتب": {
                "passive": {
                    "past": {"third": {"masculine": {"singular": "كُتب"}}},
                    "Passive Participle": {"masculine": {"singular": "مكتوب", "plural": "مكتوبون"}}
                }
            }
        }));
        let (_, sink) = convert(&doc, ParticipleGenders::PerKey).await;
        let st = sink.statements();

        // No person was read from the participle.
        assert!(nodes(st, "Person")
            .iter()
            .all(|n| n.property("tense") == Some(&PropertyValue::from("past"))));

        let participle_tense = nodes(st, "Tense")
            .into_iter()
            .filter(|n| n.name() == Some("Passive Participle"))
            .count();
        assert_eq!(participle_tense, 1);

        let participle_forms: Vec<_> = nodes(st, "ConjugatedVerb")
            .into_iter()
            .filter(|n| n.property("tense") == Some(&PropertyValue::from("Passive Participle")))
            .filter_map(|n| n.name())
            .collect();
        assert_eq!(participle_forms, vec!["مكتوب", "مكتوبون"]);
    }

    #[tokio::test]
    async fn test_per_key_participle_genders() {
        let doc = document(json!({
            "كتب": {
                "active": {
                    "Active Participle": {
                        "masculine": {"singular": "كاتب"},
                        "feminine": {"singular": "كاتبة"}
                    }
                }
            }
        }));
        let (_, sink) = convert(&doc, ParticipleGenders::PerKey).await;

        let genders: Vec<_> = nodes(sink.statements(), "Gender")
            .into_iter()
            .map(|n| n.key.clone())
            .collect();
        assert_eq!(genders.len(), 2);
        assert_eq!(
            genders[1],
            vec![
                ("name".to_string(), PropertyValue::from("feminine")),
                ("voice".to_string(), PropertyValue::from("active")),
                ("tense".to_string(), PropertyValue::from("Active Participle")),
                ("root".to_string(), PropertyValue::from("كتب")),
            ]
        );
        assert_eq!(sink.count_relationships("GENDERED_AS"), 2);
    }

    #[tokio::test]
    async fn test_carried_participle_gender_reuses_last_bindings() {
        let doc = document(json!({
            "كتب": {
                "active": {
                    "past": {"first": {"feminine": {"singular": "كتبتُ"}}},
                    "Active Participle": {"feminine": {"singular": "كاتبة"}},
                    "masdar": {"default": "كتابة", "alternates": []}
                },
                "passive": {
                    "Passive Participle": {"feminine": {"singular": "مكتوبة"}}
                }
            }
        }));
        let (_, sink) = convert(&doc, ParticipleGenders::Carried).await;
        let st = sink.statements();

        // Finite gender, then one carried gender per participle.
        let genders: Vec<_> = nodes(st, "Gender")
            .into_iter()
            .map(|n| {
                (
                    n.property("voice").and_then(PropertyValue::as_str).unwrap(),
                    n.property("tense").and_then(PropertyValue::as_str).unwrap(),
                )
            })
            .collect();
        assert_eq!(
            genders,
            vec![
                ("active", "past"),
                ("active", "past"),
                // The masdar step of the previous voice rebound the tense.
                ("passive", "masdar"),
            ]
        );

        // Numbers are read from the participle under the carried gender.
        let participle_numbers: Vec<_> = nodes(st, "Number")
            .into_iter()
            .filter(|n| n.property("person").is_none())
            .map(|n| n.property("tense").and_then(PropertyValue::as_str).unwrap())
            .collect();
        assert_eq!(participle_numbers, vec!["Active Participle", "Passive Participle"]);
    }

    #[tokio::test]
    async fn test_carried_participle_without_finite_context_fails() {
        let doc = document(json!({
            "كتب": {"active": {"Active Participle": {"masculine": {"singular": "كاتب"}}}}
        }));
        let mut sink = MemorySink::new();
        let err = ConjugationWalker::new(&doc).run(&mut sink).await.unwrap_err();
        assert!(matches!(
            err,
            IngestError::Document(DocumentError::NoFiniteContext { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_finite_level_is_fatal() {
        let doc = document(json!({
            "كتب": {
                "active": {"past": {"first": {"masculine": "not-a-mapping"}}},
                "passive": {"past": {"third": {"masculine": {"singular": "كُتب"}}}}
            }
        }));
        let mut sink = MemorySink::new();
        let err = ConjugationWalker::new(&doc).run(&mut sink).await.unwrap_err();
        assert!(matches!(
            err,
            IngestError::Document(DocumentError::NotAMapping { .. })
        ));
        assert_eq!(sink.count_nodes("Voice"), 1);
    }

    /// Rejects every statement that mentions the masdar.
    #[derive(Default)]
    struct MasdarRejectingSink {
        inner: MemorySink,
    }

    #[async_trait]
    impl StatementSink for MasdarRejectingSink {
        async fn execute(&mut self, statement: &Statement) -> std::result::Result<(), SinkError> {
            if statement.to_string().contains("'masdar'") {
                return Err(SinkError::Backend {
                    backend: "test",
                    message: "rejected".to_string(),
                });
            }
            self.inner.execute(statement).await
        }
    }

    #[tokio::test]
    async fn test_sink_failure_in_masdar_is_not_fatal() {
        let mut sink = MasdarRejectingSink::default();
        let summary = ConjugationWalker::new(&full_grid())
            .run(&mut sink)
            .await
            .unwrap();

        assert_eq!(summary.masdar_skipped.len(), 2);
        assert!(summary.masdar_skipped[0].reason.contains("rejected"));
        assert_eq!(sink.inner.count_nodes("Voice"), 2);
    }

    #[tokio::test]
    async fn test_sink_failure_outside_masdar_is_fatal() {
        struct FailingSink;

        #[async_trait]
        impl StatementSink for FailingSink {
            async fn execute(&mut self, _: &Statement) -> std::result::Result<(), SinkError> {
                Err(SinkError::Finished)
            }
        }

        let err = ConjugationWalker::new(&small())
            .run(&mut FailingSink)
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Sink(SinkError::Finished)));
    }
}
