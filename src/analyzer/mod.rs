//! Context Synthesizer - the analysis entry point
//!
//! `analyze(text)` runs, in order:
//! 1. pattern classification
//! 2. exact (substring) matches and abbreviation lookup
//! 3. one-hop graph expansion from the exact matches
//! 4. semantic matches, when an embedding backend is available
//! 5. person-name detection scored against every contact
//! 6. summary text and insights
//! 7. suggested actions
//!
//! For a fixed store state the result is the same on every call.

pub mod actions;
pub mod result;
pub mod summary;

use std::collections::HashSet;
use std::sync::Arc;

use crate::Result;
use crate::embedding::{EmbeddingIndex, SimilarMatch};
use crate::entity::{Abbreviation, EntityRef};
use crate::graph::GraphWalker;
use crate::matching::{ExactMatchLocator, SUBSTRING_SCORE, rank_contacts};
use crate::pattern::{Classification, Classifier, PatternKind};
use crate::storage::StoreHandle;

pub use result::{ActionKind, AnalysisResult, DetectedPerson, SuggestedAction};

/// Tunables for analysis
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Score at or above which a detected person is an existing contact
    pub exists_threshold: u32,
    pub semantic_limit: usize,
    pub semantic_threshold: f32,
    /// Ticket URL with an `{id}` placeholder
    pub tracker_url_template: Option<String>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            exists_threshold: SUBSTRING_SCORE,
            semantic_limit: 5,
            semantic_threshold: 0.5,
            tracker_url_template: Some(actions::DEFAULT_TRACKER_URL.to_string()),
        }
    }
}

/// Orchestrates every lookup for a selection.
///
/// Cheap to share: all collaborators sit behind `Arc`s, and `analyze` only
/// reads from the store.
pub struct ContextSynthesizer {
    store: StoreHandle,
    classifier: Arc<dyn Classifier>,
    index: Option<Arc<EmbeddingIndex>>,
    config: AnalyzerConfig,
}

impl ContextSynthesizer {
    pub fn new(store: StoreHandle, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            store,
            classifier,
            index: None,
            config: AnalyzerConfig::default(),
        }
    }

    pub fn with_index(mut self, index: Arc<EmbeddingIndex>) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_config(mut self, config: AnalyzerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    pub fn classifier(&self) -> Arc<dyn Classifier> {
        Arc::clone(&self.classifier)
    }

    /// Analyze a selection. Blank input yields an empty result, not an error.
    pub fn analyze(&self, text: &str) -> Result<AnalysisResult> {
        let selected = text.trim();
        if selected.is_empty() {
            return Ok(AnalysisResult::empty(text));
        }

        let classification = self.classifier.classify(selected);

        let exact_matches = ExactMatchLocator::new(&self.store).locate(selected)?;
        let abbreviations = self.find_abbreviations(selected, &classification)?;

        let seeds: Vec<EntityRef> = exact_matches.iter().map(|m| m.entity).collect();
        let related_items = GraphWalker::new(&self.store).related(&seeds)?;

        let semantic_matches = self.semantic_matches(selected, &seeds)?;

        let detected_people = self.detect_people(selected)?;

        let smart_context = summary::smart_context(
            classification.primary,
            &abbreviations,
            &exact_matches,
            &related_items,
            &semantic_matches,
        );
        let insights = summary::insights(&exact_matches, &related_items, &detected_people);

        let actions = actions::suggest_actions(
            selected,
            &classification,
            &exact_matches,
            self.config.tracker_url_template.as_deref(),
        );

        tracing::debug!(
            "analyzed {} chars: type={:?} exact={} related={} semantic={} people={}",
            selected.len(),
            classification.primary,
            exact_matches.len(),
            related_items.len(),
            semantic_matches.len(),
            detected_people.len()
        );

        Ok(AnalysisResult {
            selected_text: selected.to_string(),
            detected_type: classification.primary,
            patterns: classification.hits,
            abbreviations,
            exact_matches,
            related_items,
            semantic_matches,
            detected_people,
            smart_context,
            insights,
            actions,
        })
    }

    /// Abbreviations equal to the whole selection or to an acronym token.
    /// Never matched as a substring of a longer word.
    fn find_abbreviations(&self, selected: &str, classification: &Classification) -> Result<Vec<Abbreviation>> {
        let mut keys = vec![selected.to_string()];
        for hit in classification.of_kind(PatternKind::Acronym) {
            keys.push(hit.text.clone());
            if hit.text.contains('.') {
                keys.push(hit.text.replace('.', ""));
            }
        }

        self.store.read(|db| {
            let mut seen = HashSet::new();
            let mut found = Vec::new();
            for key in &keys {
                for abbr in db.find_abbreviations(key)? {
                    if seen.insert(abbr.id) {
                        found.push(abbr);
                    }
                }
            }
            Ok(found)
        })
    }

    /// Similar entities not already among the exact matches
    fn semantic_matches(&self, selected: &str, exact: &[EntityRef]) -> Result<Vec<SimilarMatch>> {
        let Some(index) = &self.index else {
            return Ok(Vec::new());
        };
        if !index.available() {
            return Ok(Vec::new());
        }

        match index.find_similar(selected, self.config.semantic_limit, self.config.semantic_threshold) {
            Ok(matches) => Ok(matches.into_iter().filter(|m| !exact.contains(&m.entity)).collect()),
            Err(e) if e.is_degradable() => {
                tracing::warn!("Semantic search skipped: {}", e);
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// One entry per distinct name; two names resolving to the same contact
    /// are reported once, under the first mention
    fn detect_people(&self, selected: &str) -> Result<Vec<DetectedPerson>> {
        let names = self.classifier.person_names(selected);
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let contacts = self.store.all_contacts()?;
        let mut seen_contacts = HashSet::new();
        let mut people = Vec::new();

        for person in names {
            let ranked = rank_contacts(&person.name, &contacts);
            let best = ranked.first();
            let score = best.map(|b| b.score).unwrap_or(0);
            let exists = score >= self.config.exists_threshold;

            let (contact_id, contact_name) = match best {
                Some(b) if exists => {
                    if !seen_contacts.insert(b.contact.id) {
                        continue;
                    }
                    (Some(b.contact.id), Some(b.contact.name.clone()))
                }
                _ => (None, None),
            };

            let tied: Vec<i64> = ranked
                .iter()
                .take_while(|r| r.score == score)
                .map(|r| r.contact.id)
                .collect();
            let candidates = if exists && tied.len() > 1 { tied } else { Vec::new() };

            people.push(DetectedPerson {
                name: person.name,
                normalized: person.normalized,
                exists,
                contact_id,
                contact_name,
                score,
                candidates,
            });
        }

        Ok(people)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::{RelationshipEdge, RelationshipKind};
    use crate::embedding::HashingBackend;
    use crate::entity::{Abbreviation, Contact, EntityKind, Project, Snippet};
    use crate::pattern::RegexClassifier;
    use crate::storage::SqliteStore;

    fn synthesizer(store: StoreHandle) -> ContextSynthesizer {
        ContextSynthesizer::new(store, Arc::new(RegexClassifier::new().unwrap()))
    }

    fn store() -> StoreHandle {
        SqliteStore::open_in_memory().unwrap().into_handle()
    }

    #[test]
    fn test_blank_input_is_minimal_result() {
        let result = synthesizer(store()).analyze("   \n\t").unwrap();
        assert!(result.is_empty());
        assert!(result.actions.is_empty());
        assert_eq!(result.smart_context, summary::NO_CONTEXT);
    }

    #[test]
    fn test_detected_people() {
        let store = store();
        store.insert_contact(&Contact::new("Sarah Mitchell")).unwrap();

        let result = synthesizer(store).analyze("Met with Sarah Mitchell and John Davis").unwrap();
        assert_eq!(result.detected_people.len(), 2);

        let sarah = &result.detected_people[0];
        assert_eq!(sarah.name, "Sarah Mitchell");
        assert!(sarah.exists);
        assert_eq!(sarah.contact_id, Some(1));
        assert_eq!(sarah.score, 10);

        let john = &result.detected_people[1];
        assert_eq!(john.name, "John Davis");
        assert!(!john.exists);
        assert_eq!(john.contact_id, None);
    }

    #[test]
    fn test_repeat_mentions_reported_once() {
        let store = store();
        store.insert_contact(&Contact::new("Sarah Mitchell")).unwrap();

        let result = synthesizer(store)
            .analyze("Sarah Mitchell said hi. Then Sarah Mitchell left.")
            .unwrap();
        assert_eq!(result.detected_people.len(), 1);
    }

    #[test]
    fn test_names_resolving_to_same_contact_merge() {
        let store = store();
        store.insert_contact(&Contact::new("Elizabeth Thompson Jr")).unwrap();

        let result = synthesizer(store)
            .analyze("Elizabeth Thompson Jr joined; thanks Elizabeth Thompson")
            .unwrap();
        assert_eq!(result.detected_people.len(), 1);
        assert_eq!(result.detected_people[0].score, 10);
    }

    #[test]
    fn test_tied_contacts_are_exposed() {
        let store = store();
        store.insert_contact(&Contact::new("Sarah Mitchell").with_email("a@x.com")).unwrap();
        store.insert_contact(&Contact::new("Sarah Mitchell").with_email("b@x.com")).unwrap();
        store.insert_contact(&Contact::new("John Davis")).unwrap();

        let result = synthesizer(store).analyze("Sarah Mitchell and John Davis").unwrap();
        let sarah = &result.detected_people[0];
        assert!(sarah.exists);
        assert!(sarah.is_ambiguous());
        assert_eq!(sarah.candidates, vec![1, 2]);
        assert_eq!(sarah.contact_id, Some(1));

        let john = &result.detected_people[1];
        assert!(!john.is_ambiguous());
        assert!(john.candidates.is_empty());
    }

    #[test]
    fn test_partial_name_is_new_person() {
        let store = store();
        store.insert_contact(&Contact::new("Rebecca Anderson")).unwrap();

        let result = synthesizer(store).analyze("Lunch with Rebecca Johnson").unwrap();
        let person = &result.detected_people[0];
        assert!(!person.exists);
        assert!(person.score >= 1 && person.score < 8);
    }

    #[test]
    fn test_exact_related_and_insights() {
        let store = store();
        let sarah = store
            .insert_contact(
                &Contact::new("Sarah Mitchell")
                    .with_role("Security Lead")
                    .with_email("sarah@x.com")
                    .with_next_event("OAuth review Friday"),
            )
            .unwrap();
        let atlas = store.insert_project(&Project::new("Atlas").with_status("active")).unwrap();
        store
            .insert_edge(&RelationshipEdge::new(
                EntityRef::project(atlas),
                EntityRef::contact(sarah),
                RelationshipKind::LedBy,
            ))
            .unwrap();

        let result = synthesizer(store).analyze("Sarah Mitchell").unwrap();
        assert_eq!(result.exact_matches.len(), 1);
        assert_eq!(result.related_items.len(), 1);
        assert_eq!(result.related_items[0].entity, EntityRef::project(atlas));
        assert_eq!(result.related_items[0].relationship, "leads");

        assert!(result.smart_context.starts_with("Sarah Mitchell: Security Lead"));
        assert!(result.insights.contains(&"Upcoming event with Sarah Mitchell: OAuth review Friday".to_string()));
        assert!(result.actions.iter().any(|a| a.label == "Email Sarah Mitchell"));
    }

    #[test]
    fn test_abbreviation_whole_token_only() {
        let store = store();
        store
            .upsert_abbreviation(&Abbreviation::new("API", "Application Programming Interface").with_category("Tech"))
            .unwrap();

        let synth = synthesizer(store);

        let result = synth.analyze("API").unwrap();
        assert_eq!(result.detected_type, Some(PatternKind::Acronym));
        assert_eq!(result.abbreviations.len(), 1);
        assert!(result.smart_context.starts_with("'API' stands for Application Programming Interface."));

        let result = synth.analyze("Update the API docs").unwrap();
        assert_eq!(result.abbreviations.len(), 1);

        let result = synth.analyze("rapid iteration").unwrap();
        assert!(result.abbreviations.is_empty());
    }

    #[test]
    fn test_semantic_matches_degrade_without_backend() {
        let store = store();
        store.insert_snippet(&Snippet::new("JWT Authentication Discussion")).unwrap();

        let index = Arc::new(EmbeddingIndex::unavailable(store.clone(), "disabled"));
        let result = synthesizer(store).with_index(index).analyze("authentication tokens").unwrap();
        assert!(result.semantic_matches.is_empty());
    }

    #[test]
    fn test_semantic_matches_with_backend() {
        let store = store();
        store.insert_snippet(&Snippet::new("JWT Authentication Discussion")).unwrap();
        let index = Arc::new(EmbeddingIndex::new(store.clone(), Arc::new(HashingBackend::default())));
        index.generate_all().unwrap();

        let config = AnalyzerConfig {
            semantic_threshold: 0.3,
            ..AnalyzerConfig::default()
        };
        let result = synthesizer(store)
            .with_index(index)
            .with_config(config)
            .analyze("authentication tokens")
            .unwrap();

        assert_eq!(result.semantic_matches.len(), 1);
        assert_eq!(result.semantic_matches[0].entity.kind, EntityKind::Snippet);
        assert!(result.smart_context.starts_with("Similar to snippet"));
    }

    #[test]
    fn test_ticket_opens_in_tracker_by_default() {
        let result = synthesizer(store())
            .with_config(crate::config::ContextualConfig::default().analyzer_config())
            .analyze("JT-346")
            .unwrap();

        let labels: Vec<&str> = result.actions.iter().map(|a| a.label.as_str()).collect();
        assert_eq!(labels, vec!["Open in tracker", "Copy ticket ID", "Save as snippet"]);
        assert_eq!(result.actions[0].value, "https://jira.company.com/browse/JT-346");
    }

    #[test]
    fn test_hyphenated_acronym_keeps_acronym_type() {
        let result = synthesizer(store()).analyze("UTF-8").unwrap();
        assert_eq!(result.detected_type, Some(PatternKind::Acronym));
        assert!(!result.actions.iter().any(|a| a.label == "Copy ticket ID"));
    }

    #[test]
    fn test_analyze_is_deterministic() {
        let store = store();
        store.insert_contact(&Contact::new("Sarah Mitchell").with_email("sarah@x.com")).unwrap();
        store.insert_contact(&Contact::new("Sarah Mitchell")).unwrap();
        store.insert_snippet(&Snippet::new("Sarah Mitchell on JT-346")).unwrap();

        let synth = synthesizer(store);
        let first = serde_json::to_string(&synth.analyze("Sarah Mitchell on JT-346").unwrap()).unwrap();
        for _ in 0..3 {
            let again = serde_json::to_string(&synth.analyze("Sarah Mitchell on JT-346").unwrap()).unwrap();
            assert_eq!(first, again);
        }
    }
}
