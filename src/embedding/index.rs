//! Embedding index over contacts, snippets and projects

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::backend::{DisabledBackend, EmbeddingBackend};
use super::cosine_similarity;
use crate::entity::{EntityRecord, EntityRef};
use crate::storage::StoreHandle;
use crate::{Error, Result};

/// A stored entity scored against a query
#[derive(Debug, Clone, Serialize)]
pub struct SimilarMatch {
    #[serde(flatten)]
    pub entity: EntityRef,
    pub row: EntityRecord,
    pub score: f32,
}

/// An embedding whose source text no longer matches its entity
#[derive(Debug, Clone, Serialize)]
pub struct StaleEmbedding {
    pub entity: EntityRef,
    pub stored_text: String,
    /// `None` when the entity no longer exists
    pub current_text: Option<String>,
}

/// Vector search over the knowledge base.
///
/// Embeddings are written by `generate_all` only. Later edits to an entity
/// leave its vector as it was; `stale_entries` lists such rows.
pub struct EmbeddingIndex {
    store: StoreHandle,
    backend: Arc<dyn EmbeddingBackend>,
    default_threshold: f32,
}

impl EmbeddingIndex {
    pub fn new(store: StoreHandle, backend: Arc<dyn EmbeddingBackend>) -> Self {
        Self {
            store,
            backend,
            default_threshold: 0.5,
        }
    }

    /// Index with no backend; every search reports unavailable
    pub fn unavailable(store: StoreHandle, reason: impl Into<String>) -> Self {
        Self::new(store, Arc::new(DisabledBackend::new(reason)))
    }

    /// Threshold used by `find_similar_to_entity`
    pub fn with_default_threshold(mut self, threshold: f32) -> Self {
        self.default_threshold = threshold;
        self
    }

    pub fn available(&self) -> bool {
        self.backend.available()
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn default_threshold(&self) -> f32 {
        self.default_threshold
    }

    fn ensure_available(&self) -> Result<()> {
        if self.available() {
            Ok(())
        } else {
            Err(Error::EmbeddingUnavailable(format!("{} backend", self.backend.name())))
        }
    }

    /// Replace every stored vector with a fresh one. Returns the count written.
    pub fn generate_all(&self) -> Result<usize> {
        self.ensure_available()?;

        let rows = self.store.embeddable_rows()?;
        let texts: Vec<String> = rows.iter().map(|(_, text)| text.clone()).collect();
        let vectors = self.backend.encode_batch(&texts)?;
        if vectors.len() != rows.len() {
            return Err(Error::Embedding(format!(
                "backend returned {} vectors for {} texts",
                vectors.len(),
                rows.len()
            )));
        }

        self.store.transaction(|tx| {
            tx.clear_embeddings()?;
            for ((entity, text), vector) in rows.iter().zip(vectors.iter()) {
                tx.upsert_embedding(*entity, vector, text)?;
            }
            Ok(())
        })?;

        info!(count = rows.len(), backend = self.backend.name(), "generated embeddings");
        Ok(rows.len())
    }

    /// Startup indexing of existing rows. An unavailable or failing backend
    /// is logged and leaves semantic search empty; storage errors propagate.
    pub fn generate_at_startup(&self) -> Result<usize> {
        if !self.available() {
            debug!(backend = self.backend.name(), "skipping startup embeddings");
            return Ok(0);
        }
        match self.generate_all() {
            Ok(count) => Ok(count),
            Err(e) if e.is_degradable() => {
                warn!("Startup embeddings skipped: {}", e);
                Ok(0)
            }
            Err(e) => Err(e),
        }
    }

    /// Stored entities scoring at least `threshold` against `query`, best first
    pub fn find_similar(&self, query: &str, limit: usize, threshold: f32) -> Result<Vec<SimilarMatch>> {
        self.ensure_available()?;
        if query.trim().is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let query_vector = self.backend.encode(query)?;
        self.rank(&query_vector, None, limit, threshold)
    }

    /// Entities most similar to an already-indexed one, excluding itself
    pub fn find_similar_to_entity(&self, entity: EntityRef, limit: usize) -> Result<Vec<SimilarMatch>> {
        self.ensure_available()?;
        if !entity.kind.is_embeddable() {
            return Err(Error::InvalidEntity(format!("{} entities have no embeddings", entity.kind)));
        }

        let stored = self
            .store
            .get_embedding(entity)?
            .ok_or(Error::EntityNotFound(entity))?;

        self.rank(&stored.vector, Some(entity), limit, self.default_threshold)
    }

    fn rank(
        &self,
        query_vector: &[f32],
        exclude: Option<EntityRef>,
        limit: usize,
        threshold: f32,
    ) -> Result<Vec<SimilarMatch>> {
        let mut scored: Vec<(EntityRef, f32)> = self
            .store
            .all_embeddings()?
            .into_iter()
            .filter(|e| Some(e.entity) != exclude)
            .map(|e| (e.entity, cosine_similarity(query_vector, &e.vector)))
            .filter(|(_, score)| *score >= threshold)
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.id.cmp(&b.0.id))
                .then_with(|| a.0.kind.cmp(&b.0.kind))
        });

        let mut results = Vec::new();
        for (entity, score) in scored {
            if results.len() >= limit {
                break;
            }
            match self.store.get_entity(entity)? {
                Some(row) => results.push(SimilarMatch { entity, row, score }),
                None => debug!(%entity, "embedding for missing entity"),
            }
        }

        Ok(results)
    }

    /// Embeddings whose text snapshot differs from the entity's current text.
    /// Reports only; nothing is re-indexed.
    pub fn stale_entries(&self) -> Result<Vec<StaleEmbedding>> {
        let current: HashMap<EntityRef, String> = self.store.embeddable_rows()?.into_iter().collect();

        let stale = self
            .store
            .all_embeddings()?
            .into_iter()
            .filter_map(|stored| {
                let current_text = current.get(&stored.entity).cloned();
                if current_text.as_deref() == Some(stored.text.as_str()) {
                    None
                } else {
                    Some(StaleEmbedding {
                        entity: stored.entity,
                        stored_text: stored.text,
                        current_text,
                    })
                }
            })
            .collect();

        Ok(stale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingBackend;
    use crate::entity::{Contact, EntityKind, Project, Snippet};
    use crate::storage::SqliteStore;

    fn index_with_corpus() -> (StoreHandle, EmbeddingIndex, i64) {
        let store = SqliteStore::open_in_memory().unwrap().into_handle();
        let jwt = store
            .insert_snippet(&Snippet::new("JWT Authentication Discussion"))
            .unwrap();
        store.insert_snippet(&Snippet::new("Lunch order for Friday")).unwrap();
        store
            .insert_contact(&Contact::new("Sarah Mitchell").with_role("Security Lead"))
            .unwrap();
        store
            .insert_project(&Project::new("Atlas").with_description("Quarterly budget review"))
            .unwrap();

        let index = EmbeddingIndex::new(store.clone(), Arc::new(HashingBackend::default()))
            .with_default_threshold(0.0);
        (store, index, jwt)
    }

    #[test]
    fn test_generate_all() {
        let (store, index, _) = index_with_corpus();
        assert_eq!(index.generate_all().unwrap(), 4);
        assert_eq!(store.stats().unwrap().embeddings, 4);

        // regenerating replaces rather than appends
        assert_eq!(index.generate_all().unwrap(), 4);
        assert_eq!(store.stats().unwrap().embeddings, 4);
    }

    #[test]
    fn test_startup_embeddings_make_rows_searchable() {
        let (_, index, jwt) = index_with_corpus();
        assert!(index.find_similar("authentication tokens", 5, 0.3).unwrap().is_empty());

        assert_eq!(index.generate_at_startup().unwrap(), 4);
        let results = index.find_similar("authentication tokens", 5, 0.3).unwrap();
        assert_eq!(results[0].entity, EntityRef::snippet(jwt));
    }

    #[test]
    fn test_startup_embeddings_skip_unavailable_backend() {
        let store = SqliteStore::open_in_memory().unwrap().into_handle();
        store.insert_snippet(&Snippet::new("JWT Authentication Discussion")).unwrap();
        let index = EmbeddingIndex::unavailable(store.clone(), "disabled");

        assert_eq!(index.generate_at_startup().unwrap(), 0);
        assert_eq!(store.stats().unwrap().embeddings, 0);
    }

    #[test]
    fn test_find_similar_threshold() {
        let (_, index, jwt) = index_with_corpus();
        index.generate_all().unwrap();

        let results = index.find_similar("authentication tokens", 5, 0.3).unwrap();
        assert!(!results.is_empty());
        assert_eq!(results[0].entity, EntityRef::snippet(jwt));
        let score = results[0].score;

        let raised = index.find_similar("authentication tokens", 5, score + 0.01).unwrap();
        assert!(raised.iter().all(|m| m.entity != EntityRef::snippet(jwt)));
    }

    #[test]
    fn test_find_similar_sorted_and_limited() {
        let (_, index, _) = index_with_corpus();
        index.generate_all().unwrap();

        let results = index.find_similar("Sarah", 2, -1.0).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].score >= results[1].score);
        assert!(index.find_similar("   ", 5, 0.0).unwrap().is_empty());
    }

    #[test]
    fn test_ties_break_by_entity_id() {
        let store = SqliteStore::open_in_memory().unwrap().into_handle();
        store.insert_snippet(&Snippet::new("same words")).unwrap();
        store.insert_snippet(&Snippet::new("same words")).unwrap();
        let index = EmbeddingIndex::new(store, Arc::new(HashingBackend::default()));
        index.generate_all().unwrap();

        let results = index.find_similar("same words", 5, 0.5).unwrap();
        let ids: Vec<_> = results.iter().map(|m| m.entity.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_find_similar_to_entity_excludes_itself() {
        let (_, index, jwt) = index_with_corpus();
        index.generate_all().unwrap();

        let results = index.find_similar_to_entity(EntityRef::snippet(jwt), 10).unwrap();
        assert!(results.iter().all(|m| m.entity != EntityRef::snippet(jwt)));

        let missing = index.find_similar_to_entity(EntityRef::snippet(999), 10);
        assert!(matches!(missing, Err(Error::EntityNotFound(_))));

        let abbr = EntityRef::new(EntityKind::Abbreviation, 1);
        assert!(matches!(index.find_similar_to_entity(abbr, 10), Err(Error::InvalidEntity(_))));
    }

    #[test]
    fn test_unavailable_backend_degrades() {
        let store = SqliteStore::open_in_memory().unwrap().into_handle();
        let index = EmbeddingIndex::unavailable(store, "disabled in config");

        assert!(!index.available());
        let err = index.find_similar("anything", 5, 0.5).unwrap_err();
        assert!(err.is_degradable());
        assert!(index.generate_all().unwrap_err().is_degradable());
    }

    #[test]
    fn test_stale_entries_report_only() {
        let (store, index, _) = index_with_corpus();
        index.generate_all().unwrap();
        assert!(index.stale_entries().unwrap().is_empty());

        let mut sarah = store.get_contact(1).unwrap().unwrap();
        sarah.role = Some("CISO".to_string());
        store.update_contact(&sarah).unwrap();

        let stale = index.stale_entries().unwrap();
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].entity.kind, EntityKind::Contact);
        assert_eq!(stale[0].stored_text, "Sarah Mitchell Security Lead");
        assert_eq!(stale[0].current_text.as_deref(), Some("Sarah Mitchell CISO"));

        // still stale: nothing re-indexes behind the caller's back
        assert_eq!(index.stale_entries().unwrap().len(), 1);
    }
}
