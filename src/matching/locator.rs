//! Exact (substring) match lookup
//!
//! Case-insensitive substring search over contact names and emails, snippet
//! bodies, and project names and descriptions. Results are unranked and never
//! truncated; callers apply their own limits.

use serde::Serialize;
use tracing::debug;

use crate::Result;
use crate::entity::{EntityRecord, EntityRef};
use crate::storage::SqliteStore;

/// One substring hit
#[derive(Debug, Clone, Serialize)]
pub struct ExactMatch {
    #[serde(flatten)]
    pub entity: EntityRef,
    pub row: EntityRecord,
}

impl ExactMatch {
    pub fn new(row: EntityRecord) -> Self {
        Self {
            entity: row.entity_ref(),
            row,
        }
    }
}

/// Substring lookup against the knowledge base
pub struct ExactMatchLocator<'a> {
    store: &'a SqliteStore,
}

impl<'a> ExactMatchLocator<'a> {
    pub fn new(store: &'a SqliteStore) -> Self {
        Self { store }
    }

    /// Contacts, then snippets, then projects, each by id
    pub fn locate(&self, query: &str) -> Result<Vec<ExactMatch>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let matches: Vec<ExactMatch> = self.store.read(|db| {
            let mut matches = Vec::new();
            matches.extend(
                db.find_contacts_like(query)?
                    .into_iter()
                    .map(|c| ExactMatch::new(EntityRecord::Contact(c))),
            );
            matches.extend(
                db.find_snippets_like(query)?
                    .into_iter()
                    .map(|s| ExactMatch::new(EntityRecord::Snippet(s))),
            );
            matches.extend(
                db.find_projects_like(query)?
                    .into_iter()
                    .map(|p| ExactMatch::new(EntityRecord::Project(p))),
            );
            Ok(matches)
        })?;

        debug!(query, count = matches.len(), "exact match lookup");
        Ok(matches)
    }
}
