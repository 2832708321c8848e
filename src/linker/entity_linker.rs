use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::edge::{RelationshipEdge, RelationshipKind};
use crate::entity::{Contact, EntityRef, Snippet, now_timestamp};
use crate::matching::{Resolution, ScoredContact, rank_contacts, resolve};
use crate::pattern::{Classifier, normalize_name};
use crate::storage::{StoreHandle, StoreTx};
use crate::{Error, Result};

/// How names are chosen when linking a snippet to contacts.
///
/// There is no default: every caller states its mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "names", rename_all = "snake_case")]
pub enum LinkMode {
    /// Detect person names in the snippet text
    Auto,
    /// Link exactly these names; an empty list links nothing
    Explicit(Vec<String>),
    /// Store without linking
    None,
}

impl LinkMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkMode::Auto => "auto",
            LinkMode::Explicit(_) => "explicit",
            LinkMode::None => "none",
        }
    }
}

impl fmt::Display for LinkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkedContact {
    pub contact_id: i64,
    pub name: String,
    /// The name that led to this contact
    pub requested: String,
    pub created_contact: bool,
    /// False when the edge already existed
    pub created_edge: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub contact_id: i64,
    pub name: String,
    pub score: u32,
}

impl From<&ScoredContact> for Candidate {
    fn from(scored: &ScoredContact) -> Self {
        Self {
            contact_id: scored.contact.id,
            name: scored.contact.name.clone(),
            score: scored.score,
        }
    }
}

/// A name left unlinked because several contacts tied for it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmbiguousName {
    pub name: String,
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedName {
    pub name: String,
    pub error: String,
}

/// Per-name outcome of a link operation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LinkReport {
    pub snippet_id: i64,
    pub linked: Vec<LinkedContact>,
    pub ambiguous: Vec<AmbiguousName>,
    pub failed: Vec<FailedName>,
}

impl LinkReport {
    fn new(snippet_id: i64) -> Self {
        Self {
            snippet_id,
            ..Self::default()
        }
    }

    pub fn created_contacts(&self) -> impl Iterator<Item = &LinkedContact> {
        self.linked.iter().filter(|l| l.created_contact)
    }

    pub fn is_clean(&self) -> bool {
        self.ambiguous.is_empty() && self.failed.is_empty()
    }

    /// The first ambiguous name as an error, for callers that must not
    /// silently skip it
    pub fn ensure_resolved(&self) -> Result<()> {
        match self.ambiguous.first() {
            Some(amb) => Err(Error::AmbiguousLink {
                name: amb.name.clone(),
                candidates: amb.candidates.iter().map(|c| c.contact_id).collect(),
            }),
            None => Ok(()),
        }
    }
}

impl fmt::Display for LinkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Link Report (snippet {}):", self.snippet_id)?;
        writeln!(f, "  ✅ Linked: {}", self.linked.len())?;
        writeln!(f, "  ✨ New contacts: {}", self.created_contacts().count())?;
        writeln!(f, "  🤔 Ambiguous: {}", self.ambiguous.len())?;
        write!(f, "  ❌ Failed: {}", self.failed.len())
    }
}

enum NameOutcome {
    Linked(LinkedContact),
    Ambiguous(AmbiguousName),
}

/// Creates `mentions` edges from snippets to contacts.
///
/// Each name is linked in its own transaction, so a failure on one name
/// never undoes another.
pub struct EntityLinker {
    store: StoreHandle,
    classifier: Arc<dyn Classifier>,
    exists_threshold: u32,
}

impl EntityLinker {
    pub fn new(store: StoreHandle, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            store,
            classifier,
            exists_threshold: crate::matching::SUBSTRING_SCORE,
        }
    }

    pub fn with_exists_threshold(mut self, threshold: u32) -> Self {
        self.exists_threshold = threshold;
        self
    }

    /// Store a snippet, then link it. The snippet is committed before any
    /// linking starts and survives linking failures.
    pub fn save_snippet(&self, snippet: &Snippet, mode: &LinkMode) -> Result<(i64, LinkReport)> {
        let id = self.store.insert_snippet(snippet)?;
        let report = self.link_snippet(id, mode)?;
        Ok((id, report))
    }

    /// Link an existing snippet to contacts according to `mode`
    pub fn link_snippet(&self, snippet_id: i64, mode: &LinkMode) -> Result<LinkReport> {
        let snippet = self
            .store
            .get_snippet(snippet_id)?
            .ok_or(Error::EntityNotFound(EntityRef::snippet(snippet_id)))?;

        let names = match mode {
            LinkMode::None => Vec::new(),
            LinkMode::Auto => self
                .classifier
                .person_names(&snippet.text)
                .into_iter()
                .map(|p| p.name)
                .collect(),
            LinkMode::Explicit(names) => dedup_names(names),
        };

        let explicit = matches!(mode, LinkMode::Explicit(_));
        let mut report = LinkReport::new(snippet_id);
        let mut linked_ids = HashSet::new();

        for name in names {
            let outcome = self
                .store
                .transaction(|tx| self.link_name(tx, snippet_id, &name, explicit));

            match outcome {
                Ok(NameOutcome::Linked(linked)) => {
                    if linked_ids.insert(linked.contact_id) {
                        report.linked.push(linked);
                    }
                }
                Ok(NameOutcome::Ambiguous(amb)) => {
                    tracing::warn!("'{}' is ambiguous ({} candidates), not linked", amb.name, amb.candidates.len());
                    report.ambiguous.push(amb);
                }
                Err(e) => {
                    tracing::warn!("Failed to link '{}' to snippet {}: {}", name, snippet_id, e);
                    report.failed.push(FailedName {
                        name,
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::debug!(
            "snippet {} linked ({}): {} linked, {} ambiguous, {} failed",
            snippet_id,
            mode,
            report.linked.len(),
            report.ambiguous.len(),
            report.failed.len()
        );

        Ok(report)
    }

    /// Link a snippet to a known contact. Returns false if the edge existed.
    pub fn link_contact(&self, snippet_id: i64, contact_id: i64) -> Result<bool> {
        let snippet = EntityRef::snippet(snippet_id);
        let contact = EntityRef::contact(contact_id);

        self.store.transaction(|tx| {
            if !tx.entity_exists(snippet)? {
                return Err(Error::EntityNotFound(snippet));
            }
            if !tx.entity_exists(contact)? {
                return Err(Error::EntityNotFound(contact));
            }
            let created = tx.insert_edge(&RelationshipEdge::new(snippet, contact, RelationshipKind::Mentions))?;
            tx.mark_contact_referenced(contact_id, now_timestamp())?;
            Ok(created)
        })
    }

    fn link_name(&self, tx: &StoreTx<'_>, snippet_id: i64, name: &str, explicit: bool) -> Result<NameOutcome> {
        let contacts = tx.all_contacts()?;

        let existing = if explicit {
            match resolve(name, &contacts, self.exists_threshold) {
                Resolution::Matched(scored) => Some(scored.contact),
                Resolution::Ambiguous(tied) => {
                    return Ok(NameOutcome::Ambiguous(AmbiguousName {
                        name: name.to_string(),
                        candidates: tied.iter().map(Candidate::from).collect(),
                    }));
                }
                Resolution::Unmatched => None,
            }
        } else {
            rank_contacts(name, &contacts)
                .into_iter()
                .next()
                .filter(|best| best.score >= self.exists_threshold)
                .map(|best| best.contact)
        };

        let (contact_id, contact_name, created_contact) = match existing {
            Some(contact) => (contact.id, contact.name, false),
            None => {
                let contact = Contact::new(name.trim());
                let id = tx.insert_contact(&contact)?;
                (id, contact.name, true)
            }
        };

        let created_edge = tx.insert_edge(&RelationshipEdge::new(
            EntityRef::snippet(snippet_id),
            EntityRef::contact(contact_id),
            RelationshipKind::Mentions,
        ))?;
        tx.mark_contact_referenced(contact_id, now_timestamp())?;

        Ok(NameOutcome::Linked(LinkedContact {
            contact_id,
            name: contact_name,
            requested: name.to_string(),
            created_contact,
            created_edge,
        }))
    }
}

/// Trimmed, non-empty names, first spelling of each normalized form kept
fn dedup_names(names: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .iter()
        .map(|n| n.trim())
        .filter(|n| !n.is_empty())
        .filter(|n| seen.insert(normalize_name(n)))
        .map(str::to_string)
        .collect()
}
