//! Relationship graph walker
//!
//! One-hop expansion from a set of seed entities over `RelationshipEdge`s, in
//! both directions. Seeds never appear in the output, and an entity reached by
//! several edges is reported once with its strongest edge.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::debug;

use crate::Result;
use crate::edge::{Direction, RelationshipEdge, RelationshipKind};
use crate::entity::{EntityRecord, EntityRef};
use crate::storage::SqliteStore;

/// An entity one hop away from a seed
#[derive(Debug, Clone, Serialize)]
pub struct RelatedItem {
    #[serde(flatten)]
    pub entity: EntityRef,
    pub row: EntityRecord,
    pub kind: RelationshipKind,
    /// `kind` as read from the seed's side, e.g. `mentions` or `mentioned_in`
    pub relationship: String,
    pub direction: Direction,
    pub strength: f32,
    /// Seed the edge was reached from
    pub via: EntityRef,
}

struct Candidate {
    edge: RelationshipEdge,
    direction: Direction,
    via: EntityRef,
}

/// Walks the relationship table one hop out from a seed set
pub struct GraphWalker<'a> {
    store: &'a SqliteStore,
}

impl<'a> GraphWalker<'a> {
    pub fn new(store: &'a SqliteStore) -> Self {
        Self { store }
    }

    /// Related items ordered by strength (descending), then entity
    pub fn related(&self, seeds: &[EntityRef]) -> Result<Vec<RelatedItem>> {
        if seeds.is_empty() {
            return Ok(Vec::new());
        }

        let seed_set: HashSet<EntityRef> = seeds.iter().copied().collect();

        self.store.read(|db| {
            let mut best: HashMap<EntityRef, Candidate> = HashMap::new();

            for seed in seeds {
                for edge in db.relationships_for(*seed)? {
                    let Some((other, direction)) = edge.other_end(seed) else {
                        continue;
                    };
                    if seed_set.contains(&other) {
                        continue;
                    }

                    let replace = match best.get(&other) {
                        Some(existing) => edge.strength > existing.edge.strength,
                        None => true,
                    };
                    if replace {
                        best.insert(other, Candidate { edge, direction, via: *seed });
                    }
                }
            }

            let mut items = Vec::with_capacity(best.len());
            for (entity, candidate) in best {
                let Some(row) = db.get_entity(entity)? else {
                    debug!(%entity, "skipping edge to missing entity");
                    continue;
                };

                let relationship = match candidate.direction {
                    Direction::Outgoing => candidate.edge.kind.as_str(),
                    Direction::Incoming => candidate.edge.kind.inverse_label(),
                };

                items.push(RelatedItem {
                    entity,
                    row,
                    kind: candidate.edge.kind,
                    relationship: relationship.to_string(),
                    direction: candidate.direction,
                    strength: candidate.edge.strength,
                    via: candidate.via,
                });
            }

            items.sort_by(|a, b| {
                b.strength
                    .partial_cmp(&a.strength)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.entity.cmp(&b.entity))
            });

            debug!(seeds = seeds.len(), related = items.len(), "graph walk");
            Ok(items)
        })
    }
}
