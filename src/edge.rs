//! Relationship edges between knowledge base entities
//!
//! Edges are directed and typed:
//! - `Mentions`: snippet → contact
//! - `RelatedTo`: snippet → project
//! - `LedBy`: project → contact
//! - `WorksOn`: contact → project
//! - `Wikilink`: any → any, from `[[...]]` style references
//!
//! Edges are only created at link time and never deleted automatically.

use crate::entity::EntityRef;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Relationship kinds between entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    /// Snippet mentions a person
    Mentions,
    /// Snippet belongs to a project
    RelatedTo,
    /// Project is led by a person
    LedBy,
    /// Person works on a project
    WorksOn,
    /// Free-form wiki style link
    Wikilink,
}

impl RelationshipKind {
    /// Get the string representation of the relationship kind
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipKind::Mentions => "mentions",
            RelationshipKind::RelatedTo => "related_to",
            RelationshipKind::LedBy => "led_by",
            RelationshipKind::WorksOn => "works_on",
            RelationshipKind::Wikilink => "wikilink",
        }
    }

    /// Label used when the edge is seen from its target end
    pub fn inverse_label(&self) -> &'static str {
        match self {
            RelationshipKind::Mentions => "mentioned_in",
            RelationshipKind::RelatedTo => "has_snippet",
            RelationshipKind::LedBy => "leads",
            RelationshipKind::WorksOn => "has_member",
            RelationshipKind::Wikilink => "linked_from",
        }
    }
}

impl FromStr for RelationshipKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "mentions" | "mention" => Ok(RelationshipKind::Mentions),
            "related_to" | "related" => Ok(RelationshipKind::RelatedTo),
            "led_by" | "lead" => Ok(RelationshipKind::LedBy),
            "works_on" => Ok(RelationshipKind::WorksOn),
            "wikilink" | "link" => Ok(RelationshipKind::Wikilink),
            _ => Err(crate::Error::InvalidEntity(format!("Unknown relationship kind: {}", s))),
        }
    }
}

impl std::fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which end of an edge the walk started from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Seed is the edge source
    Outgoing,
    /// Seed is the edge target
    Incoming,
}

/// A directed, typed link between two entities.
///
/// `strength` is clamped to `[0.0, 1.0]`; links made by the user are 1.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipEdge {
    pub from: EntityRef,
    pub to: EntityRef,
    pub kind: RelationshipKind,
    pub strength: f32,
}

impl RelationshipEdge {
    /// Create a full-strength edge
    pub fn new(from: EntityRef, to: EntityRef, kind: RelationshipKind) -> Self {
        Self {
            from,
            to,
            kind,
            strength: 1.0,
        }
    }

    /// Create an edge with a specific strength
    pub fn with_strength(from: EntityRef, to: EntityRef, kind: RelationshipKind, strength: f32) -> Self {
        Self {
            from,
            to,
            kind,
            strength: strength.clamp(0.0, 1.0),
        }
    }

    /// The endpoint opposite `entity`, with the direction it was reached in
    pub fn other_end(&self, entity: &EntityRef) -> Option<(EntityRef, Direction)> {
        if self.from == *entity {
            Some((self.to, Direction::Outgoing))
        } else if self.to == *entity {
            Some((self.from, Direction::Incoming))
        } else {
            None
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }
}

impl PartialEq for RelationshipEdge {
    fn eq(&self, other: &Self) -> bool {
        self.from == other.from && self.to == other.to && self.kind == other.kind
    }
}

impl Eq for RelationshipEdge {}

impl std::hash::Hash for RelationshipEdge {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.from.hash(state);
        self.to.hash(state);
        self.kind.hash(state);
    }
}
