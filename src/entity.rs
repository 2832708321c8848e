//! Entity types - the knowledge base records
//!
//! Four entity kinds live in the knowledge base:
//! - `Contact`: a person, matched by name and email
//! - `Snippet`: a saved span of text, linked to contacts and projects
//! - `Project`: a named piece of work with a status
//! - `Abbreviation`: an acronym with its full form and definition
//!
//! Every persisted entity is addressed by an `EntityRef` (`kind:id`).

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

/// The kinds of records stored in the knowledge base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Contact,
    Snippet,
    Project,
    Abbreviation,
}

impl EntityKind {
    /// Get the string representation of the entity kind
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Contact => "contact",
            EntityKind::Snippet => "snippet",
            EntityKind::Project => "project",
            EntityKind::Abbreviation => "abbreviation",
        }
    }

    /// Kinds that carry a representative text and get an embedding
    pub fn is_embeddable(&self) -> bool {
        matches!(self, EntityKind::Contact | EntityKind::Snippet | EntityKind::Project)
    }
}

impl FromStr for EntityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "contact" | "contacts" | "person" | "people" => Ok(EntityKind::Contact),
            "snippet" | "snippets" | "note" => Ok(EntityKind::Snippet),
            "project" | "projects" => Ok(EntityKind::Project),
            "abbreviation" | "abbreviations" | "abbr" | "acronym" => Ok(EntityKind::Abbreviation),
            _ => Err(Error::InvalidEntity(format!("Unknown entity kind: {}", s))),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stable address of a persisted entity.
///
/// Text form is `<kind>:<id>`, e.g. `contact:12` or `snippet:3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityRef {
    #[serde(rename = "entity_type")]
    pub kind: EntityKind,
    #[serde(rename = "entity_id")]
    pub id: i64,
}

impl EntityRef {
    pub fn new(kind: EntityKind, id: i64) -> Self {
        Self { kind, id }
    }

    pub fn contact(id: i64) -> Self {
        Self::new(EntityKind::Contact, id)
    }

    pub fn snippet(id: i64) -> Self {
        Self::new(EntityKind::Snippet, id)
    }

    pub fn project(id: i64) -> Self {
        Self::new(EntityKind::Project, id)
    }

    /// Parse a `<kind>:<id>` string
    pub fn parse(s: &str) -> Result<Self> {
        let (kind_str, id_str) = s
            .split_once(':')
            .ok_or_else(|| Error::InvalidEntity(format!("Expected <kind>:<id>, got '{}'", s)))?;

        let kind = EntityKind::from_str(kind_str.trim())?;
        let id: i64 = id_str
            .trim()
            .parse()
            .map_err(|_| Error::InvalidEntity(format!("Invalid entity id: {}", id_str)))?;

        Ok(Self { kind, id })
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

impl FromStr for EntityRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Current time as unix seconds
pub fn now_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// A person in the knowledge base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    /// Row id (0 until persisted)
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub role: Option<String>,
    /// Free-text notes about the person
    pub context: Option<String>,
    pub last_contact: Option<String>,
    pub next_event: Option<String>,
    pub tags: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
    /// When a snippet was last linked to this contact
    pub last_referenced_at: Option<i64>,
}

impl Contact {
    pub fn new(name: impl Into<String>) -> Self {
        let now = now_timestamp();
        Self {
            id: 0, // Set by DB
            name: name.into(),
            email: None,
            role: None,
            context: None,
            last_contact: None,
            next_event: None,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
            last_referenced_at: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_next_event(mut self, next_event: impl Into<String>) -> Self {
        self.next_event = Some(next_event.into());
        self
    }

    pub fn with_last_contact(mut self, last_contact: impl Into<String>) -> Self {
        self.last_contact = Some(last_contact.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::contact(self.id)
    }

    /// Text embedded for semantic search: name, role and context
    pub fn embedding_text(&self) -> String {
        let mut parts = vec![self.name.clone()];
        if let Some(role) = &self.role {
            parts.push(role.clone());
        }
        if let Some(context) = &self.context {
            parts.push(context.clone());
        }
        parts.join(" ")
    }
}

/// A saved span of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    /// Row id (0 until persisted)
    pub id: i64,
    pub text: String,
    pub tags: Vec<String>,
    pub source: Option<String>,
    pub created_at: i64,
    /// Contacts and projects this snippet references
    #[serde(default)]
    pub links: Vec<EntityRef>,
}

impl Snippet {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: 0, // Set by DB
            text: text.into(),
            tags: Vec::new(),
            source: None,
            created_at: now_timestamp(),
            links: Vec::new(),
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::snippet(self.id)
    }

    pub fn embedding_text(&self) -> String {
        self.text.clone()
    }

    /// First line of the snippet, cut to `max_chars`
    pub fn preview(&self, max_chars: usize) -> String {
        let first_line = self.text.trim().lines().next().unwrap_or("");
        if first_line.chars().count() > max_chars {
            let cut: String = first_line.chars().take(max_chars).collect();
            format!("{}...", cut.trim_end())
        } else {
            first_line.to_string()
        }
    }
}

/// A project with a status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Row id (0 until persisted)
    pub id: i64,
    pub name: String,
    pub status: Option<String>,
    pub description: Option<String>,
    /// Name of the person leading the project
    pub lead: Option<String>,
    pub tags: Vec<String>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0, // Set by DB
            name: name.into(),
            status: None,
            description: None,
            lead: None,
            tags: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_lead(mut self, lead: impl Into<String>) -> Self {
        self.lead = Some(lead.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::project(self.id)
    }

    pub fn embedding_text(&self) -> String {
        match &self.description {
            Some(description) => format!("{} {}", self.name, description),
            None => self.name.clone(),
        }
    }
}

/// An acronym and what it stands for.
///
/// `abbr` is unique per category, compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Abbreviation {
    /// Row id (0 until persisted)
    pub id: i64,
    pub abbr: String,
    pub full: String,
    pub definition: Option<String>,
    pub category: String,
    pub examples: Vec<String>,
    pub related: Vec<String>,
    pub links: Vec<String>,
}

impl Abbreviation {
    pub fn new(abbr: impl Into<String>, full: impl Into<String>) -> Self {
        Self {
            id: 0, // Set by DB
            abbr: abbr.into(),
            full: full.into(),
            definition: None,
            category: "General".to_string(),
            examples: Vec::new(),
            related: Vec::new(),
            links: Vec::new(),
        }
    }

    pub fn with_definition(mut self, definition: impl Into<String>) -> Self {
        self.definition = Some(definition.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_examples(mut self, examples: Vec<String>) -> Self {
        self.examples = examples;
        self
    }

    pub fn with_related(mut self, related: Vec<String>) -> Self {
        self.related = related;
        self
    }

    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::new(EntityKind::Abbreviation, self.id)
    }
}

/// A full row of any entity kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum EntityRecord {
    Contact(Contact),
    Snippet(Snippet),
    Project(Project),
    Abbreviation(Abbreviation),
}

impl EntityRecord {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRecord::Contact(_) => EntityKind::Contact,
            EntityRecord::Snippet(_) => EntityKind::Snippet,
            EntityRecord::Project(_) => EntityKind::Project,
            EntityRecord::Abbreviation(_) => EntityKind::Abbreviation,
        }
    }

    pub fn entity_ref(&self) -> EntityRef {
        match self {
            EntityRecord::Contact(c) => c.entity_ref(),
            EntityRecord::Snippet(s) => s.entity_ref(),
            EntityRecord::Project(p) => p.entity_ref(),
            EntityRecord::Abbreviation(a) => a.entity_ref(),
        }
    }

    /// Short human label for the record
    pub fn label(&self) -> String {
        match self {
            EntityRecord::Contact(c) => c.name.clone(),
            EntityRecord::Snippet(s) => s.preview(60),
            EntityRecord::Project(p) => p.name.clone(),
            EntityRecord::Abbreviation(a) => a.abbr.clone(),
        }
    }

    pub fn as_contact(&self) -> Option<&Contact> {
        match self {
            EntityRecord::Contact(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_project(&self) -> Option<&Project> {
        match self {
            EntityRecord::Project(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_snippet(&self) -> Option<&Snippet> {
        match self {
            EntityRecord::Snippet(s) => Some(s),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_kind_roundtrip() {
        for kind in [
            EntityKind::Contact,
            EntityKind::Snippet,
            EntityKind::Project,
            EntityKind::Abbreviation,
        ] {
            let parsed: EntityKind = kind.as_str().parse().unwrap();
            assert_eq!(kind, parsed);
        }
    }

    #[test]
    fn test_entity_kind_aliases() {
        assert_eq!(EntityKind::from_str("person").unwrap(), EntityKind::Contact);
        assert_eq!(EntityKind::from_str("abbr").unwrap(), EntityKind::Abbreviation);
        assert!(EntityKind::from_str("symbol").is_err());
    }

    #[test]
    fn test_entity_ref_parse() {
        let entity = EntityRef::parse("contact:12").unwrap();
        assert_eq!(entity, EntityRef::contact(12));
        assert_eq!(entity.to_string(), "contact:12");

        assert!(EntityRef::parse("contact").is_err());
        assert!(EntityRef::parse("contact:abc").is_err());
        assert!(EntityRef::parse("widget:1").is_err());
    }

    #[test]
    fn test_embedding_text() {
        let contact = Contact::new("Sarah Mitchell")
            .with_role("Security Lead")
            .with_context("Owns the OAuth rollout");
        assert_eq!(contact.embedding_text(), "Sarah Mitchell Security Lead Owns the OAuth rollout");

        let project = Project::new("Atlas").with_description("Identity platform rewrite");
        assert_eq!(project.embedding_text(), "Atlas Identity platform rewrite");
    }

    #[test]
    fn test_snippet_preview() {
        let snippet = Snippet::new("JWT Authentication Discussion\nWe agreed to rotate refresh tokens weekly");
        assert_eq!(snippet.preview(60), "JWT Authentication Discussion");
        assert_eq!(snippet.preview(3), "JWT...");
    }

    #[test]
    fn test_record_serializes_with_type_tag() {
        let record = EntityRecord::Project(Project::new("Atlas"));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "project");
        assert_eq!(json["data"]["name"], "Atlas");
    }
}
