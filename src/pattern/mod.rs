//! Pattern classification and person-name extraction
//!
//! The `Classifier` trait is the seam the synthesizer and linker depend on.
//! `RegexClassifier` is the built-in implementation: priority-ordered format
//! rules plus an ASCII capitalized-token name heuristic. A stronger detector
//! can replace it without changing either caller.

pub mod matcher;
pub mod names;

use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub use matcher::PatternMatcher;
pub use names::{NameExtractor, normalize_name};

use crate::Result;

/// Formats recognized in selected text, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    /// Issue-tracker identifier such as `JT-346`
    TicketId,
    Email,
    Url,
    Phone,
    /// ISO calendar date
    Date,
    /// Short uppercase token such as `API` or `U.S.`
    Acronym,
}

impl PatternKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKind::TicketId => "ticket_id",
            PatternKind::Email => "email",
            PatternKind::Url => "url",
            PatternKind::Phone => "phone",
            PatternKind::Date => "date",
            PatternKind::Acronym => "acronym",
        }
    }

    /// All kinds, highest priority first
    pub fn by_priority() -> &'static [PatternKind] {
        &[
            PatternKind::TicketId,
            PatternKind::Email,
            PatternKind::Url,
            PatternKind::Phone,
            PatternKind::Date,
            PatternKind::Acronym,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            PatternKind::TicketId => "ticket",
            PatternKind::Email => "email address",
            PatternKind::Url => "link",
            PatternKind::Phone => "phone number",
            PatternKind::Date => "date",
            PatternKind::Acronym => "acronym",
        }
    }
}

impl FromStr for PatternKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "ticket_id" | "ticket" | "jira_ticket" => Ok(PatternKind::TicketId),
            "email" => Ok(PatternKind::Email),
            "url" => Ok(PatternKind::Url),
            "phone" => Ok(PatternKind::Phone),
            "date" => Ok(PatternKind::Date),
            "acronym" | "abbreviation" => Ok(PatternKind::Acronym),
            _ => Err(crate::Error::InvalidInput(format!("Unknown pattern kind: {}", s))),
        }
    }
}

impl std::fmt::Display for PatternKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One matched substring with its byte span in the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternHit {
    pub kind: PatternKind,
    pub text: String,
    pub start: usize,
    pub end: usize,
}

impl PatternHit {
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        self.start < end && start < self.end
    }
}

/// Result of classifying a span of text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// Highest-priority kind among the hits
    pub primary: Option<PatternKind>,
    /// Every accepted hit, ordered by position
    pub hits: Vec<PatternHit>,
}

impl Classification {
    /// First hit of a kind, by position
    pub fn first(&self, kind: PatternKind) -> Option<&PatternHit> {
        self.hits.iter().find(|h| h.kind == kind)
    }

    pub fn of_kind(&self, kind: PatternKind) -> impl Iterator<Item = &PatternHit> {
        self.hits.iter().filter(move |h| h.kind == kind)
    }
}

/// A name-shaped substring found in text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonName {
    /// The name as written
    pub name: String,
    /// Lowercase, single-spaced form used for deduplication
    pub normalized: String,
    /// Byte offset of the first mention
    pub start: usize,
}

/// Text classifier used by the synthesizer and the linker.
pub trait Classifier: Send + Sync {
    /// Detect format hits and pick the primary type
    fn classify(&self, text: &str) -> Classification;

    /// Distinct person names in order of first mention
    fn person_names(&self, text: &str) -> Vec<PersonName>;
}

/// Regex-based classifier with ASCII-only name detection.
pub struct RegexClassifier {
    matcher: PatternMatcher,
    names: NameExtractor,
}

impl RegexClassifier {
    pub fn new() -> Result<Self> {
        Ok(Self {
            matcher: PatternMatcher::new()?,
            names: NameExtractor::new()?,
        })
    }

    /// Recognize tickets for these tracker project keys, e.g. `["JT", "OPS"]`
    pub fn with_project_keys<S: AsRef<str>>(keys: &[S]) -> Result<Self> {
        Ok(Self {
            matcher: PatternMatcher::with_project_keys(keys)?,
            names: NameExtractor::new()?,
        })
    }

    /// Use a custom ticket-id regex, e.g. `\bJT-\d+\b` for a single tracker
    pub fn with_ticket_pattern(pattern: &str) -> Result<Self> {
        Ok(Self {
            matcher: PatternMatcher::with_ticket_pattern(pattern)?,
            names: NameExtractor::new()?,
        })
    }
}

impl Classifier for RegexClassifier {
    fn classify(&self, text: &str) -> Classification {
        self.matcher.classify(text)
    }

    fn person_names(&self, text: &str) -> Vec<PersonName> {
        self.names.extract(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order() {
        let kinds = PatternKind::by_priority();
        assert_eq!(kinds.first(), Some(&PatternKind::TicketId));
        assert_eq!(kinds.last(), Some(&PatternKind::Acronym));
    }

    #[test]
    fn test_pattern_kind_roundtrip() {
        for kind in PatternKind::by_priority() {
            let parsed: PatternKind = kind.as_str().parse().unwrap();
            assert_eq!(*kind, parsed);
        }
        assert_eq!("jira_ticket".parse::<PatternKind>().unwrap(), PatternKind::TicketId);
    }

    #[test]
    fn test_classifier_is_object_safe() {
        let classifier: Box<dyn Classifier> = Box::new(RegexClassifier::new().unwrap());
        let result = classifier.classify("JT-346");
        assert_eq!(result.primary, Some(PatternKind::TicketId));
        assert_eq!(classifier.person_names("Met with Sarah Mitchell").len(), 1);
    }
}
