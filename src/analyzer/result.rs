//! Analysis result types

use serde::{Deserialize, Serialize};

use crate::entity::Abbreviation;
use crate::graph::RelatedItem;
use crate::embedding::SimilarMatch;
use crate::matching::ExactMatch;
use crate::pattern::{PatternHit, PatternKind};

/// A person name found in the selection, with its best contact match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedPerson {
    /// Name as written in the selection
    pub name: String,
    pub normalized: String,
    /// Best score reached the existence threshold
    pub exists: bool,
    /// Matched contact, only when `exists`
    pub contact_id: Option<i64>,
    pub contact_name: Option<String>,
    /// Best score across all contacts (0 when none overlap)
    pub score: u32,
    /// Every contact sharing the top score when more than one does.
    /// `contact_id` is then only the deterministic first pick.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub candidates: Vec<i64>,
}

impl DetectedPerson {
    pub fn is_ambiguous(&self) -> bool {
        self.candidates.len() > 1
    }
}

/// What an action does when the caller executes it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Open `value` as a URL (`https:`, `mailto:`, `tel:`)
    Url,
    /// Copy `value` to the clipboard
    Copy,
    /// Run an application command named by `value`
    Command,
}

/// A suggested next step for the selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedAction {
    pub label: String,
    pub kind: ActionKind,
    pub value: String,
    pub icon: String,
}

impl SuggestedAction {
    pub fn new(label: impl Into<String>, kind: ActionKind, value: impl Into<String>, icon: &str) -> Self {
        Self {
            label: label.into(),
            kind,
            value: value.into(),
            icon: icon.to_string(),
        }
    }
}

/// Everything `analyze` learned about a selection
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub selected_text: String,
    pub detected_type: Option<PatternKind>,
    pub patterns: Vec<PatternHit>,
    pub abbreviations: Vec<Abbreviation>,
    pub exact_matches: Vec<ExactMatch>,
    pub related_items: Vec<RelatedItem>,
    pub semantic_matches: Vec<SimilarMatch>,
    pub detected_people: Vec<DetectedPerson>,
    pub smart_context: String,
    pub insights: Vec<String>,
    pub actions: Vec<SuggestedAction>,
}

impl AnalysisResult {
    /// Result for blank input: nothing matched, no actions
    pub fn empty(selected_text: &str) -> Self {
        Self {
            selected_text: selected_text.to_string(),
            detected_type: None,
            patterns: Vec::new(),
            abbreviations: Vec::new(),
            exact_matches: Vec::new(),
            related_items: Vec::new(),
            semantic_matches: Vec::new(),
            detected_people: Vec::new(),
            smart_context: super::summary::NO_CONTEXT.to_string(),
            insights: Vec::new(),
            actions: Vec::new(),
        }
    }

    /// No pattern, abbreviation, match or person was found
    pub fn is_empty(&self) -> bool {
        self.detected_type.is_none()
            && self.abbreviations.is_empty()
            && self.exact_matches.is_empty()
            && self.related_items.is_empty()
            && self.semantic_matches.is_empty()
            && self.detected_people.is_empty()
    }

    pub fn existing_people(&self) -> impl Iterator<Item = &DetectedPerson> {
        self.detected_people.iter().filter(|p| p.exists)
    }

    pub fn new_people(&self) -> impl Iterator<Item = &DetectedPerson> {
        self.detected_people.iter().filter(|p| !p.exists)
    }
}
