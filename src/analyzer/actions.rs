//! Suggested actions, from a static per-type mapping

use std::collections::HashSet;

use crate::matching::ExactMatch;
use crate::pattern::{Classification, PatternKind};

use super::result::{ActionKind, SuggestedAction};

pub const SAVE_SNIPPET_COMMAND: &str = "save_snippet";

/// Tracker link used for ticket ids unless the config names another
pub const DEFAULT_TRACKER_URL: &str = "https://jira.company.com/browse/{id}";

/// Actions for the primary type, then per matched contact, then universal ones.
/// Labels are unique; the first occurrence wins.
pub fn suggest_actions(
    selected_text: &str,
    classification: &Classification,
    exact_matches: &[ExactMatch],
    tracker_url_template: Option<&str>,
) -> Vec<SuggestedAction> {
    let mut actions = Vec::new();

    if let Some(kind) = classification.primary {
        let value = classification
            .first(kind)
            .map(|hit| hit.text.clone())
            .unwrap_or_else(|| selected_text.to_string());

        match kind {
            PatternKind::TicketId => {
                if let Some(template) = tracker_url_template {
                    actions.push(SuggestedAction::new(
                        "Open in tracker",
                        ActionKind::Url,
                        template.replace("{id}", &value),
                        "external-link",
                    ));
                }
                actions.push(SuggestedAction::new("Copy ticket ID", ActionKind::Copy, value, "clipboard"));
            }
            PatternKind::Email => {
                actions.push(SuggestedAction::new("Send email", ActionKind::Url, format!("mailto:{}", value), "mail"));
                actions.push(SuggestedAction::new("Copy email", ActionKind::Copy, value, "clipboard"));
            }
            PatternKind::Url => {
                actions.push(SuggestedAction::new("Open URL", ActionKind::Url, value.clone(), "external-link"));
                actions.push(SuggestedAction::new("Copy URL", ActionKind::Copy, value, "clipboard"));
            }
            PatternKind::Phone => {
                let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
                actions.push(SuggestedAction::new("Call", ActionKind::Url, format!("tel:{}", digits), "phone"));
                actions.push(SuggestedAction::new("Copy number", ActionKind::Copy, value, "clipboard"));
            }
            PatternKind::Date => {
                actions.push(SuggestedAction::new("Copy date", ActionKind::Copy, value, "calendar"));
            }
            PatternKind::Acronym => {}
        }
    }

    for contact in exact_matches.iter().filter_map(|m| m.row.as_contact()) {
        if let Some(email) = &contact.email {
            actions.push(SuggestedAction::new(
                format!("Email {}", contact.name),
                ActionKind::Url,
                format!("mailto:{}", email),
                "mail",
            ));
        }
    }

    actions.push(SuggestedAction::new(
        "Save as snippet",
        ActionKind::Command,
        SAVE_SNIPPET_COMMAND,
        "save",
    ));

    let mut seen = HashSet::new();
    actions.retain(|action| seen.insert(action.label.clone()));
    actions
}
