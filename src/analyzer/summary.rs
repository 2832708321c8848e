//! Human-readable summary and insight strings

use crate::embedding::SimilarMatch;
use crate::entity::{Abbreviation, EntityKind, EntityRecord};
use crate::graph::RelatedItem;
use crate::matching::ExactMatch;
use crate::pattern::PatternKind;

use super::result::DetectedPerson;

pub const NO_CONTEXT: &str = "No additional context found.";

const MAX_NAMES: usize = 3;

fn with_article(label: &str) -> String {
    match label.chars().next() {
        Some(c) if "aeiou".contains(c) => format!("an {}", label),
        _ => format!("a {}", label),
    }
}

fn related_contact_names(related: &[RelatedItem]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for item in related {
        if let EntityRecord::Contact(contact) = &item.row {
            if !names.contains(&contact.name) {
                names.push(contact.name.clone());
            }
        }
    }
    names
}

/// One-paragraph summary, led by an abbreviation expansion when there is one
pub fn smart_context(
    detected_type: Option<PatternKind>,
    abbreviations: &[Abbreviation],
    exact_matches: &[ExactMatch],
    related_items: &[RelatedItem],
    semantic_matches: &[SimilarMatch],
) -> String {
    if let Some(abbr) = abbreviations.first() {
        let mut parts = vec![format!("'{}' stands for {}.", abbr.abbr, abbr.full)];
        if let Some(definition) = abbr.definition.as_deref().filter(|d| !d.trim().is_empty()) {
            let definition = definition.trim();
            if definition.ends_with('.') {
                parts.push(definition.to_string());
            } else {
                parts.push(format!("{}.", definition));
            }
        }
        parts.push(format!("Category: {}", abbr.category));
        return parts.join(" ");
    }

    let mut parts = Vec::new();

    if let Some(kind) = detected_type {
        parts.push(format!("This looks like {}.", with_article(kind.label())));
    }

    if let Some(contact) = exact_matches.iter().find_map(|m| m.row.as_contact()) {
        let mut details = Vec::new();
        if let Some(role) = &contact.role {
            details.push(role.clone());
        }
        if let Some(last) = &contact.last_contact {
            details.push(format!("Last contact: {}", last));
        }
        if let Some(next) = &contact.next_event {
            details.push(format!("Upcoming: {}", next));
        }
        if !details.is_empty() {
            parts.push(format!("{}: {}", contact.name, details.join(", ")));
        }
    }

    if let Some(project) = exact_matches.iter().find_map(|m| m.row.as_project()) {
        let mut details = Vec::new();
        if let Some(status) = &project.status {
            details.push(format!("Status: {}", status));
        }
        if let Some(lead) = &project.lead {
            details.push(format!("Lead: {}", lead));
        }
        if details.is_empty() {
            parts.push(format!("Project '{}'.", project.name));
        } else {
            parts.push(format!("Project '{}': {}", project.name, details.join(", ")));
        }
    }

    let has_entity_match = exact_matches
        .iter()
        .any(|m| matches!(m.entity.kind, EntityKind::Contact | EntityKind::Project));
    if !has_entity_match {
        if let Some(snippet) = exact_matches.iter().find_map(|m| m.row.as_snippet()) {
            parts.push(format!("Saved note: \"{}\"", snippet.preview(60)));
        }
    }

    if exact_matches.is_empty() {
        if let Some(top) = semantic_matches.first() {
            parts.push(format!("Similar to {} \"{}\" ({:.0}%).", top.entity.kind, top.row.label(), top.score * 100.0));
        }
    }

    let names = related_contact_names(related_items);
    if !names.is_empty() {
        let shown: Vec<_> = names.into_iter().take(MAX_NAMES).collect();
        parts.push(format!("Related to: {}", shown.join(", ")));
    }

    if parts.is_empty() {
        NO_CONTEXT.to_string()
    } else {
        parts.join(" ")
    }
}

/// Short actionable observations from structured fields
pub fn insights(
    exact_matches: &[ExactMatch],
    related_items: &[RelatedItem],
    detected_people: &[DetectedPerson],
) -> Vec<String> {
    let mut insights: Vec<String> = Vec::new();
    let mut push = |insight: String| {
        if !insights.contains(&insight) {
            insights.push(insight);
        }
    };

    for m in exact_matches {
        match &m.row {
            EntityRecord::Contact(contact) => {
                if let Some(event) = &contact.next_event {
                    push(format!("Upcoming event with {}: {}", contact.name, event));
                }
            }
            EntityRecord::Project(project) => {
                if let Some(status) = &project.status {
                    push(format!("Project '{}' is {}", project.name, status));
                }
            }
            EntityRecord::Snippet(_) => {
                let projects: Vec<String> = related_items
                    .iter()
                    .filter(|item| item.via == m.entity)
                    .filter_map(|item| item.row.as_project().map(|p| p.name.clone()))
                    .collect();
                if !projects.is_empty() {
                    push(format!("This is related to: {}", projects.join(", ")));
                }
            }
            EntityRecord::Abbreviation(_) => {}
        }
    }

    let names = related_contact_names(related_items);
    if names.len() > 1 {
        let shown: Vec<_> = names.into_iter().take(MAX_NAMES).collect();
        push(format!("Multiple people involved: {}", shown.join(", ")));
    }

    let unknown: Vec<&str> = detected_people
        .iter()
        .filter(|p| !p.exists)
        .map(|p| p.name.as_str())
        .collect();
    if !unknown.is_empty() {
        push(format!("Not in contacts yet: {}", unknown.join(", ")));
    }

    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::{Direction, RelationshipKind};
    use crate::entity::{Contact, EntityRef, Project, Snippet};

    fn contact_match(id: i64, contact: Contact) -> ExactMatch {
        let mut contact = contact;
        contact.id = id;
        ExactMatch::new(EntityRecord::Contact(contact))
    }

    fn related_contact(id: i64, name: &str, via: EntityRef) -> RelatedItem {
        let mut contact = Contact::new(name);
        contact.id = id;
        RelatedItem {
            entity: EntityRef::contact(id),
            row: EntityRecord::Contact(contact),
            kind: RelationshipKind::Mentions,
            relationship: "mentions".to_string(),
            direction: Direction::Outgoing,
            strength: 1.0,
            via,
        }
    }

    #[test]
    fn test_abbreviation_leads() {
        let abbr = Abbreviation::new("API", "Application Programming Interface")
            .with_definition("A contract between programs")
            .with_category("Tech");
        let text = smart_context(Some(PatternKind::Acronym), &[abbr], &[], &[], &[]);
        assert_eq!(
            text,
            "'API' stands for Application Programming Interface. A contract between programs. Category: Tech"
        );
    }

    #[test]
    fn test_type_and_contact_details() {
        let contact = Contact::new("Sarah Mitchell")
            .with_role("Security Lead")
            .with_next_event("OAuth review on Friday");
        let text = smart_context(Some(PatternKind::Email), &[], &[contact_match(1, contact)], &[], &[]);
        assert_eq!(
            text,
            "This looks like an email address. Sarah Mitchell: Security Lead, Upcoming: OAuth review on Friday"
        );
    }

    #[test]
    fn test_project_and_related() {
        let mut project = Project::new("Atlas").with_status("active").with_lead("Sarah Mitchell");
        project.id = 3;
        let exact = vec![ExactMatch::new(EntityRecord::Project(project))];
        let related = vec![related_contact(1, "Sarah Mitchell", EntityRef::project(3))];

        let text = smart_context(None, &[], &exact, &related, &[]);
        assert_eq!(text, "Project 'Atlas': Status: active, Lead: Sarah Mitchell Related to: Sarah Mitchell");
    }

    #[test]
    fn test_nothing_found() {
        assert_eq!(smart_context(None, &[], &[], &[], &[]), NO_CONTEXT);
    }

    #[test]
    fn test_insights() {
        let contact = Contact::new("Sarah Mitchell").with_next_event("1:1 on Monday");
        let mut snippet = Snippet::new("Atlas notes");
        snippet.id = 7;
        let mut project = Project::new("Atlas");
        project.id = 2;

        let exact = vec![
            contact_match(1, contact),
            ExactMatch::new(EntityRecord::Snippet(snippet)),
        ];
        let related = vec![
            related_contact(4, "John Davis", EntityRef::snippet(7)),
            related_contact(5, "Maria Lopez", EntityRef::snippet(7)),
            RelatedItem {
                entity: EntityRef::project(2),
                row: EntityRecord::Project(project),
                kind: RelationshipKind::RelatedTo,
                relationship: "related_to".to_string(),
                direction: Direction::Outgoing,
                strength: 1.0,
                via: EntityRef::snippet(7),
            },
        ];
        let people = vec![DetectedPerson {
            name: "Pat Quinn".to_string(),
            normalized: "pat quinn".to_string(),
            exists: false,
            contact_id: None,
            contact_name: None,
            score: 0,
            candidates: Vec::new(),
        }];

        let found = insights(&exact, &related, &people);
        assert_eq!(
            found,
            vec![
                "Upcoming event with Sarah Mitchell: 1:1 on Monday".to_string(),
                "This is related to: Atlas".to_string(),
                "Multiple people involved: John Davis, Maria Lopez".to_string(),
                "Not in contacts yet: Pat Quinn".to_string(),
            ]
        );
    }
}
