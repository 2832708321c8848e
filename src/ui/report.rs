//! Human rendering of analysis results and link reports

use owo_colors::OwoColorize;

use crate::analyzer::{ActionKind, AnalysisResult};
use crate::linker::{LinkReport, SaveChoice};
use crate::ui::{bullet, dim, entity, pattern, section, theme, Icons};

pub fn analysis(result: &AnalysisResult) {
    let kind = result
        .detected_type
        .map(|k| format!("{} {}", Icons::for_pattern(k), k.label()))
        .unwrap_or_else(|| "plain text".to_string());
    println!("{} {} {}", Icons::BRAIN, entity(&result.selected_text), dim(&format!("({})", kind)));
    println!();
    println!("{}", result.smart_context);

    if !result.patterns.is_empty() {
        section("Patterns");
        for hit in &result.patterns {
            bullet(Icons::for_pattern(hit.kind), &format!("{} {}", pattern(&hit.text), dim(hit.kind.as_str())));
        }
    }

    if !result.abbreviations.is_empty() {
        section("Abbreviations");
        for abbr in &result.abbreviations {
            bullet(Icons::BOOK, &format!("{} = {} {}", entity(&abbr.abbr), abbr.full, dim(&abbr.category)));
        }
    }

    if !result.exact_matches.is_empty() {
        section("Matches");
        for m in &result.exact_matches {
            bullet(Icons::for_entity(m.entity.kind), &format!("{} {}", entity(&m.row.label()), dim(&m.entity.to_string())));
        }
    }

    if !result.related_items.is_empty() {
        section("Related");
        for item in &result.related_items {
            bullet(
                Icons::for_entity(item.entity.kind),
                &format!("{} {} {}", entity(&item.row.label()), dim(&item.relationship), dim(&format!("via {}", item.via))),
            );
        }
    }

    if !result.semantic_matches.is_empty() {
        section("Similar");
        for m in &result.semantic_matches {
            bullet(
                Icons::for_entity(m.entity.kind),
                &format!("{} {}", entity(&m.row.label()), dim(&format!("{:.0}%", m.score * 100.0))),
            );
        }
    }

    if !result.detected_people.is_empty() {
        section("People");
        for person in result.existing_people() {
            if person.is_ambiguous() {
                let ids: Vec<String> = person.candidates.iter().map(|id| format!("contact:{}", id)).collect();
                bullet(
                    Icons::PERSON,
                    &format!("{} {} {}", entity(&person.name), "ambiguous".style(theme().warn.clone()), dim(&ids.join(", "))),
                );
            } else {
                bullet(Icons::PERSON, &format!("{} {}", entity(&person.name), "known".style(theme().success.clone())));
            }
        }
        for person in result.new_people() {
            bullet(Icons::NEW, &format!("{} {}", entity(&person.name), "new".style(theme().warn.clone())));
        }
    }

    if !result.insights.is_empty() {
        section("Insights");
        for insight in &result.insights {
            bullet(Icons::BULB, insight);
        }
    }

    if !result.actions.is_empty() {
        section("Actions");
        for action in &result.actions {
            let target = match action.kind {
                ActionKind::Command => dim(&format!("[{}]", action.value)),
                _ => dim(&action.value),
            };
            bullet(Icons::BOLT, &format!("{} {}", action.label, target));
        }
    }
}

pub fn link_report(report: &LinkReport) {
    for linked in &report.linked {
        let icon = if linked.created_contact { Icons::NEW } else { Icons::LINK };
        let mut line = format!("{} {}", entity(&linked.name), dim(&format!("contact:{}", linked.contact_id)));
        if linked.created_contact {
            line.push_str(&format!(" {}", "new contact".style(theme().success.clone())));
        }
        if !linked.created_edge {
            line.push_str(&format!(" {}", dim("already linked")));
        }
        bullet(icon, &line);
    }

    for amb in &report.ambiguous {
        let candidates: Vec<String> = amb
            .candidates
            .iter()
            .map(|c| format!("{} (contact:{})", c.name, c.contact_id))
            .collect();
        bullet(
            Icons::THINKING,
            &format!(
                "{} {} {}",
                entity(&amb.name),
                "ambiguous:".style(theme().warn.clone()),
                candidates.join(", ")
            ),
        );
    }

    for failed in &report.failed {
        bullet(Icons::CROSS, &format!("{} {}", entity(&failed.name), failed.error.style(theme().error.clone())));
    }

    println!();
    println!("{}", report);
}

pub fn save_choices(choices: &[SaveChoice]) {
    for choice in choices {
        bullet(
            Icons::NOTE,
            &format!("{} {} {}", choice.label, dim(&format!("{:.0}%", choice.confidence * 100.0)), dim(&choice.reason)),
        );
    }
}
