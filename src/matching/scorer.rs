//! Contact name scoring
//!
//! Ordinal scores between a candidate name and a stored contact name:
//! - 10: equal, ignoring case and spacing
//! - 8: one is a literal substring of the other
//! - k: k distinct name tokens shared (capped at 7 so it never reaches 8)
//! - 0: nothing in common

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::Serialize;

use crate::entity::Contact;
use crate::pattern::normalize_name;

pub const EXACT_SCORE: u32 = 10;
pub const SUBSTRING_SCORE: u32 = 8;
const MAX_TOKEN_SCORE: u32 = SUBSTRING_SCORE - 1;

/// Score a candidate name against a stored contact name
pub fn score_name(candidate: &str, stored: &str) -> u32 {
    let a = normalize_name(candidate);
    let b = normalize_name(stored);
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    if a == b {
        return EXACT_SCORE;
    }
    if a.contains(&b) || b.contains(&a) {
        return SUBSTRING_SCORE;
    }

    let stored_tokens: HashSet<&str> = b.split(' ').collect();
    let shared = a
        .split(' ')
        .collect::<HashSet<_>>()
        .intersection(&stored_tokens)
        .count() as u32;

    shared.min(MAX_TOKEN_SCORE)
}

/// A contact with its score against a candidate name
#[derive(Debug, Clone, Serialize)]
pub struct ScoredContact {
    pub contact: Contact,
    pub score: u32,
}

/// Outcome of resolving one name against the contact list
#[derive(Debug, Clone)]
pub enum Resolution {
    /// A single best contact at or above the threshold
    Matched(ScoredContact),
    /// Two or more contacts share the top score at or above the threshold
    Ambiguous(Vec<ScoredContact>),
    /// Best score below the threshold (or no overlap at all)
    Unmatched,
}

/// Deterministic order: score, then most recently referenced, then name, then id
fn compare(a: &ScoredContact, b: &ScoredContact) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| b.contact.last_referenced_at.cmp(&a.contact.last_referenced_at))
        .then_with(|| a.contact.name.to_lowercase().cmp(&b.contact.name.to_lowercase()))
        .then_with(|| a.contact.id.cmp(&b.contact.id))
}

/// All contacts scoring at least 1, best first
pub fn rank_contacts(candidate: &str, contacts: &[Contact]) -> Vec<ScoredContact> {
    let mut ranked: Vec<ScoredContact> = contacts
        .iter()
        .filter_map(|contact| {
            let score = score_name(candidate, &contact.name);
            (score >= 1).then(|| ScoredContact {
                contact: contact.clone(),
                score,
            })
        })
        .collect();

    ranked.sort_by(compare);
    ranked
}

/// Resolve a name, surfacing ties at the top instead of breaking them
pub fn resolve(candidate: &str, contacts: &[Contact], threshold: u32) -> Resolution {
    let ranked = rank_contacts(candidate, contacts);

    let Some(top) = ranked.first() else {
        return Resolution::Unmatched;
    };
    if top.score < threshold {
        return Resolution::Unmatched;
    }

    let top_score = top.score;
    let mut tied: Vec<ScoredContact> = ranked.into_iter().take_while(|c| c.score == top_score).collect();
    if tied.len() == 1 {
        Resolution::Matched(tied.remove(0))
    } else {
        Resolution::Ambiguous(tied)
    }
}
