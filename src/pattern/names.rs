//! Person-name heuristic: two or more capitalized ASCII tokens
//!
//! Known limitation: names with diacritics or non-Latin scripts are not
//! detected, and nicknames are not related to full names ("Bob" is not "Robert").

use std::collections::HashSet;

use regex::Regex;

use super::PersonName;
use crate::{Error, Result};

/// A run of capitalized tokens separated by spaces or tabs (never newlines)
const RUN_PATTERN: &str = r"\b[A-Z](?:[a-z]+|'[A-Z][a-z]+)(?:-[A-Z][a-z]+)?(?:[ \t]+[A-Z](?:[a-z]+|'[A-Z][a-z]+)(?:-[A-Z][a-z]+)?)+\b";
const TOKEN_PATTERN: &str = r"[A-Z](?:[a-z]+|'[A-Z][a-z]+)(?:-[A-Z][a-z]+)?";

/// Capitalized words that start sentences or join names rather than being part of one
const STOPWORDS: &[&str] = &[
    "a", "about", "and", "ask", "at", "by", "call", "called", "cc", "dear", "email", "for", "from",
    "fwd", "hello", "hey", "hi", "in", "invite", "met", "meeting", "of", "on", "or", "per", "ping", "please", "re", "said",
    "says", "team", "tell", "thank", "thanks", "the", "to", "today", "tomorrow", "via", "with",
    "yesterday", "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december",
];

/// Lowercase, single-spaced form of a name
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .map(|token| token.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

pub struct NameExtractor {
    run: Regex,
    token: Regex,
}

impl NameExtractor {
    pub fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| Error::Config(format!("invalid name pattern: {}", e)))
        };
        Ok(Self {
            run: compile(RUN_PATTERN)?,
            token: compile(TOKEN_PATTERN)?,
        })
    }

    /// Distinct names in order of first mention
    pub fn extract(&self, text: &str) -> Vec<PersonName> {
        let mut seen = HashSet::new();
        let mut names = Vec::new();

        for run in self.run.find_iter(text) {
            let mut group: Vec<(usize, usize)> = Vec::new();
            let tokens: Vec<_> = self.token.find_iter(run.as_str()).collect();

            for (i, token) in tokens.iter().enumerate() {
                let is_stop = STOPWORDS.contains(&token.as_str().to_lowercase().as_str());
                if !is_stop {
                    group.push((run.start() + token.start(), run.start() + token.end()));
                }
                if is_stop || i == tokens.len() - 1 {
                    if group.len() >= 2 {
                        let start = group[0].0;
                        let end = group[group.len() - 1].1;
                        let name = &text[start..end];
                        let normalized = normalize_name(name);
                        if seen.insert(normalized.clone()) {
                            names.push(PersonName {
                                name: name.split_whitespace().collect::<Vec<_>>().join(" "),
                                normalized,
                                start,
                            });
                        }
                    }
                    group.clear();
                }
            }
        }

        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(text: &str) -> Vec<String> {
        NameExtractor::new()
            .unwrap()
            .extract(text)
            .into_iter()
            .map(|n| n.name)
            .collect()
    }

    #[test]
    fn test_two_names() {
        assert_eq!(
            names("Met with Sarah Mitchell and John Davis"),
            vec!["Sarah Mitchell", "John Davis"]
        );
    }

    #[test]
    fn test_leading_sentence_word_trimmed() {
        assert_eq!(names("Yesterday Sarah Mitchell called"), vec!["Sarah Mitchell"]);
        assert_eq!(names("Met With Sarah Mitchell And John Davis"), vec!["Sarah Mitchell", "John Davis"]);
    }

    #[test]
    fn test_single_capitalized_word_is_not_a_name() {
        assert!(names("Sarah said hello").is_empty());
        assert!(names("Hello World").is_empty());
        assert!(names("API rollout").is_empty());
    }

    #[test]
    fn test_repeat_mentions_deduplicated() {
        let found = NameExtractor::new()
            .unwrap()
            .extract("Sarah Mitchell called. Later sarah mitchell... no, Sarah  Mitchell again");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].normalized, "sarah mitchell");
        assert_eq!(found[0].start, 0);
    }

    #[test]
    fn test_three_token_name() {
        assert_eq!(names("Invite Elizabeth Thompson Jr to the review"), vec!["Elizabeth Thompson Jr"]);
    }

    #[test]
    fn test_hyphen_and_apostrophe() {
        assert_eq!(names("Ping Mary O'Brien-Smith"), vec!["Mary O'Brien-Smith"]);
    }

    #[test]
    fn test_names_do_not_cross_lines() {
        assert!(names("Sarah\nMitchell").is_empty());
    }

    #[test]
    fn test_non_ascii_not_detected() {
        assert!(names("José Álvarez").is_empty());
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Sarah   MITCHELL "), "sarah mitchell");
    }
}
