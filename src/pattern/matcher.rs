//! Priority-ordered format detection

use regex::Regex;

use super::{Classification, PatternHit, PatternKind};
use crate::{Error, Result};

/// Tracker project keys recognized when none are configured
pub const DEFAULT_PROJECT_KEYS: &[&str] = &["JT"];

const EMAIL_PATTERN: &str = r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b";
const URL_PATTERN: &str = r#"https?://[^\s<>"']*[^\s<>"'.,;:!?)\]]"#;
const PHONE_PATTERN: &str = r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b";
const DATE_PATTERN: &str = r"\b\d{4}-(?:0[1-9]|1[0-2])-(?:0[1-9]|[12]\d|3[01])\b";
const ACRONYM_PATTERN: &str = r"\b[A-Z]{2,6}[0-9]*\b";
const DOTTED_ACRONYM_PATTERN: &str = r"\b(?:[A-Z]\.){2,}";

struct Rule {
    kind: PatternKind,
    regex: Regex,
}

/// Detects ticket ids, emails, urls, phone numbers, dates and acronyms.
///
/// Rules run in priority order. A hit overlapping a span already claimed by a
/// higher-priority rule is dropped, so `JT` inside `JT-346` is not an acronym.
pub struct PatternMatcher {
    rules: Vec<Rule>,
}

impl PatternMatcher {
    pub fn new() -> Result<Self> {
        Self::with_project_keys(DEFAULT_PROJECT_KEYS)
    }

    /// Ticket ids are `KEY-123` or `KEY123` for one of the given project keys
    pub fn with_project_keys<S: AsRef<str>>(keys: &[S]) -> Result<Self> {
        Self::with_ticket_pattern(&ticket_pattern(keys)?)
    }

    pub fn with_ticket_pattern(ticket_pattern: &str) -> Result<Self> {
        let specs = [
            (PatternKind::TicketId, ticket_pattern),
            (PatternKind::Email, EMAIL_PATTERN),
            (PatternKind::Url, URL_PATTERN),
            (PatternKind::Phone, PHONE_PATTERN),
            (PatternKind::Date, DATE_PATTERN),
            (PatternKind::Acronym, DOTTED_ACRONYM_PATTERN),
            (PatternKind::Acronym, ACRONYM_PATTERN),
        ];

        let rules = specs
            .into_iter()
            .map(|(kind, pattern)| {
                Regex::new(pattern)
                    .map(|regex| Rule { kind, regex })
                    .map_err(|e| Error::Config(format!("invalid {} pattern: {}", kind, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { rules })
    }

    pub fn classify(&self, text: &str) -> Classification {
        let mut hits: Vec<PatternHit> = Vec::new();

        for rule in &self.rules {
            for m in rule.regex.find_iter(text) {
                if hits.iter().any(|h| h.overlaps(m.start(), m.end())) {
                    continue;
                }
                hits.push(PatternHit {
                    kind: rule.kind,
                    text: m.as_str().to_string(),
                    start: m.start(),
                    end: m.end(),
                });
            }
        }

        let primary = PatternKind::by_priority()
            .iter()
            .copied()
            .find(|kind| hits.iter().any(|h| h.kind == *kind));

        hits.sort_by_key(|h| h.start);

        Classification { primary, hits }
    }

    /// Primary type only
    pub fn primary_type(&self, text: &str) -> Option<PatternKind> {
        self.classify(text).primary
    }
}

/// Builds `\b(?:KEY1|KEY2)-?\d+\b`, escaping each key
pub fn ticket_pattern<S: AsRef<str>>(keys: &[S]) -> Result<String> {
    let keys: Vec<String> = keys
        .iter()
        .map(|k| k.as_ref().trim())
        .filter(|k| !k.is_empty())
        .map(regex::escape)
        .collect();
    if keys.is_empty() {
        return Err(Error::Config("no tracker project keys configured".to_string()));
    }
    Ok(format!(r"\b(?:{})-?\d+\b", keys.join("|")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> PatternMatcher {
        PatternMatcher::new().unwrap()
    }

    #[test]
    fn test_ticket_id() {
        let result = matcher().classify("JT-346");
        assert_eq!(result.primary, Some(PatternKind::TicketId));
        assert_eq!(result.hits.len(), 1);
        assert_eq!(result.hits[0].text, "JT-346");
    }

    #[test]
    fn test_email() {
        assert_eq!(matcher().primary_type("sarah@x.com"), Some(PatternKind::Email));
    }

    #[test]
    fn test_acronym_case_sensitivity() {
        let m = matcher();
        assert_eq!(m.primary_type("API"), Some(PatternKind::Acronym));
        assert_eq!(m.primary_type("api"), None);
        assert_eq!(m.primary_type("Api"), None);
        assert_eq!(m.primary_type("APIs"), None);
        assert_eq!(m.primary_type("ABCDEFG"), None);
        assert_eq!(m.primary_type("HTTP2"), Some(PatternKind::Acronym));
    }

    #[test]
    fn test_dotted_acronym() {
        let result = matcher().classify("Shipped to the U.S.A. office");
        assert_eq!(result.primary, Some(PatternKind::Acronym));
        assert_eq!(result.hits[0].text, "U.S.A.");
    }

    #[test]
    fn test_url_trailing_punctuation() {
        let result = matcher().classify("See https://example.com/docs, then reply");
        assert_eq!(result.primary, Some(PatternKind::Url));
        assert_eq!(result.first(PatternKind::Url).unwrap().text, "https://example.com/docs");
    }

    #[test]
    fn test_phone_and_date() {
        let m = matcher();
        assert_eq!(m.primary_type("Call 555-123-4567"), Some(PatternKind::Phone));
        assert_eq!(m.primary_type("Due 2024-03-15"), Some(PatternKind::Date));
        assert_eq!(m.primary_type("2024-13-45"), None);
    }

    #[test]
    fn test_priority_and_positions() {
        let result = matcher().classify("Discuss API rollout in JT-12 with sarah@x.com");
        assert_eq!(result.primary, Some(PatternKind::TicketId));

        let kinds: Vec<_> = result.hits.iter().map(|h| h.kind).collect();
        assert_eq!(kinds, vec![PatternKind::Acronym, PatternKind::TicketId, PatternKind::Email]);
    }

    #[test]
    fn test_plain_prose_has_no_type() {
        let result = matcher().classify("Met with Sarah Mitchell and John Davis");
        assert_eq!(result.primary, None);
        assert!(result.hits.is_empty());
    }

    #[test]
    fn test_custom_ticket_pattern() {
        let m = PatternMatcher::with_ticket_pattern(r"\bJT-?\d+\b").unwrap();
        assert_eq!(m.primary_type("JT346"), Some(PatternKind::TicketId));
        assert_eq!(m.primary_type("ABC-12"), Some(PatternKind::Acronym));

        assert!(PatternMatcher::with_ticket_pattern("(unclosed").is_err());
    }

    #[test]
    fn test_hyphenated_tokens_are_not_tickets() {
        let m = matcher();
        for token in ["UTF-8", "SHA-256", "COVID-19", "MP3-2"] {
            assert_ne!(m.primary_type(token), Some(PatternKind::TicketId), "{}", token);
        }
        assert_eq!(m.primary_type("UTF-8"), Some(PatternKind::Acronym));
        assert_eq!(m.classify("SHA-256").hits[0].text, "SHA");
        assert_eq!(m.primary_type("JT346"), Some(PatternKind::TicketId));
    }

    #[test]
    fn test_project_keys() {
        let m = PatternMatcher::with_project_keys(&["JT", "OPS"]).unwrap();
        assert_eq!(m.primary_type("OPS-7 is down"), Some(PatternKind::TicketId));
        assert_eq!(m.primary_type("JT-346"), Some(PatternKind::TicketId));
        assert_eq!(m.primary_type("UTF-8"), Some(PatternKind::Acronym));

        assert_eq!(ticket_pattern(&["A.B"]).unwrap(), r"\b(?:A\.B)-?\d+\b");
        assert!(PatternMatcher::with_project_keys::<&str>(&[]).is_err());
        assert!(PatternMatcher::with_project_keys(&["  "]).is_err());
    }
}
