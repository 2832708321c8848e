//! Ranks what a selection could be saved as

use std::sync::Arc;

use serde::Serialize;

use crate::pattern::{Classifier, PatternKind};

/// Knowledge base record a selection can become
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveTarget {
    Person,
    Abbreviation,
    Snippet,
}

impl SaveTarget {
    pub fn label(&self) -> &'static str {
        match self {
            SaveTarget::Person => "Save as Person",
            SaveTarget::Abbreviation => "Save as Abbreviation",
            SaveTarget::Snippet => "Save as Snippet",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SaveChoice {
    pub target: SaveTarget,
    pub label: &'static str,
    pub confidence: f32,
    pub reason: String,
}

impl SaveChoice {
    fn new(target: SaveTarget, confidence: f32, reason: String) -> Self {
        Self {
            target,
            label: target.label(),
            confidence,
            reason,
        }
    }
}

const MIN_CONFIDENCE: f32 = 0.5;
const MAX_FULL_NAME_WORDS: usize = 4;

pub struct SaveAdvisor {
    classifier: Arc<dyn Classifier>,
}

impl SaveAdvisor {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self { classifier }
    }

    /// Options best first; a snippet option is always present
    pub fn choices(&self, text: &str) -> Vec<SaveChoice> {
        let trimmed = text.trim();
        let mut choices: Vec<SaveChoice> = Vec::new();

        if let Some(person) = self.classifier.person_names(trimmed).into_iter().next() {
            let whole = person.name == trimmed && trimmed.split_whitespace().count() <= MAX_FULL_NAME_WORDS;
            if whole {
                choices.push(SaveChoice::new(
                    SaveTarget::Person,
                    0.9,
                    format!("Found name pattern: '{}' (full match)", person.name),
                ));
            } else {
                choices.push(SaveChoice::new(
                    SaveTarget::Person,
                    0.6,
                    format!("Found name pattern: '{}'", person.name),
                ));
            }
        }

        let classification = self.classifier.classify(trimmed);

        let whole_acronym = classification
            .of_kind(PatternKind::Acronym)
            .any(|hit| hit.start == 0 && hit.end == trimmed.len());
        if whole_acronym {
            choices.push(SaveChoice::new(
                SaveTarget::Abbreviation,
                0.8,
                format!("Acronym pattern: '{}'", trimmed),
            ));
        }

        if let Some(email) = classification.first(PatternKind::Email) {
            choices.push(SaveChoice::new(
                SaveTarget::Person,
                0.95,
                format!("Email address detected: '{}'", email.text),
            ));
        }

        // one choice per target, keeping the most confident
        choices.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap_or(std::cmp::Ordering::Equal));
        let mut unique: Vec<SaveChoice> = Vec::new();
        for choice in choices {
            if choice.confidence >= MIN_CONFIDENCE && !unique.iter().any(|c| c.target == choice.target) {
                unique.push(choice);
            }
        }

        if unique.is_empty() {
            unique.push(SaveChoice::new(SaveTarget::Snippet, 1.0, "No specific pattern detected".to_string()));
        } else {
            unique.push(SaveChoice::new(SaveTarget::Snippet, 0.5, "Default option".to_string()));
        }

        unique
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::RegexClassifier;

    fn advisor() -> SaveAdvisor {
        SaveAdvisor::new(Arc::new(RegexClassifier::new().unwrap()))
    }

    fn targets(choices: &[SaveChoice]) -> Vec<SaveTarget> {
        choices.iter().map(|c| c.target).collect()
    }

    #[test]
    fn test_full_name() {
        let choices = advisor().choices("Sarah Mitchell");
        assert_eq!(targets(&choices), vec![SaveTarget::Person, SaveTarget::Snippet]);
        assert_eq!(choices[0].confidence, 0.9);
    }

    #[test]
    fn test_name_in_sentence() {
        let choices = advisor().choices("Met with Sarah Mitchell about the launch");
        assert_eq!(choices[0].target, SaveTarget::Person);
        assert_eq!(choices[0].confidence, 0.6);
    }

    #[test]
    fn test_email_beats_name() {
        let choices = advisor().choices("Sarah Mitchell sarah@x.com");
        assert_eq!(targets(&choices), vec![SaveTarget::Person, SaveTarget::Snippet]);
        assert_eq!(choices[0].confidence, 0.95);
    }

    #[test]
    fn test_acronym() {
        let choices = advisor().choices("  SLA ");
        assert_eq!(targets(&choices), vec![SaveTarget::Abbreviation, SaveTarget::Snippet]);

        let choices = advisor().choices("U.S.");
        assert_eq!(choices[0].target, SaveTarget::Abbreviation);

        let choices = advisor().choices("the SLA was missed");
        assert_eq!(targets(&choices), vec![SaveTarget::Snippet]);
    }

    #[test]
    fn test_plain_text_defaults_to_snippet() {
        let choices = advisor().choices("remember to water the plants");
        assert_eq!(choices.len(), 1);
        assert_eq!(choices[0].target, SaveTarget::Snippet);
        assert_eq!(choices[0].confidence, 1.0);
    }
}
