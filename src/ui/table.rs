use tabled::{settings::Style, Table, Tabled};

use crate::embedding::SimilarMatch;
use crate::storage::DbStats;

#[derive(Tabled)]
pub struct StatRow {
    #[tabled(rename = "Table")]
    pub table: String,
    #[tabled(rename = "Rows")]
    pub rows: usize,
}

#[derive(Tabled)]
pub struct SimilarRow {
    #[tabled(rename = "Score")]
    pub score: String,
    #[tabled(rename = "Kind")]
    pub kind: String,
    #[tabled(rename = "Ref")]
    pub entity: String,
    #[tabled(rename = "Label")]
    pub label: String,
}

pub fn stats_table(stats: &DbStats) -> String {
    let rows = vec![
        StatRow { table: "contacts".to_string(), rows: stats.contacts },
        StatRow { table: "snippets".to_string(), rows: stats.snippets },
        StatRow { table: "projects".to_string(), rows: stats.projects },
        StatRow { table: "abbreviations".to_string(), rows: stats.abbreviations },
        StatRow { table: "relationships".to_string(), rows: stats.relationships },
        StatRow { table: "embeddings".to_string(), rows: stats.embeddings },
    ];
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Empty string for no matches
pub fn similar_table(matches: &[SimilarMatch]) -> String {
    if matches.is_empty() {
        return String::new();
    }

    let rows: Vec<SimilarRow> = matches
        .iter()
        .map(|m| SimilarRow {
            score: format!("{:.2}", m.score),
            kind: m.entity.kind.to_string(),
            entity: m.entity.to_string(),
            label: truncate(&m.row.label(), 60),
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", cut)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_table_lists_every_table() {
        let stats = DbStats {
            contacts: 2,
            snippets: 5,
            ..DbStats::default()
        };
        let table = stats_table(&stats);
        assert!(table.contains("contacts"));
        assert!(table.contains("embeddings"));
        assert!(table.contains('5'));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }

    #[test]
    fn test_empty_similar_table() {
        assert!(similar_table(&[]).is_empty());
    }
}
