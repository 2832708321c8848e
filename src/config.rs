use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::analyzer::AnalyzerConfig;
use crate::analyzer::actions::DEFAULT_TRACKER_URL;
use crate::embedding::BackendKind;
use crate::matching::SUBSTRING_SCORE;
use crate::pattern::matcher::DEFAULT_PROJECT_KEYS;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextualConfig {
    pub database: String,
    pub semantic: SemanticConfig,
    pub matching: MatchingConfig,
    pub tracker: TrackerConfig,
    pub watcher: WatcherConfig,
    pub server: ServerConfig,
}

impl Default for ContextualConfig {
    fn default() -> Self {
        Self {
            database: default_database_path().to_string_lossy().to_string(),
            semantic: SemanticConfig::default(),
            matching: MatchingConfig::default(),
            tracker: TrackerConfig::default(),
            watcher: WatcherConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticConfig {
    pub backend: BackendKind,
    pub threshold: f32,
    pub limit: usize,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            threshold: 0.5,
            limit: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    pub exists_threshold: u32,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            exists_threshold: SUBSTRING_SCORE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Ticket link with an `{id}` placeholder
    pub url_template: Option<String>,
    /// Project keys whose `KEY-123` ids are tickets
    pub project_keys: Vec<String>,
    /// Replaces the ticket-id regex built from `project_keys`
    pub ticket_pattern: Option<String>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            url_template: Some(DEFAULT_TRACKER_URL.to_string()),
            project_keys: DEFAULT_PROJECT_KEYS.iter().map(|k| k.to_string()).collect(),
            ticket_pattern: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    pub poll_interval_ms: u64,
    pub min_length: usize,
    /// argv of a command printing the current selection, e.g. `["wl-paste", "-p"]`
    pub command: Option<Vec<String>>,
    /// Read the selection from this file instead
    pub file: Option<String>,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            min_length: 3,
            command: None,
            file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8765,
        }
    }
}

impl ContextualConfig {
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.database)
    }

    pub fn analyzer_config(&self) -> AnalyzerConfig {
        AnalyzerConfig {
            exists_threshold: self.matching.exists_threshold,
            semantic_limit: self.semantic.limit,
            semantic_threshold: self.semantic.threshold,
            tracker_url_template: self.tracker.url_template.clone(),
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("contextual.toml")
}

pub fn default_database_path() -> PathBuf {
    PathBuf::from(".contextual").join("contextual.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<ContextualConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: ContextualConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &ContextualConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contextual.toml");
        std::fs::write(
            &path,
            r#"
database = "kb.db"

[semantic]
backend = "hashing"
threshold = 0.3

[tracker]
url_template = "https://tracker.example.com/browse/{id}"
"#,
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(config.database, "kb.db");
        assert_eq!(config.semantic.backend, BackendKind::Hashing);
        assert_eq!(config.semantic.limit, 5);
        assert_eq!(config.matching.exists_threshold, 8);
        assert_eq!(config.watcher.poll_interval_ms, 500);

        let analyzer = config.analyzer_config();
        assert_eq!(analyzer.semantic_threshold, 0.3);
        assert!(analyzer.tracker_url_template.is_some());
    }

    #[test]
    fn test_default_tracker() {
        let config = ContextualConfig::default();
        assert_eq!(config.tracker.project_keys, vec!["JT".to_string()]);

        let template = config.analyzer_config().tracker_url_template.unwrap();
        assert!(template.contains("{id}"));
    }

    #[test]
    fn test_project_keys_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contextual.toml");
        std::fs::write(&path, "[tracker]\nproject_keys = [\"OPS\", \"JT\"]\n").unwrap();

        let config = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(config.tracker.project_keys, vec!["OPS".to_string(), "JT".to_string()]);
        assert_eq!(config.tracker.url_template.as_deref(), Some(DEFAULT_TRACKER_URL));
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("nope.toml"))).unwrap().is_none());
    }

    #[test]
    fn test_write_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contextual.toml");
        let config = ContextualConfig::default();

        write_config(&path, &config, false).unwrap();
        assert!(write_config(&path, &config, false).is_err());
        write_config(&path, &config, true).unwrap();

        let loaded = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded.server.port, 8765);
    }

    #[test]
    fn test_ensure_db_dir() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("nested").join("kb.db");
        ensure_db_dir(&db).unwrap();
        assert!(db.parent().unwrap().exists());
    }
}
