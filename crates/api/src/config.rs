use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub nlu: NluConfig,
    pub retry: RetryConfig,
    pub cache: CacheConfig,
    pub classifier: ClassifierConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NluConfig {
    pub url: String,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub version: String,
    /// Custom entity/relation model id
    pub model: Option<String>,
    pub emotion_targets: Vec<String>,
    pub entity_limit: u32,
    pub keyword_limit: u32,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub max_entries: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Report "Unrecognized" instead of scoring unknown labels as flood.
    pub strict_labels: bool,
    pub lexicon_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl Default for NluConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            version: annotation::client::DEFAULT_VERSION.to_string(),
            model: None,
            emotion_targets: vec!["flood".to_string(), "fire".to_string()],
            entity_limit: 2,
            keyword_limit: 2,
            request_timeout_secs: 30,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff_ms: 500,
            max_backoff_ms: 5000,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 10000,
        }
    }
}

impl AppConfig {
    /// Load from the JSON file named by `HAZARD_CONFIG` (if set), then
    /// apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var("HAZARD_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }

    pub fn apply_env<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = var("NATURAL_LANGUAGE_UNDERSTANDING_APIKEY") {
            self.nlu.api_key = key;
        }
        if let Some(url) = var("NATURAL_LANGUAGE_UNDERSTANDING_URL") {
            self.nlu.url = url;
        }
        if let Some(model) = var("NATURAL_LANGUAGE_UNDERSTANDING_MODEL") {
            self.nlu.model = Some(model).filter(|m| !m.is_empty());
        }
        if let Some(addr) = var("HAZARD_BIND_ADDR") {
            self.server.bind_addr = addr;
        } else if let Some(port) = var("PORT") {
            self.server.bind_addr = format!("0.0.0.0:{}", port);
        }
        if let Some(strict) = var("HAZARD_STRICT_LABELS") {
            self.classifier.strict_labels = matches!(strict.as_str(), "1" | "true" | "yes");
        }
        if let Some(path) = var("HAZARD_LEXICON") {
            self.classifier.lexicon_path = Some(PathBuf::from(path));
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.nlu.url.trim().is_empty() {
            anyhow::bail!("NATURAL_LANGUAGE_UNDERSTANDING_URL is not set");
        }
        if self.nlu.api_key.trim().is_empty() {
            anyhow::bail!("NATURAL_LANGUAGE_UNDERSTANDING_APIKEY is not set");
        }
        if self.cache.enabled && self.cache.max_entries == 0 {
            anyhow::bail!("cache.max_entries must be positive when the cache is enabled");
        }
        Ok(())
    }
}
