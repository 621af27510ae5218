//! Configuration settings for Finna.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub embedding: EmbeddingSettings,
    pub expansion: ExpansionSettings,
    pub chunking: ChunkingSettings,
    pub vector_store: VectorStoreSettings,
    pub search: SearchSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding provider (openai).
    pub provider: String,
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions. Must match the collection schema.
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: 384,
        }
    }
}

/// Query expansion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionSettings {
    /// Enable LLM query expansion for searches.
    pub enabled: bool,
    /// Chat model used to generate query variations.
    pub model: String,
    /// Number of variations requested per query.
    pub variations: usize,
}

impl Default for ExpansionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            model: "gpt-4o-mini".to_string(),
            variations: 4,
        }
    }
}

/// Transcript chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Sentences of context on each side of a chunk's center sentence.
    pub window_size: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self { window_size: 2 }
    }
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    /// Vector store provider (qdrant, memory).
    pub provider: String,
    /// Qdrant gRPC URL (for qdrant provider).
    pub url: String,
    /// Qdrant API key (for hosted instances).
    pub api_key: Option<String>,
    /// Collection holding session records.
    pub sessions_collection: String,
    /// Collection holding transcript chunks.
    pub chunks_collection: String,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            provider: "qdrant".to_string(),
            url: "http://localhost:6334".to_string(),
            api_key: None,
            sessions_collection: "videos".to_string(),
            chunks_collection: "video_chunks".to_string(),
        }
    }
}

/// Search ranking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Nearest neighbors fetched per query variation.
    pub per_query_limit: usize,
    /// Maximum entries in a ranked result list.
    pub max_results: usize,
    /// Below this many tracked sessions, skip ranking and return everything.
    pub cold_start_threshold: usize,
    /// Excerpt length (characters) for cold-start results.
    pub excerpt_chars: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            per_query_limit: 10,
            max_results: 10,
            cold_start_threshold: 10,
            excerpt_chars: 200,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::FinnaError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("finna")
            .join("config.toml")
    }
}
