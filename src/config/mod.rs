//! Configuration module for Finna.

mod settings;

pub use settings::{
    ChunkingSettings, EmbeddingSettings, ExpansionSettings, GeneralSettings, SearchSettings,
    Settings, VectorStoreSettings,
};
