// src/settings.rs

use std::path::Path;

use clap::Parser;
use config::{builder::DefaultState, ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};

const DEFAULT_SCHEMA_FILE: &str = "employee_ddl.sql";
const DEFAULT_INDEX_NAME: &str = "empindex";
const DEFAULT_INDEX_URL: &str = "http://localhost:9200";
const DEFAULT_LLM_URL: &str = "http://127.0.0.1:11434";
const DEFAULT_LLM_MODEL: &str = "llama3.1:8b";

#[derive(Parser, Debug)]
#[command(version)]
pub struct Args {
    /// Path to the local configuration TOML file.
    #[arg(short, value_name = "CONFIG_PATH")]
    pub config: Option<std::path::PathBuf>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IndexSettings {
    pub url: String,
    pub name: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Number of hits retrieved per question.
    pub search_size: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LlmSettings {
    pub url: String,
    pub model: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChunkingSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub separators: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Settings {
    pub schema_file: String,
    pub index: IndexSettings,
    pub llm: LlmSettings,
    pub chunking: ChunkingSettings,
}

impl Settings {
    /// Load settings from the given TOML file, with sane defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let cfg = Self::builder()?.add_source(File::from(path)).build()?;
        cfg.try_deserialize()
    }

    /// Default settings when no configuration file is given.
    pub fn from_defaults() -> Result<Self, ConfigError> {
        let cfg = Self::builder()?.build()?;
        cfg.try_deserialize()
    }

    fn builder() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .set_default("schema_file", DEFAULT_SCHEMA_FILE)?
            .set_default("index.url", DEFAULT_INDEX_URL)?
            .set_default("index.name", DEFAULT_INDEX_NAME)?
            .set_default("index.search_size", 1)?
            .set_default("llm.url", DEFAULT_LLM_URL)?
            .set_default("llm.model", DEFAULT_LLM_MODEL)?
            .set_default("chunking.chunk_size", 1000)?
            .set_default("chunking.chunk_overlap", 0)?
            .set_default("chunking.separators", vec![" ", ",", "\n"])
    }
}
