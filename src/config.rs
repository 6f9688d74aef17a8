use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ArcaConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
    pub llm: LlmConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub transport: String,
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
    pub default_collection: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub model: String,
    pub cache_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    pub default_limit: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Memory results returned alongside documents in `search_with_memory`.
    pub memory_results: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: String,
    pub model: String,
    /// Anthropic API key. Usually left empty here and taken from ANTHROPIC_API_KEY.
    pub api_key: String,
    /// Ollama endpoint for the local provider.
    pub ollama_host: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for ArcaConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            embedding: EmbeddingConfig::default(),
            retrieval: RetrievalConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: "stdio".into(),
            host: "127.0.0.1".into(),
            port: 8337,
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_arca_dir()
            .join("arca.db")
            .to_string_lossy()
            .into_owned();
        Self {
            db_path,
            default_collection: "documents".into(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        let cache_dir = default_arca_dir()
            .join("models")
            .to_string_lossy()
            .into_owned();
        Self {
            provider: "local".into(),
            model: "all-MiniLM-L6-v2".into(),
            cache_dir,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_limit: 5,
            chunk_size: 500,
            chunk_overlap: 50,
            memory_results: 3,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".into(),
            model: String::new(),
            api_key: String::new(),
            ollama_host: "http://localhost:11434".into(),
            max_tokens: 4096,
            temperature: 0.7,
        }
    }
}

/// Returns `~/.arca/`
pub fn default_arca_dir() -> PathBuf {
    dirs::home_dir()
        .expect("home directory must exist")
        .join(".arca")
}

/// Returns the default config file path: `~/.arca/config.toml`
pub fn default_config_path() -> PathBuf {
    default_arca_dir().join("config.toml")
}

impl ArcaConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            ArcaConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides.
    ///
    /// `ARCA_DB`, `ARCA_COLLECTION`, `ARCA_LOG_LEVEL`, `ARCA_LLM_PROVIDER`,
    /// `ANTHROPIC_API_KEY`, `OLLAMA_HOST`.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("ARCA_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("ARCA_COLLECTION") {
            self.storage.default_collection = val;
        }
        if let Ok(val) = std::env::var("ARCA_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("ARCA_LLM_PROVIDER") {
            self.llm.provider = val;
        }
        if let Ok(val) = std::env::var("ANTHROPIC_API_KEY") {
            self.llm.api_key = val;
        }
        if let Ok(val) = std::env::var("OLLAMA_HOST") {
            self.llm.ollama_host = val;
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .expect("home directory must exist")
            .join(rest)
    } else {
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ArcaConfig::default();
        assert_eq!(config.server.transport, "stdio");
        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.storage.default_collection, "documents");
        assert_eq!(config.retrieval.chunk_size, 500);
        assert_eq!(config.retrieval.chunk_overlap, 50);
        assert_eq!(config.retrieval.memory_results, 3);
        assert!(config.storage.db_path.ends_with("arca.db"));
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[server]
log_level = "debug"

[storage]
db_path = "/tmp/test.db"
default_collection = "knowledge"

[retrieval]
default_limit = 10

[llm]
provider = "ollama"
model = "llama3.3"
"#;
        let config: ArcaConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.log_level, "debug");
        assert_eq!(config.storage.db_path, "/tmp/test.db");
        assert_eq!(config.storage.default_collection, "knowledge");
        assert_eq!(config.retrieval.default_limit, 10);
        assert_eq!(config.llm.provider, "ollama");
        // defaults still apply for unset fields
        assert_eq!(config.retrieval.chunk_size, 500);
        assert_eq!(config.llm.ollama_host, "http://localhost:11434");
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = ArcaConfig::default();
        std::env::set_var("ARCA_DB", "/tmp/override.db");
        std::env::set_var("ARCA_COLLECTION", "env-docs");
        std::env::set_var("ARCA_LOG_LEVEL", "trace");

        config.apply_env_overrides();

        assert_eq!(config.storage.db_path, "/tmp/override.db");
        assert_eq!(config.storage.default_collection, "env-docs");
        assert_eq!(config.server.log_level, "trace");

        // Clean up
        std::env::remove_var("ARCA_DB");
        std::env::remove_var("ARCA_COLLECTION");
        std::env::remove_var("ARCA_LOG_LEVEL");
    }
}
