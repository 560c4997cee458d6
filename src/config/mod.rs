//! Configuration management.
//!
//! Sources, later wins: built-in defaults, a TOML file, then environment
//! variables. The environment is read through a lookup function so tests
//! can supply a map instead of touching the process environment.

use crate::observability::LogFormat;
use crate::{Error, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "ERRTRIAGE_CONFIG_PATH";

/// Main configuration for errtriage.
#[derive(Debug, Clone)]
pub struct TriageConfig {
    /// LLM provider configuration.
    pub llm: LlmConfig,
    /// Embedding configuration.
    pub embedding: EmbeddingConfig,
    /// Knowledge store configuration.
    pub store: VectorStoreConfig,
    /// Logging configuration.
    pub logging: LoggingSettings,
    /// Number of cases retrieved per query.
    pub top_k: usize,
}

/// LLM provider configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Provider to use.
    pub provider: LlmProvider,
    /// Model name; `None` uses the provider default.
    pub model: Option<String>,
    /// API key for hosted providers.
    pub api_key: Option<SecretString>,
    /// Base URL override (self-hosted or proxy).
    pub base_url: Option<String>,
    /// Request timeout in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: Option<u64>,
    /// Sampling temperature for triage stages.
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            model: None,
            api_key: None,
            base_url: None,
            timeout_ms: None,
            connect_timeout_ms: None,
            temperature: 0.0,
        }
    }
}

/// Available LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmProvider {
    /// `OpenAI` GPT.
    #[default]
    OpenAi,
    /// Anthropic Claude.
    Anthropic,
    /// Ollama (local).
    Ollama,
}

impl LlmProvider {
    /// Parses a provider string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an unknown provider.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "ollama" => Ok(Self::Ollama),
            other => Err(Error::Config(format!("unknown LLM provider '{other}'"))),
        }
    }
}

/// Embedding configuration.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingConfig {
    /// Embedding model; `None` uses `text-embedding-3-small`.
    pub model: Option<String>,
    /// `OpenAI` API key.
    pub api_key: Option<SecretString>,
    /// Base URL override.
    pub base_url: Option<String>,
}

/// Knowledge store backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    /// Hosted Pinecone index.
    #[default]
    Pinecone,
    /// Local JSON-persisted index.
    Local,
}

impl StoreBackend {
    /// Parses a backend string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an unknown backend.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pinecone" => Ok(Self::Pinecone),
            "local" => Ok(Self::Local),
            other => Err(Error::Config(format!("unknown store backend '{other}'"))),
        }
    }
}

/// Knowledge store configuration.
#[derive(Debug, Clone)]
pub struct VectorStoreConfig {
    /// Backend to use.
    pub backend: StoreBackend,
    /// Pinecone API key.
    pub api_key: Option<SecretString>,
    /// Pinecone environment, used as the serverless region.
    pub environment: Option<String>,
    /// Pinecone index name.
    pub index_name: Option<String>,
    /// Embedding dimensions of the index.
    pub dimensions: usize,
    /// Pinecone control-plane URL.
    pub controller_url: String,
    /// Upper bound on waiting for a new index to become ready.
    pub ready_timeout_secs: u64,
    /// Index file for the local backend.
    pub path: Option<PathBuf>,
    /// Minimum similarity for local results.
    pub min_score: Option<f32>,
}

impl VectorStoreConfig {
    /// Default Pinecone control-plane URL.
    pub const DEFAULT_CONTROLLER_URL: &'static str = "https://api.pinecone.io";

    /// Default serverless region.
    pub const DEFAULT_REGION: &'static str = "us-east-1";

    /// Returns the serverless region for index creation.
    #[must_use]
    pub fn region(&self) -> &str {
        self.environment
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .unwrap_or(Self::DEFAULT_REGION)
    }

    /// Returns the local index path, defaulting under the user data dir.
    #[must_use]
    pub fn local_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| {
            directories::BaseDirs::new().map_or_else(
                || PathBuf::from(".errtriage").join("index.json"),
                |dirs| dirs.data_dir().join("errtriage").join("index.json"),
            )
        })
    }
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            api_key: None,
            environment: None,
            index_name: None,
            dimensions: crate::embedding::DEFAULT_DIMENSIONS,
            controller_url: Self::DEFAULT_CONTROLLER_URL.to_string(),
            ready_timeout_secs: 60,
            path: None,
            min_score: None,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default)]
pub struct LoggingSettings {
    /// Output format.
    pub format: LogFormat,
    /// Log file; `None` writes to stderr.
    pub file: Option<PathBuf>,
    /// Filter directive used when `RUST_LOG` is unset.
    pub filter: Option<String>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Number of cases retrieved per query.
    pub top_k: Option<usize>,
    /// LLM configuration.
    pub llm: Option<ConfigFileLlm>,
    /// Embedding configuration.
    pub embedding: Option<ConfigFileEmbedding>,
    /// Store configuration.
    pub store: Option<ConfigFileStore>,
    /// Logging configuration.
    pub logging: Option<ConfigFileLogging>,
}

/// LLM section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileLlm {
    /// Provider name.
    pub provider: Option<String>,
    /// Model name.
    pub model: Option<String>,
    /// API key.
    pub api_key: Option<String>,
    /// Base URL.
    pub base_url: Option<String>,
    /// Request timeout in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: Option<u64>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
}

/// Embedding section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileEmbedding {
    /// Model name.
    pub model: Option<String>,
    /// API key.
    pub api_key: Option<String>,
    /// Base URL.
    pub base_url: Option<String>,
}

/// Store section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileStore {
    /// Backend name.
    pub backend: Option<String>,
    /// Pinecone API key.
    pub api_key: Option<String>,
    /// Pinecone environment.
    pub environment: Option<String>,
    /// Pinecone index name.
    pub index_name: Option<String>,
    /// Index dimensions.
    pub dimensions: Option<usize>,
    /// Control-plane URL.
    pub controller_url: Option<String>,
    /// Ready wait bound in seconds.
    pub ready_timeout_secs: Option<u64>,
    /// Local index path.
    pub path: Option<String>,
    /// Local minimum similarity.
    pub min_score: Option<f32>,
}

/// Logging section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileLogging {
    /// Format name.
    pub format: Option<String>,
    /// Log file path.
    pub file: Option<String>,
    /// Filter directive.
    pub filter: Option<String>,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            embedding: EmbeddingConfig::default(),
            store: VectorStoreConfig::default(),
            logging: LoggingSettings::default(),
            top_k: 3,
        }
    }
}

impl TriageConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read config file {}: {e}", path.display()))
        })?;

        let file: ConfigFile = toml::from_str(&contents).map_err(|e| {
            Error::Config(format!("cannot parse config file {}: {e}", path.display()))
        })?;

        Self::from_config_file(file)
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the following paths in order:
    /// 1. Platform-specific config dir (`~/Library/Application Support/errtriage/` on macOS)
    /// 2. XDG config dir (`~/.config/errtriage/` for Unix compatibility)
    ///
    /// Returns default configuration if no config file is found.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a config file exists but is invalid.
    pub fn load_default() -> Result<Self> {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Ok(Self::default());
        };

        let platform_config = base_dirs.config_dir().join("errtriage").join("config.toml");
        if platform_config.exists() {
            return Self::load_from_file(&platform_config);
        }

        let xdg_config = base_dirs
            .home_dir()
            .join(".config")
            .join("errtriage")
            .join("config.toml");
        if xdg_config.exists() {
            return Self::load_from_file(&xdg_config);
        }

        Ok(Self::default())
    }

    /// Resolves and loads the full configuration.
    ///
    /// The file is `explicit` if given, else the path in
    /// `ERRTRIAGE_CONFIG_PATH`, else the default location. Environment
    /// overrides are applied last.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file or an environment value is invalid.
    pub fn load<F>(explicit: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_path = lookup(CONFIG_PATH_ENV).filter(|p| !p.trim().is_empty());
        let mut config = match (explicit, env_path) {
            (Some(path), _) => Self::load_from_file(path)?,
            (None, Some(path)) => Self::load_from_file(Path::new(&path))?,
            (None, None) => Self::load_default()?,
        };
        config.apply_env(lookup)?;
        Ok(config)
    }

    /// Converts a `ConfigFile` to `TriageConfig`.
    fn from_config_file(file: ConfigFile) -> Result<Self> {
        let mut config = Self::default();

        if let Some(top_k) = file.top_k {
            config.top_k = top_k;
        }
        if let Some(llm) = file.llm {
            if let Some(provider) = llm.provider {
                config.llm.provider = LlmProvider::parse(&provider)?;
            }
            config.llm.model = llm.model;
            config.llm.api_key = llm.api_key.map(SecretString::from);
            config.llm.base_url = llm.base_url;
            config.llm.timeout_ms = llm.timeout_ms;
            config.llm.connect_timeout_ms = llm.connect_timeout_ms;
            if let Some(temperature) = llm.temperature {
                config.llm.temperature = temperature;
            }
        }
        if let Some(embedding) = file.embedding {
            config.embedding.model = embedding.model;
            config.embedding.api_key = embedding.api_key.map(SecretString::from);
            config.embedding.base_url = embedding.base_url;
        }
        if let Some(store) = file.store {
            if let Some(backend) = store.backend {
                config.store.backend = StoreBackend::parse(&backend)?;
            }
            config.store.api_key = store.api_key.map(SecretString::from);
            config.store.environment = store.environment;
            config.store.index_name = store.index_name;
            if let Some(dimensions) = store.dimensions {
                config.store.dimensions = dimensions;
            }
            if let Some(url) = store.controller_url {
                config.store.controller_url = url;
            }
            if let Some(secs) = store.ready_timeout_secs {
                config.store.ready_timeout_secs = secs;
            }
            config.store.path = store.path.map(PathBuf::from);
            config.store.min_score = store.min_score;
        }
        if let Some(logging) = file.logging {
            if let Some(format) = logging.format {
                config.logging.format = LogFormat::parse(&format)?;
            }
            config.logging.file = logging.file.map(PathBuf::from);
            config.logging.filter = logging.filter;
        }

        Ok(config)
    }

    /// Applies environment overrides read through `lookup`.
    ///
    /// Blank values are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for unparseable values.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(provider) = get("ERRTRIAGE_LLM_PROVIDER") {
            self.llm.provider = LlmProvider::parse(&provider)?;
        }
        if let Some(model) = get("ERRTRIAGE_LLM_MODEL") {
            self.llm.model = Some(model);
        }
        if let Some(url) = get("ERRTRIAGE_LLM_BASE_URL") {
            self.llm.base_url = Some(url);
        }
        if let Some(ms) = get("ERRTRIAGE_LLM_TIMEOUT_MS") {
            self.llm.timeout_ms = Some(parse_number("ERRTRIAGE_LLM_TIMEOUT_MS", &ms)?);
        }
        if let Some(ms) = get("ERRTRIAGE_LLM_CONNECT_TIMEOUT_MS") {
            self.llm.connect_timeout_ms =
                Some(parse_number("ERRTRIAGE_LLM_CONNECT_TIMEOUT_MS", &ms)?);
        }

        let openai_key = get("OPENAI_API_KEY");
        let llm_key = match self.llm.provider {
            LlmProvider::OpenAi => openai_key.clone(),
            LlmProvider::Anthropic => get("ANTHROPIC_API_KEY"),
            LlmProvider::Ollama => None,
        };
        if let Some(key) = llm_key {
            self.llm.api_key = Some(SecretString::from(key));
        }
        if let Some(key) = openai_key {
            self.embedding.api_key = Some(SecretString::from(key));
        }

        if let Some(key) = get("PINECONE_API_KEY") {
            self.store.api_key = Some(SecretString::from(key));
        }
        if let Some(env) = get("PINECONE_ENV") {
            self.store.environment = Some(env);
        }
        if let Some(name) = get("PINECONE_INDEX_NAME") {
            self.store.index_name = Some(name);
        }
        if let Some(backend) = get("ERRTRIAGE_STORE_BACKEND") {
            self.store.backend = StoreBackend::parse(&backend)?;
        }
        if let Some(path) = get("ERRTRIAGE_STORE_PATH") {
            self.store.path = Some(PathBuf::from(path));
        }

        if let Some(top_k) = get("ERRTRIAGE_TOP_K") {
            self.top_k = parse_number("ERRTRIAGE_TOP_K", &top_k)?;
        }
        if let Some(format) = get("ERRTRIAGE_LOG_FORMAT") {
            self.logging.format = LogFormat::parse(&format)?;
        }
        if let Some(file) = get("ERRTRIAGE_LOG_FILE") {
            self.logging.file = Some(PathBuf::from(file));
        }

        Ok(())
    }

    /// Sets the store backend.
    #[must_use]
    pub const fn with_backend(mut self, backend: StoreBackend) -> Self {
        self.store.backend = backend;
        self
    }

    /// Sets the number of cases retrieved per query.
    #[must_use]
    pub const fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{name} must be a non-negative integer, got '{value}'")))
}
