//! Configuration for data files, vocabulary and model backends
//!
//! Loads configuration from config.yml file

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::embeddings::{Embedder, EmbeddingService, LocalEmbedder};
use crate::graphrag::vocabulary::{
    default_countries, default_keywords, Country, CountryRegistry, KeywordRule, KeywordTable,
    Vocabulary, DEFAULT_COUNTRY_PROPERTY,
};
pub use crate::graphrag::context::DEFAULT_MAX_TOKENS;
pub use crate::graphrag::retriever::DEFAULT_TOP_K;
use crate::graphrag::store::keys;
use crate::integrations::ollama::OLLAMA_URL;
use crate::integrations::{Generator, OllamaClient, OpenAIClient};
use crate::{Error, Result};

/// Default constants (fallback if config.yml not found)
pub const DEFAULT_ENTITIES_PATH: &str = "all_entities_properties.json";
pub const DEFAULT_INDEX_PATH: &str = "grambank_entity_index.json";
pub const DEFAULT_IDS_PATH: &str = "entity_uris.txt";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_LOCAL_DIMENSION: usize = 384;
pub const DEFAULT_OPENAI_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_OPENAI_CHAT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OLLAMA_EMBEDDING_MODEL: &str = "nomic-embed-text";
pub const DEFAULT_OLLAMA_CHAT_MODEL: &str = "llama3.1:8b";

/// Where embeddings come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    #[default]
    OpenAI,
    Ollama,
    /// Hashed bag-of-words, no network
    Local,
}

/// Which model answers questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationBackend {
    #[default]
    OpenAI,
    Ollama,
}

/// YAML config structures
#[derive(Debug, Default, Deserialize)]
struct YamlConfig {
    data: Option<DataYaml>,
    retrieval: Option<RetrievalYaml>,
    vocabulary: Option<VocabularyYaml>,
    embedding: Option<EmbeddingYaml>,
    generation: Option<GenerationYaml>,
    openai: Option<OpenAIYaml>,
    ollama: Option<OllamaYaml>,
}

#[derive(Debug, Default, Deserialize)]
struct DataYaml {
    entities: Option<String>,
    index: Option<String>,
    ids: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RetrievalYaml {
    top_k: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct VocabularyYaml {
    label_key: Option<String>,
    country_property: Option<String>,
    countries: Option<Vec<Country>>,
    keywords: Option<Vec<KeywordRule>>,
}

#[derive(Debug, Default, Deserialize)]
struct EmbeddingYaml {
    backend: Option<EmbeddingBackend>,
    model: Option<String>,
    dimension: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct GenerationYaml {
    backend: Option<GenerationBackend>,
    model: Option<String>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAIYaml {
    api_key: Option<String>,
    base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OllamaYaml {
    url: Option<String>,
}

/// Input and output files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    /// Entity store JSON
    pub entities: PathBuf,
    /// Serialized vectors
    pub index: PathBuf,
    /// Identifier list, one per line, parallel to `index`
    pub ids: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingConfig {
    pub backend: EmbeddingBackend,
    pub model: String,
    pub dimension: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub backend: GenerationBackend,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Main configuration struct
#[derive(Debug, Clone)]
pub struct Config {
    pub data: DataPaths,
    pub top_k: usize,
    pub vocabulary: Vocabulary,
    pub embedding: EmbeddingConfig,
    pub generation: GenerationConfig,
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub ollama_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Config {
    /// Load configuration from config.yml (then ../config.yml) or use defaults
    /// Environment variables take precedence over config.yml values
    pub fn new() -> Result<Self> {
        Self::load_first_existing(&["config.yml", "../config.yml"])
    }

    /// Load from an explicit path when given (which must exist), otherwise
    /// search the usual locations.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Self::new(),
        }
    }

    /// Load the first candidate that exists. Defaults apply only when none
    /// exists; a file that exists but does not parse is an error.
    pub fn load_first_existing<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        for candidate in candidates {
            let path: &Path = candidate.as_ref();
            if path.is_file() {
                info!("Loading configuration from {}", path.display());
                return Self::load_from_file(path);
            }
        }

        debug!("No config.yml found, using defaults");
        Self::load_dotenv();
        Ok(Self::defaults())
    }

    /// Resolve a value: prefer env var if config value looks like ${VAR}
    fn resolve_env_string(value: Option<String>, env_key: &str) -> Option<String> {
        if let Some(ref v) = value {
            if let Some(var_name) = v.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
                if let Ok(env_val) = std::env::var(var_name) {
                    return Some(env_val);
                }
                // unresolved placeholder; fall through to env_key
                return std::env::var(env_key).ok().filter(|s| !s.is_empty());
            }
        }
        if let Ok(env_val) = std::env::var(env_key) {
            if !env_val.is_empty() {
                return Some(env_val);
            }
        }
        value.filter(|s| !s.is_empty())
    }

    fn resolve_path(value: Option<String>, env_key: &str, default: &str) -> PathBuf {
        PathBuf::from(
            Self::resolve_env_string(value, env_key).unwrap_or_else(|| default.to_string()),
        )
    }

    /// Load .env file into environment variables using dotenvy
    fn load_dotenv() {
        // Try to load from current directory first, then parent
        if dotenvy::dotenv().is_err() {
            let _ = dotenvy::from_filename("../.env");
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_dotenv();

        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_yaml_str(&content)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        // an empty document is valid and means "all defaults"
        let yaml: YamlConfig = if content.trim().is_empty() {
            YamlConfig::default()
        } else {
            serde_yaml::from_str(content)
                .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?
        };

        Ok(Self::from_yaml(yaml))
    }

    fn from_yaml(yaml: YamlConfig) -> Self {
        let data = yaml.data.unwrap_or_default();
        let retrieval = yaml.retrieval.unwrap_or_default();
        let vocabulary = yaml.vocabulary.unwrap_or_default();
        let embedding = yaml.embedding.unwrap_or_default();
        let generation = yaml.generation.unwrap_or_default();
        let openai = yaml.openai.unwrap_or_default();
        let ollama = yaml.ollama.unwrap_or_default();

        let embedding_backend = embedding.backend.unwrap_or_default();
        let generation_backend = generation.backend.unwrap_or_default();

        Self {
            data: DataPaths {
                entities: Self::resolve_path(
                    data.entities,
                    "GRAMBANK_ENTITIES",
                    DEFAULT_ENTITIES_PATH,
                ),
                index: Self::resolve_path(data.index, "GRAMBANK_INDEX", DEFAULT_INDEX_PATH),
                ids: Self::resolve_path(data.ids, "GRAMBANK_IDS", DEFAULT_IDS_PATH),
            },
            top_k: retrieval.top_k.unwrap_or(DEFAULT_TOP_K),
            vocabulary: Vocabulary {
                label_key: vocabulary
                    .label_key
                    .unwrap_or_else(|| keys::LABEL.to_string()),
                country_property: vocabulary
                    .country_property
                    .unwrap_or_else(|| DEFAULT_COUNTRY_PROPERTY.to_string()),
                countries: CountryRegistry::new(
                    vocabulary.countries.unwrap_or_else(default_countries),
                ),
                keywords: KeywordTable::new(vocabulary.keywords.unwrap_or_else(default_keywords)),
            },
            embedding: EmbeddingConfig {
                backend: embedding_backend,
                model: embedding.model.unwrap_or_else(|| {
                    match embedding_backend {
                        EmbeddingBackend::OpenAI => DEFAULT_OPENAI_EMBEDDING_MODEL,
                        EmbeddingBackend::Ollama => DEFAULT_OLLAMA_EMBEDDING_MODEL,
                        EmbeddingBackend::Local => "local",
                    }
                    .to_string()
                }),
                dimension: embedding.dimension,
            },
            generation: GenerationConfig {
                backend: generation_backend,
                model: generation.model.unwrap_or_else(|| {
                    match generation_backend {
                        GenerationBackend::OpenAI => DEFAULT_OPENAI_CHAT_MODEL,
                        GenerationBackend::Ollama => DEFAULT_OLLAMA_CHAT_MODEL,
                    }
                    .to_string()
                }),
                max_tokens: generation.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
                temperature: generation.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            },
            openai_api_key: Self::resolve_env_string(openai.api_key, "OPENAI_API_KEY"),
            openai_base_url: openai.base_url.filter(|s| !s.is_empty()),
            ollama_url: Self::resolve_env_string(ollama.url, "OLLAMA_URL")
                .unwrap_or_else(|| OLLAMA_URL.to_string()),
        }
    }

    /// Config with defaults and environment overrides only (fallback)
    fn defaults() -> Self {
        Self::from_yaml(YamlConfig::default())
    }

    fn require_openai_key(&self) -> Result<&str> {
        self.openai_api_key
            .as_deref()
            .ok_or_else(|| Error::Config("OPENAI_API_KEY not set".to_string()))
    }

    /// Embedding backend selected by `embedding.backend`.
    pub fn embedder(&self) -> Result<Box<dyn Embedder>> {
        let embedding = &self.embedding;
        let embedder: Box<dyn Embedder> = match embedding.backend {
            EmbeddingBackend::OpenAI => {
                let mut service = EmbeddingService::with_api_key(self.require_openai_key()?)?
                    .with_model(&embedding.model);
                if let Some(dim) = embedding.dimension {
                    service = service.with_dimensions(dim);
                }
                Box::new(service)
            }
            EmbeddingBackend::Ollama => {
                let mut client =
                    OllamaClient::with_url(&self.ollama_url)?.with_model(&embedding.model);
                if let Some(dim) = embedding.dimension {
                    client = client.with_dimension(dim);
                }
                Box::new(client)
            }
            EmbeddingBackend::Local => Box::new(LocalEmbedder::new(
                embedding.dimension.unwrap_or(DEFAULT_LOCAL_DIMENSION),
            )),
        };
        Ok(embedder)
    }

    /// Generator selected by `generation.backend`.
    pub fn generator(&self) -> Result<Box<dyn Generator>> {
        let generation = &self.generation;
        let generator: Box<dyn Generator> = match generation.backend {
            GenerationBackend::OpenAI => {
                let mut client = OpenAIClient::new(self.require_openai_key()?)?
                    .with_model(&generation.model)
                    .with_temperature(generation.temperature);
                if let Some(base_url) = &self.openai_base_url {
                    client = client.with_base_url(base_url);
                }
                Box::new(client)
            }
            GenerationBackend::Ollama => Box::new(
                OllamaClient::with_url(&self.ollama_url)?
                    .with_model(&generation.model)
                    .with_temperature(generation.temperature),
            ),
        };
        Ok(generator)
    }
}
