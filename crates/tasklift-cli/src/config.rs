//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tasklift_domain::ModelCapability;
use tasklift_extractor::ExtractorConfig;
use tasklift_llm::openai::DEFAULT_AZURE_API_VERSION;
use tasklift_llm::{OllamaModel, OpenAiModel};

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Model backend selection
    #[serde(default)]
    pub model: ModelSettings,

    /// Extraction pipeline settings
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Global settings
    #[serde(default)]
    pub settings: Settings,
}

/// Model backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Backend kind
    #[serde(default)]
    pub provider: Provider,

    /// Server URL; each provider has its own default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Model name (deployment name for Azure when `deployment` is unset)
    #[serde(default = "default_model")]
    pub model: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Azure deployment name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment: Option<String>,

    /// Azure API version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
}

/// Model provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Local Ollama server
    #[default]
    Ollama,
    /// OpenAI or a compatible server
    OpenAi,
    /// Azure OpenAI deployment
    Azure,
    /// Pick a backend from the settings and environment at build time
    Auto,
}

/// Global CLI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,

    /// Default IANA timezone for relative dates
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

impl Config {
    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".tasklift").join("config.toml"))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => {
                let path = Self::path()?;
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load configuration from a file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Check the extractor settings and provider requirements.
    pub fn validate(&self) -> Result<()> {
        self.extractor.validate().map_err(CliError::Config)?;
        if self.model.model.trim().is_empty() {
            return Err(CliError::Config("model name must not be empty".into()));
        }
        if self.model.provider == Provider::Azure && self.model.endpoint.is_none() {
            return Err(CliError::Config("azure provider requires an endpoint".into()));
        }
        Ok(())
    }
}

impl ModelSettings {
    /// Build the configured backend.
    pub fn build(&self) -> Result<Arc<dyn ModelCapability>> {
        let provider = self.resolved_provider();
        let model: Arc<dyn ModelCapability> = match provider {
            Provider::Ollama | Provider::Auto => match &self.endpoint {
                Some(endpoint) => Arc::new(OllamaModel::new(endpoint, &self.model)),
                None => Arc::new(OllamaModel::default_endpoint(&self.model)),
            },
            Provider::OpenAi => {
                let backend = OpenAiModel::openai(self.api_key()?, &self.model);
                match &self.endpoint {
                    Some(endpoint) => Arc::new(backend.with_base_url(endpoint)),
                    None => Arc::new(backend),
                }
            }
            Provider::Azure => {
                let endpoint = self
                    .endpoint
                    .as_deref()
                    .ok_or_else(|| CliError::Config("azure provider requires an endpoint".into()))?;
                Arc::new(OpenAiModel::azure(
                    endpoint,
                    self.api_key()?,
                    self.deployment.as_deref().unwrap_or(&self.model),
                    self.api_version.as_deref().unwrap_or(DEFAULT_AZURE_API_VERSION),
                ))
            }
        };
        tracing::debug!(?provider, model = model.name(), "Built model backend");
        Ok(model)
    }

    /// The backend `build` will create
    ///
    /// `Auto` picks Azure when an endpoint, a deployment and the API key
    /// are all present, OpenAI when the API key is set, and Ollama
    /// otherwise.
    pub fn resolved_provider(&self) -> Provider {
        if self.provider != Provider::Auto {
            return self.provider;
        }
        let has_key = std::env::var_os(&self.api_key_env).is_some_and(|key| !key.is_empty());
        let azure_ready = self.endpoint.is_some() && self.deployment.is_some();
        match (has_key, azure_ready) {
            (true, true) => Provider::Azure,
            (true, false) => Provider::OpenAi,
            (false, _) => Provider::Ollama,
        }
    }

    fn api_key(&self) -> Result<String> {
        std::env::var(&self.api_key_env).map_err(|_| {
            CliError::Config(format!(
                "API key environment variable '{}' is not set",
                self.api_key_env
            ))
        })
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            provider: Provider::Ollama,
            endpoint: None,
            model: default_model(),
            api_key_env: default_api_key_env(),
            deployment: None,
            api_version: None,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
            timezone: default_timezone(),
        }
    }
}

fn default_model() -> String {
    "llama3.1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

fn default_timezone() -> String {
    "UTC".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tasklift_extractor::DedupPolicy;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model.provider, Provider::Ollama);
        assert_eq!(config.model.model, "llama3.1");
        assert!(config.settings.color);
        assert_eq!(config.settings.timezone, "UTC");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file() {
        let config: Config = toml::from_str(
            r#"
            [model]
            provider = "openai"
            model = "gpt-4o-mini"

            [extractor]
            max_chunk_size = 2000
            dedup_policy = "field_merge"
            "#,
        )
        .unwrap();
        assert_eq!(config.model.provider, Provider::OpenAi);
        assert_eq!(config.model.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.extractor.max_chunk_size, 2000);
        assert_eq!(config.extractor.chunk_overlap, 200);
        assert_eq!(config.extractor.dedup_policy, DedupPolicy::FieldMerge);
        assert_eq!(config.settings.format, OutputFormat::Table);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.settings.timezone = "Asia/Tokyo".to_string();
        config.extractor.extract_meeting_minutes = false;
        config.save_to(&path).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.settings.timezone, "Asia/Tokyo");
        assert!(!loaded.extractor.extract_meeting_minutes);
        assert_eq!(loaded.extractor.retry, config.extractor.retry);
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(Some(&dir.path().join("missing.toml")));
        assert!(matches!(result, Err(CliError::Io(_))));
    }

    #[test]
    fn test_invalid_extractor_settings_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[extractor]\nmax_chunk_size = 100\nchunk_overlap = 90\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(CliError::Config(_))));
    }

    #[test]
    fn test_azure_requires_endpoint() {
        let mut config = Config::default();
        config.model.provider = Provider::Azure;
        assert!(config.validate().is_err());
        assert!(config.model.build().is_err());
    }

    #[test]
    fn test_missing_api_key() {
        let settings = ModelSettings {
            provider: Provider::OpenAi,
            api_key_env: "TASKLIFT_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..ModelSettings::default()
        };
        let err = settings.build().err().unwrap();
        assert!(err.to_string().contains("TASKLIFT_TEST_KEY_THAT_IS_NEVER_SET"));
    }

    #[test]
    fn test_auto_without_key_uses_ollama() {
        let settings = ModelSettings {
            provider: Provider::Auto,
            endpoint: Some("https://acme.openai.azure.com".to_string()),
            deployment: Some("gpt4-prod".to_string()),
            api_key_env: "TASKLIFT_TEST_AUTO_KEY_NEVER_SET".to_string(),
            ..ModelSettings::default()
        };
        assert_eq!(settings.resolved_provider(), Provider::Ollama);
        assert_eq!(settings.build().unwrap().name(), "llama3.1");

        let config = Config {
            model: settings,
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_auto_prefers_azure_then_openai() {
        std::env::set_var("TASKLIFT_TEST_AUTO_KEY", "sk-test");
        let mut settings = ModelSettings {
            provider: Provider::Auto,
            api_key_env: "TASKLIFT_TEST_AUTO_KEY".to_string(),
            ..ModelSettings::default()
        };
        assert_eq!(settings.resolved_provider(), Provider::OpenAi);

        settings.endpoint = Some("https://acme.openai.azure.com".to_string());
        assert_eq!(settings.resolved_provider(), Provider::OpenAi);

        settings.deployment = Some("gpt4-prod".to_string());
        assert_eq!(settings.resolved_provider(), Provider::Azure);
        assert_eq!(settings.build().unwrap().name(), "gpt4-prod");
    }

    #[test]
    fn test_auto_from_file() {
        let config: Config = toml::from_str("[model]\nprovider = \"auto\"\n").unwrap();
        assert_eq!(config.model.provider, Provider::Auto);
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let model = ModelSettings::default().build().unwrap();
        assert!(!model.name().is_empty());
    }
}
