use config::{Config, ConfigError, Environment, File};
use estoque_agents::policy::{PolicySource, DEFAULT_HANDLE, DEFAULT_HUB_URL};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "estoque.toml";
pub const ENV_PREFIX: &str = "ESTOQUE";
/// Credential variable read by earlier deployments' `.env` files
pub const LEGACY_API_KEY_ENV: &str = "teste_api";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub openai: OpenAIConfig,
    pub agent: AgentConfig,
    pub policy: PolicyConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_mb: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
            max_upload_mb: 200,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OpenAIConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    /// Environment variable read when `api_key` is not set
    pub api_key_env: String,
    pub base_url: String,
    pub max_retries: u32,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: "https://api.openai.com".to_string(),
            max_retries: 2,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AgentConfig {
    pub max_iterations: usize,
    pub max_execution_secs: u64,
    pub top_k: usize,
    pub handle_parsing_errors: bool,
    pub verbose: bool,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 15,
            max_execution_secs: 180,
            top_k: 5,
            handle_parsing_errors: true,
            verbose: true,
            temperature: 0.7,
            max_tokens: 2048,
        }
    }
}

impl AgentConfig {
    /// `None` when `max_execution_secs` is 0
    pub fn max_execution_time(&self) -> Option<Duration> {
        match self.max_execution_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PolicyConfig {
    /// `hub`, `file` or `builtin`
    pub source: String,
    pub hub_url: String,
    pub handle: String,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            source: "hub".to_string(),
            hub_url: DEFAULT_HUB_URL.to_string(),
            handle: DEFAULT_HANDLE.to_string(),
            path: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    /// Directory scanned for `.db` files
    pub working_dir: PathBuf,
    /// Staging directory for uploads, relative to `working_dir` unless absolute
    pub uploads_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            working_dir: PathBuf::from("."),
            uploads_dir: PathBuf::from("temp_uploads"),
        }
    }
}

impl StorageConfig {
    pub fn uploads_path(&self) -> PathBuf {
        self.working_dir.join(&self.uploads_dir)
    }
}

impl AppConfig {
    /// Layer defaults, the TOML file and `ESTOQUE__*` environment variables.
    ///
    /// An explicit `config_path` must exist; the default `estoque.toml` is
    /// optional.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match config_path {
            Some(path) => File::from(path.to_path_buf()).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let builder = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: AppConfig = builder.try_deserialize()?;
        config.resolve_api_key();
        Ok(config)
    }

    /// Fill `openai.api_key` from the environment when the config leaves it
    /// unset, trying `openai.api_key_env` first and then `teste_api`
    pub fn resolve_api_key(&mut self) {
        let configured = self
            .openai
            .api_key
            .as_ref()
            .filter(|key| !key.trim().is_empty());
        if configured.is_none() {
            self.openai.api_key = [self.openai.api_key_env.as_str(), LEGACY_API_KEY_ENV]
                .iter()
                .filter_map(|name| std::env::var(name).ok())
                .find(|key| !key.trim().is_empty());
        }
    }

    /// The credential, empty when none was found
    pub fn api_key(&self) -> String {
        self.openai.api_key.clone().unwrap_or_default()
    }

    pub fn policy_source(&self) -> Result<PolicySource, ConfigError> {
        match self.policy.source.as_str() {
            "hub" => Ok(PolicySource::Hub {
                hub_url: self.policy.hub_url.clone(),
                handle: self.policy.handle.clone(),
            }),
            "file" => self
                .policy
                .path
                .clone()
                .map(PolicySource::File)
                .ok_or_else(|| {
                    ConfigError::Message("policy.path is required when policy.source = \"file\"".to_string())
                }),
            "builtin" => Ok(PolicySource::Builtin),
            other => Err(ConfigError::Message(format!(
                "Unknown policy.source '{}', expected hub, file or builtin",
                other
            ))),
        }
    }
}
