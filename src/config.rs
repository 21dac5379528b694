use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub credentials: CredentialsConfig,
    pub platform: PlatformConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    pub server: ServerConfig,
}

/// Credential bundle for the session login. Read once at startup; the
/// platform owns authentication beyond this point.
#[derive(Debug, Deserialize, Clone)]
pub struct CredentialsConfig {
    pub account: String,
    pub user: String,
    pub password: String,
    pub role: String,
    pub warehouse: String,
    pub database: String,
    pub schema: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PlatformConfig {
    /// Base URL of the platform's REST gateway.
    pub base_url: String,
    /// Name of the hosted search service to query.
    pub search_service: String,
    /// Name of the document stage holding the source files.
    pub stage: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Lifetime of generated signed document URLs, in seconds.
    #[serde(default = "default_url_ttl_secs")]
    pub url_ttl_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}
fn default_url_ttl_secs() -> u64 {
    360
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Number of context chunks requested per question.
    #[serde(default = "default_num_chunks")]
    pub num_chunks: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            num_chunks: default_num_chunks(),
        }
    }
}

fn default_num_chunks() -> usize {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate credentials
    let required = [
        ("account", &config.credentials.account),
        ("user", &config.credentials.user),
        ("password", &config.credentials.password),
        ("role", &config.credentials.role),
        ("warehouse", &config.credentials.warehouse),
        ("database", &config.credentials.database),
        ("schema", &config.credentials.schema),
    ];
    for (name, value) in required {
        if value.trim().is_empty() {
            anyhow::bail!("credentials.{} must not be empty", name);
        }
    }

    // Validate platform
    if config.platform.base_url.trim().is_empty() {
        anyhow::bail!("platform.base_url must not be empty");
    }
    if config.platform.search_service.trim().is_empty() {
        anyhow::bail!("platform.search_service must not be empty");
    }
    if config.platform.stage.trim().is_empty() {
        anyhow::bail!("platform.stage must not be empty");
    }
    if config.platform.timeout_secs == 0 {
        anyhow::bail!("platform.timeout_secs must be > 0");
    }
    if config.platform.url_ttl_secs == 0 {
        anyhow::bail!("platform.url_ttl_secs must be > 0");
    }

    // Validate retrieval
    if config.retrieval.num_chunks == 0 {
        anyhow::bail!("retrieval.num_chunks must be >= 1");
    }

    Ok(config)
}
