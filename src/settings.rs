use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use dotenv::dotenv;
use std::{env, fmt, str::FromStr, time::Duration};

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    Development,
    Production,
    Testing,
}

impl FromStr for AppEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" => Ok(AppEnvironment::Development),
            "production" => Ok(AppEnvironment::Production),
            "testing" => Ok(AppEnvironment::Testing),
            _ => Err(ConfigError::Message(format!("Invalid environment: {}", s))),
        }
    }
}

/// Where gallery documents and image bytes live.
///
/// `hosted` pairs the Postgres document store with the content API asset
/// store. `memory` keeps both in process and is meant for local runs.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Hosted,
    Memory,
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct AppConfig {
    #[serde(default = "default_env")]
    pub env: AppEnvironment,

    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    #[serde(default = "default_storage_backend")]
    pub storage_backend: StorageBackend,

    #[serde(default)]
    pub database_url: String,

    #[serde(default = "default_run_migrations")]
    pub run_migrations: bool,

    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: Vec<String>,

    #[serde(default)]
    pub admin_api_token: String,

    /// Overrides the API host derived from `asset_project_id`.
    #[serde(default)]
    pub asset_api_url: Option<String>,

    #[serde(default)]
    pub asset_project_id: String,

    #[serde(default = "default_asset_dataset")]
    pub asset_dataset: String,

    #[serde(default = "default_asset_api_version")]
    pub asset_api_version: String,

    #[serde(default)]
    pub asset_api_token: String,

    #[serde(default = "default_asset_cdn_url")]
    pub asset_cdn_url: String,

    /// URL prefix for assets held by the in-memory store. Those URLs are
    /// placeholders; the memory backend keeps no bytes and serves no assets.
    #[serde(default = "default_public_asset_url")]
    pub public_asset_url: String,

    #[serde(default = "default_upload_concurrency")]
    pub upload_concurrency: usize,

    /// Humantime duration, e.g. `30s` or `2m`. `0s` disables the cache.
    #[serde(default = "default_gallery_cache_ttl")]
    pub gallery_cache_ttl: String,

    #[serde(default = "default_max_upload_total_mb")]
    pub max_upload_total_mb: usize,
}

fn default_env() -> AppEnvironment {
    AppEnvironment::Development
}
fn default_name() -> String {
    "Gallery-API".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_worker_count() -> usize {
    num_cpus::get()
}
fn default_storage_backend() -> StorageBackend {
    StorageBackend::Hosted
}
fn default_run_migrations() -> bool {
    true
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}
fn default_asset_dataset() -> String {
    "production".to_string()
}
fn default_asset_api_version() -> String {
    "2023-10-10".to_string()
}
fn default_asset_cdn_url() -> String {
    "https://cdn.sanity.io".to_string()
}
fn default_public_asset_url() -> String {
    "http://127.0.0.1:8080/assets".to_string()
}
fn default_upload_concurrency() -> usize {
    4
}
fn default_gallery_cache_ttl() -> String {
    "30s".to_string()
}
fn default_max_upload_total_mb() -> usize {
    200
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv().ok();

        let raw_env = env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let env_name = AppEnvironment::from_str(&raw_env)
            .map_err(|_| ConfigError::Message(format!("Invalid APP_ENV value: {}", raw_env)))?;

        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env_name.to_string().to_lowercase())).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cors_allowed_origins"),
            );

        let mut config: Self = builder.build()?.try_deserialize()?;

        config.env = env_name;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.admin_api_token.len() < 32 {
            errors.push("ADMIN_API_TOKEN must be at least 32 characters");
        }
        if self.upload_concurrency == 0 {
            errors.push("UPLOAD_CONCURRENCY must be at least 1");
        }
        if humantime::parse_duration(&self.gallery_cache_ttl).is_err() {
            errors.push("GALLERY_CACHE_TTL must be a duration such as 30s or 2m");
        }

        match self.storage_backend {
            StorageBackend::Hosted => {
                if self.database_url.trim().is_empty() {
                    errors.push("DATABASE_URL cannot be empty");
                }
                if self.asset_project_id.trim().is_empty() && self.asset_api_url.is_none() {
                    errors.push("ASSET_PROJECT_ID or ASSET_API_URL must be set");
                }
                if self.asset_api_token.trim().is_empty() {
                    errors.push("ASSET_API_TOKEN cannot be empty");
                }
            }
            StorageBackend::Memory => {
                if self.is_production() {
                    errors.push("The memory storage backend is not allowed in production");
                }
            }
        }

        if self.is_production() && self.cors_origins().iter().any(|o| o == "*") {
            errors.push("Wildcard CORS (*) is not allowed in production");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Message(errors.join(", ")))
        }
    }

    pub fn is_production(&self) -> bool {
        self.env == AppEnvironment::Production
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .iter()
            .flat_map(|origin| origin.split(','))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn asset_api_base(&self) -> String {
        match &self.asset_api_url {
            Some(url) if !url.trim().is_empty() => url.trim().to_string(),
            _ => format!("https://{}.api.sanity.io", self.asset_project_id),
        }
    }

    /// Falls back to no caching if the value was never validated.
    pub fn cache_ttl(&self) -> Duration {
        humantime::parse_duration(&self.gallery_cache_ttl).unwrap_or(Duration::ZERO)
    }

    pub fn max_upload_total_bytes(&self) -> usize {
        self.max_upload_total_mb.saturating_mul(1024 * 1024)
    }
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Production => "production",
            AppEnvironment::Testing => "testing",
        };
        write!(f, "{s}")
    }
}

trait Redact {
    fn redact(&self) -> &str;
}

impl Redact for str {
    fn redact(&self) -> &str {
        if self.is_empty() {
            "[MISSING]"
        } else if self.len() < 32 {
            "[TOO_SHORT]"
        } else {
            "[REDACTED]"
        }
    }
}

impl Redact for String {
    fn redact(&self) -> &str {
        self.as_str().redact()
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("name", &self.name)
            .field("port", &self.port)
            .field("host", &self.host)
            .field("worker_count", &self.worker_count)
            .field("storage_backend", &self.storage_backend)
            .field("database_url", &self.database_url.redact())
            .field("run_migrations", &self.run_migrations)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("admin_api_token", &self.admin_api_token.redact())
            .field("asset_api_url", &self.asset_api_url)
            .field("asset_project_id", &self.asset_project_id)
            .field("asset_dataset", &self.asset_dataset)
            .field("asset_api_version", &self.asset_api_version)
            .field("asset_api_token", &if self.asset_api_token.is_empty() { "[MISSING]" } else { "[REDACTED]" })
            .field("asset_cdn_url", &self.asset_cdn_url)
            .field("public_asset_url", &self.public_asset_url)
            .field("upload_concurrency", &self.upload_concurrency)
            .field("gallery_cache_ttl", &self.gallery_cache_ttl)
            .field("max_upload_total_mb", &self.max_upload_total_mb)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_config() -> AppConfig {
        AppConfig {
            env: AppEnvironment::Testing,
            name: "Gallery-API".into(),
            port: 0,
            host: "127.0.0.1".into(),
            worker_count: 1,
            storage_backend: StorageBackend::Memory,
            database_url: String::new(),
            run_migrations: false,
            cors_allowed_origins: vec!["*".into()],
            admin_api_token: "a".repeat(32),
            asset_api_url: None,
            asset_project_id: String::new(),
            asset_dataset: default_asset_dataset(),
            asset_api_version: default_asset_api_version(),
            asset_api_token: String::new(),
            asset_cdn_url: default_asset_cdn_url(),
            public_asset_url: default_public_asset_url(),
            upload_concurrency: 4,
            gallery_cache_ttl: "30s".into(),
            max_upload_total_mb: 200,
        }
    }

    #[test]
    fn memory_backend_needs_only_admin_token() {
        assert!(memory_config().validate().is_ok());

        let config = AppConfig { admin_api_token: "short".into(), ..memory_config() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn hosted_backend_requires_store_credentials() {
        let config = AppConfig { storage_backend: StorageBackend::Hosted, ..memory_config() };
        let err = config.validate().unwrap_err().to_string();

        assert!(err.contains("DATABASE_URL"));
        assert!(err.contains("ASSET_API_TOKEN"));
    }

    #[test]
    fn cache_ttl_parses_humantime() {
        assert_eq!(memory_config().cache_ttl(), Duration::from_secs(30));

        let config = AppConfig { gallery_cache_ttl: "0s".into(), ..memory_config() };
        assert_eq!(config.cache_ttl(), Duration::ZERO);

        let config = AppConfig { gallery_cache_ttl: "soon".into(), ..memory_config() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn asset_api_base_prefers_explicit_url() {
        let config = AppConfig { asset_project_id: "kbp8twqb".into(), ..memory_config() };
        assert_eq!(config.asset_api_base(), "https://kbp8twqb.api.sanity.io");

        let config = AppConfig { asset_api_url: Some("http://localhost:3333".into()), ..config };
        assert_eq!(config.asset_api_base(), "http://localhost:3333");
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let rendered = format!("{:?}", memory_config());
        assert!(!rendered.contains(&"a".repeat(32)));
        assert!(rendered.contains("[REDACTED]"));
    }
}
