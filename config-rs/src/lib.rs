//! config-rs/lib.rs
//! Shared configuration utilities for the troubleshooting backend
//! Provides bind address resolution and typed settings read from the environment

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

/// Default HTTP port of the troubleshooting gateway
pub const DEFAULT_GATEWAY_PORT: u16 = 8282;

/// Default Anthropic Messages API endpoint
pub const DEFAULT_MODEL_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// Default model used to generate scenarios
pub const DEFAULT_MODEL: &str = "claude-3-haiku-20240307";

/// Default completion budget for one scenario
pub const DEFAULT_MAX_TOKENS: u32 = 4000;

/// Default timeout for one model call
pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 60;

/// Load variables from a `.env` file if one exists. Missing files are not an error.
pub fn load_env() {
    match dotenv::dotenv() {
        Ok(path) => log::debug!("Loaded environment from {}", path.display()),
        Err(err) if err.not_found() => {}
        Err(err) => log::warn!("Failed to load .env file: {}", err),
    }
}

/// Read an environment variable and parse it, falling back to `default`
/// when it is unset or does not parse
pub fn get_env_var<T: FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or_else(|_| {
            log::warn!("Invalid value in {}, using default", name);
            default
        }),
        Err(_) => default,
    }
}

/// Read an environment variable, treating empty values as unset
pub fn get_optional_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Environment prefix for a service name: "troubleshoot-gateway" -> "TROUBLESHOOT_GATEWAY"
fn env_prefix(service_name: &str) -> String {
    service_name.to_uppercase().replace('-', "_")
}

/// Get service port from environment variables with proper fallback
///
/// # Arguments
/// * `service_name` - The name of the service (e.g., "troubleshoot-gateway")
/// * `default_port` - The default port to use if not specified in environment
pub fn get_service_port(service_name: &str, default_port: u16) -> u16 {
    let var_name = format!("{}_SERVICE_PORT", env_prefix(service_name));
    get_env_var(&var_name, default_port)
}

/// Create a SocketAddr for binding a service
///
/// `<SERVICE>_SERVICE_ADDR` overrides everything and may be given either as
/// `host:port` or as `http://host:port`.
pub fn get_bind_address(service_name: &str, default_port: u16) -> SocketAddr {
    let var_name = format!("{}_SERVICE_ADDR", env_prefix(service_name));

    if let Some(addr_str) = get_optional_env(&var_name) {
        let without_scheme = addr_str
            .strip_prefix("http://")
            .or_else(|| addr_str.strip_prefix("https://"))
            .unwrap_or(&addr_str);
        if let Ok(addr) = without_scheme.parse::<SocketAddr>() {
            return addr;
        }
        log::warn!("Invalid address format in {}, using default", var_name);
    }

    let port = get_service_port(service_name, default_port);
    SocketAddr::from(([0, 0, 0, 0], port))
}

/// Service-scoped view over the helpers above
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    service_name: String,
}

impl ServiceConfig {
    pub fn new(service_name: &str) -> Self {
        Self {
            service_name: service_name.to_string(),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn get_service_port(&self, default_port: u16) -> u16 {
        get_service_port(&self.service_name, default_port)
    }

    pub fn get_bind_address(&self, default_port: u16) -> SocketAddr {
        get_bind_address(&self.service_name, default_port)
    }
}

/// Settings for the hosted model API
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_MODEL_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout_secs: DEFAULT_MODEL_TIMEOUT_SECS,
        }
    }
}

impl ModelSettings {
    /// Reads:
    /// - ANTHROPIC_API_KEY: API key for the model provider
    /// - ANTHROPIC_API_URL: Messages endpoint
    /// - ANTHROPIC_MODEL: Model identifier
    /// - ANTHROPIC_MAX_TOKENS: Completion budget (default: 4000)
    /// - LLM_TIMEOUT_SECS: Per-request timeout (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: get_optional_env("ANTHROPIC_API_KEY"),
            api_url: get_optional_env("ANTHROPIC_API_URL").unwrap_or(defaults.api_url),
            model: get_optional_env("ANTHROPIC_MODEL").unwrap_or(defaults.model),
            max_tokens: get_env_var("ANTHROPIC_MAX_TOKENS", defaults.max_tokens),
            timeout_secs: get_env_var("LLM_TIMEOUT_SECS", defaults.timeout_secs),
        }
    }
}

/// Settings for the relational store
#[derive(Debug, Clone, PartialEq)]
pub struct StorageSettings {
    /// "memory" or "postgres"
    pub backend: String,
    pub database_url: Option<String>,
}

impl StorageSettings {
    /// Reads STORAGE_BACKEND and DATABASE_URL. With a DATABASE_URL and no
    /// explicit backend, postgres is assumed.
    pub fn from_env() -> Self {
        let database_url = get_optional_env("DATABASE_URL");
        let backend = get_optional_env("STORAGE_BACKEND").unwrap_or_else(|| {
            if database_url.is_some() {
                "postgres".to_string()
            } else {
                "memory".to_string()
            }
        });
        Self {
            backend: backend.to_lowercase(),
            database_url,
        }
    }
}

/// Complete configuration of the troubleshooting backend
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub service: ServiceConfig,
    pub model: ModelSettings,
    pub storage: StorageSettings,
    /// Whether scenarios must carry follow-up recommendations (SCENARIO_REQUIRE_RECOMMENDATIONS)
    pub require_recommendations: bool,
}

impl AppConfig {
    pub fn from_env(service_name: &str) -> Self {
        Self {
            service: ServiceConfig::new(service_name),
            model: ModelSettings::from_env(),
            storage: StorageSettings::from_env(),
            require_recommendations: get_env_var("SCENARIO_REQUIRE_RECOMMENDATIONS", true),
        }
    }
}
