use std::env;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Gateway configuration, fixed at startup and shared read-only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    fn from_name(name: &str) -> Self {
        match name {
            "production" | "prod" => Environment::Production,
            "staging" | "stage" => Environment::Staging,
            _ => Environment::Development,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8086,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Require credentials once the cluster has at least one user
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Sent back in the version response header
    pub version: String,
    pub max_request_size_bytes: usize,
    pub enable_request_logging: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            enable_request_logging: true,
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::development()
    }
}

impl GatewayConfig {
    /// Preset selected by `GATEWAY_ENV`, then per-field environment overrides
    pub fn from_env() -> Self {
        let environment = env::var("GATEWAY_ENV")
            .map(|name| Environment::from_name(&name))
            .unwrap_or(Environment::Development);

        Self::for_environment(environment).with_env_overrides()
    }

    /// Read a YAML file; sections and fields left out take development defaults
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml(&raw).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_yaml(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
    }

    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from `lookup`; values that do not parse keep the current setting
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("GATEWAY_HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("GATEWAY_PORT").or_else(|| lookup("PORT")) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Some(v) = lookup("GATEWAY_AUTH_ENABLED") {
            self.auth.enabled = v.parse().unwrap_or(self.auth.enabled);
        }
        if let Some(v) = lookup("GATEWAY_VERSION") {
            self.api.version = v;
        }
        if let Some(v) = lookup("GATEWAY_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }
        if let Some(v) = lookup("GATEWAY_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig::default(),
            auth: AuthConfig { enabled: false },
            api: ApiConfig::default(),
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig::default(),
            auth: AuthConfig { enabled: true },
            api: ApiConfig {
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
                ..ApiConfig::default()
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig::default(),
            auth: AuthConfig { enabled: true },
            api: ApiConfig {
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
                enable_request_logging: false,
                ..ApiConfig::default()
            },
        }
    }
}
