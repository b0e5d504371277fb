use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Path prefix every API route is mounted under, without slashes
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_expiry_hours: u64,
    /// Allow self-registration with roles other than PATIENT
    #[serde(default)]
    pub open_role_registration: bool,
}

fn default_api_prefix() -> String {
    "api".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3001,
                api_prefix: default_api_prefix(),
            },
            database: DatabaseConfig {
                path: "./data/clinic.db".to_string(),
            },
            auth: AuthConfig {
                jwt_secret: "change-me-in-production".to_string(),
                token_expiry_hours: 24,
                open_role_registration: false,
            },
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file()?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn load_file() -> Result<Self> {
        // Try to load from environment variable
        if let Ok(path) = std::env::var("CLINIC_CONFIG") {
            return Self::load_from_path(Path::new(&path));
        }

        // Try to load from default locations
        let default_paths = [
            PathBuf::from("clinic-server.toml"),
            PathBuf::from("config/clinic-server.toml"),
            PathBuf::from("/etc/clinic/server.toml"),
        ];

        for path in default_paths {
            if path.exists() {
                return Self::load_from_path(&path);
            }
        }

        // Return default config if no file found
        tracing::warn!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = Self::from_toml(&content)?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `CLINIC_*` overrides looked up through `var`
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(secret) = var("CLINIC_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Some(path) = var("CLINIC_DATABASE_PATH") {
            self.database.path = path;
        }
        if let Some(port) = var("CLINIC_PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("invalid CLINIC_PORT '{}'", port))?;
        }
        Ok(())
    }

    /// Route prefix in the form axum expects, e.g. `/api`
    pub fn route_prefix(&self) -> String {
        format!("/{}", self.server.api_prefix.trim_matches('/'))
    }
}
