use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::middleware::{Credentials, PanicResponse};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub shutdown_grace_secs: u64,
    pub panic_response: PanicResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub basic_auth_user_id: Option<String>,
    pub basic_auth_password: Option<String>,
}

impl SecurityConfig {
    /// The configured credential pair, if both halves are present.
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.basic_auth_user_id, &self.basic_auth_password) {
            (Some(user_id), Some(password)) => Some(Credentials::new(user_id, password)),
            _ => None,
        }
    }
}

impl ServerConfig {
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("PORT") {
            // Accept Go-style ":8080" as well as a bare port
            self.server.port = v.trim_start_matches(':').parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("SHUTDOWN_GRACE_SECS") {
            self.server.shutdown_grace_secs = v.parse().unwrap_or(self.server.shutdown_grace_secs);
        }
        if let Ok(v) = env::var("PANIC_RESPONSE") {
            self.server.panic_response = v.parse().unwrap_or(self.server.panic_response);
        }

        // Database overrides
        if let Ok(v) = env::var("DB_PATH") {
            if !v.is_empty() {
                self.database.path = PathBuf::from(v);
            }
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }

        // Security overrides
        if let Ok(v) = env::var("BASIC_AUTH_USER_ID") {
            self.security.basic_auth_user_id = Some(v);
        }
        if let Ok(v) = env::var("BASIC_AUTH_PASSWORD") {
            self.security.basic_auth_password = Some(v);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 8080,
                shutdown_grace_secs: 10,
                panic_response: PanicResponse::Legacy,
            },
            database: DatabaseConfig {
                path: PathBuf::from(".sqlite3/todo.db"),
                max_connections: 5,
            },
            security: SecurityConfig {
                basic_auth_user_id: None,
                basic_auth_password: None,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 8080,
                shutdown_grace_secs: 10,
                panic_response: PanicResponse::Legacy,
            },
            database: DatabaseConfig {
                path: PathBuf::from(".sqlite3/todo.db"),
                max_connections: 20,
            },
            security: SecurityConfig {
                basic_auth_user_id: None,
                basic_auth_password: None,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
