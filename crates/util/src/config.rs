use std::{env, fmt, str::FromStr};

use thiserror::Error;

use super::database_url;

/// Deployment the seeder runs against; selects the log format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    /// Production logs are emitted as JSON lines, everything else as compact text.
    pub fn wants_json_logs(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            _ => Err(ConfigError::InvalidEnvironment(value.to_string())),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        })
    }
}

/// Settings the seeder reads from the process environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub environment: Environment,
}

impl AppConfig {
    /// Reads `APP_ENV` and `DATABASE_URL`, applying defaults for unset values.
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match env::var("APP_ENV") {
            Ok(value) => value.parse()?,
            Err(_) => Environment::Development,
        };

        let database_url = database_url();
        if !database_url.starts_with("sqlite:") {
            return Err(ConfigError::InvalidDatabaseUrl(database_url));
        }

        Ok(Self {
            database_url,
            environment,
        })
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("APP_ENV must be development, production or test (got {0:?})")]
    InvalidEnvironment(String),
    #[error("DATABASE_URL must be a sqlite: connection string (got {0:?})")]
    InvalidDatabaseUrl(String),
}
