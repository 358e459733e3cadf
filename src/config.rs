use std::env;
use std::fmt;
use std::str::FromStr;

use crate::constants;
use crate::error::{Result, TaskerError};

/// Deployment profile, selected by `NODE_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Development,
    Test,
    Production,
}

impl Profile {
    fn default_database_path(&self) -> &'static str {
        match self {
            Profile::Development => "data/tasker-dev.db",
            Profile::Test => "data/tasker-test.db",
            Profile::Production => "data/tasker.db",
        }
    }
}

impl FromStr for Profile {
    type Err = TaskerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "development" | "dev" => Ok(Profile::Development),
            "test" => Ok(Profile::Test),
            "production" | "prod" => Ok(Profile::Production),
            other => Err(TaskerError::Config(format!("Unknown NODE_ENV '{other}'"))),
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Profile::Development => "development",
            Profile::Test => "test",
            Profile::Production => "production",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseConfig {
    Local { path: String },
    Remote { url: String, auth_token: String },
}

#[derive(Clone)]
pub struct TokenSecrets {
    pub access: String,
    pub refresh: String,
    pub recover: String,
}

impl fmt::Debug for TokenSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSecrets").finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct MailConfig {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

impl fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("from", &self.from)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub profile: Profile,
    pub database: DatabaseConfig,
    pub secrets: TokenSecrets,
    /// `None` means outgoing mail is only logged.
    pub mail: Option<MailConfig>,
    pub bcrypt_cost: u32,
    pub notify_interval_secs: u64,
}

impl AppConfig {
    /// Reads configuration from the process environment (after `.env` is loaded).
    pub fn from_env() -> Result<Self> {
        let profile: Profile = optional_var("NODE_ENV").unwrap_or_default().parse()?;

        let database = match optional_var("LIBSQL_URL") {
            Some(url) => DatabaseConfig::Remote {
                url,
                auth_token: required_var("LIBSQL_AUTH_TOKEN")?,
            },
            None => DatabaseConfig::Local {
                path: optional_var("DATABASE_URL")
                    .unwrap_or_else(|| profile.default_database_path().to_string()),
            },
        };

        let secrets = TokenSecrets {
            access: required_var("ACCESS_TOKEN_SECRET_KEY")?,
            refresh: required_var("REFRESH_TOKEN_SECRET_KEY")?,
            recover: required_var("RECOVER_TOKEN_SECRET_KEY")?,
        };

        let mail = match optional_var("MAIL_HOST") {
            Some(host) => Some(MailConfig {
                host,
                port: parsed_var("MAIL_PORT", constants::DEFAULT_MAIL_PORT)?,
                user: optional_var("MAIL_USER"),
                password: optional_var("MAIL_PASSWORD"),
                from: required_var("MAIL_FROM")?,
            }),
            None => None,
        };

        Ok(Self {
            port: parsed_var("PORT", constants::DEFAULT_PORT)?,
            profile,
            database,
            secrets,
            mail,
            bcrypt_cost: parsed_var("BCRYPT_COST", constants::DEFAULT_BCRYPT_COST)?,
            notify_interval_secs: parsed_var(
                "NOTIFY_INTERVAL_SECS",
                constants::DEFAULT_NOTIFY_INTERVAL_SECS,
            )?,
        })
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn required_var(name: &str) -> Result<String> {
    optional_var(name)
        .ok_or_else(|| TaskerError::Config(format!("{name} environment variable not set")))
}

fn parsed_var<T: FromStr>(name: &str, default: T) -> Result<T> {
    match optional_var(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| TaskerError::Config(format!("Invalid value '{raw}' for {name}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_parsing() {
        assert_eq!("".parse::<Profile>().unwrap(), Profile::Development);
        assert_eq!("Test".parse::<Profile>().unwrap(), Profile::Test);
        assert_eq!("production".parse::<Profile>().unwrap(), Profile::Production);
        assert!("staging".parse::<Profile>().is_err());
    }

    #[test]
    fn test_profile_database_paths_differ() {
        assert_ne!(
            Profile::Test.default_database_path(),
            Profile::Development.default_database_path()
        );
    }

    #[test]
    fn test_secrets_are_not_printed() {
        let secrets = TokenSecrets {
            access: "a-secret".into(),
            refresh: "r-secret".into(),
            recover: "c-secret".into(),
        };
        let printed = format!("{secrets:?}");
        assert!(!printed.contains("a-secret"));
    }
}
