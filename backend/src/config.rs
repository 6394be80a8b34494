//! Application settings loaded via OrthoConfig.
//!
//! Values come from CLI flags, `CHATROOM_*` environment variables or a
//! configuration file. Raw settings are validated into the explicit values
//! the server needs (bind address, CORS policy, username resolver, pool
//! configuration); nothing is read from the environment after startup.

use std::ffi::OsString;
use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs};
use std::num::NonZeroU32;
use std::str::FromStr;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::{CorsOriginPolicy, DEFAULT_MAX_ATTEMPTS, OriginParseError, UsernameResolver};
use crate::outbound::persistence::PoolConfig;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;

/// Errors raised while turning settings into runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Settings could not be read from their sources.
    #[error("failed to load settings: {0}")]
    Load(String),
    /// A required value was not supplied.
    #[error("missing required setting `{key}`")]
    Missing { key: &'static str },
    /// A value was supplied but is unusable.
    #[error("invalid setting `{key}`={value}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
    /// A configured origin or URL failed to parse.
    #[error("invalid CORS configuration: {0}")]
    Origin(#[from] OriginParseError),
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    /// Local development; verbose logging.
    #[default]
    Development,
    /// Production deployment; JSON logs.
    Production,
    /// Automated test runs.
    Test,
}

impl Environment {
    /// Whether this is a production deployment.
    pub fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            _ => Err(ConfigError::Invalid {
                key: "environment",
                value: value.to_owned(),
                reason: "expected development, production or test".to_owned(),
            }),
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

/// Raw configuration values for the chatroom backend.
///
/// Loading with no flags, variables or file yields [`AppSettings::default`].
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CHATROOM")]
pub struct AppSettings {
    /// Interface to bind; defaults to all interfaces.
    pub host: Option<String>,
    /// Port to bind.
    #[ortho_config(default = 8000)]
    pub port: u16,
    /// PostgreSQL connection URL.
    pub database_url: Option<String>,
    /// Front-end origin always allowed by CORS.
    pub cors_origin: Option<String>,
    /// Public base URL of this API.
    pub api_base_url: Option<String>,
    /// `development`, `production` or `test`.
    pub environment: Option<String>,
    /// Bound on username candidates probed per registration.
    pub username_max_attempts: Option<u32>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            host: None,
            port: DEFAULT_PORT,
            database_url: None,
            cors_origin: None,
            api_base_url: None,
            environment: None,
            username_max_attempts: None,
        }
    }
}

fn required<'a>(value: Option<&'a str>, key: &'static str) -> Result<&'a str, ConfigError> {
    value
        .filter(|value| !value.trim().is_empty())
        .ok_or(ConfigError::Missing { key })
}

impl AppSettings {
    /// Load settings from the given CLI arguments, the environment and any
    /// configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] when a source cannot be parsed.
    pub fn load_from_args<I>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = OsString>,
    {
        Self::load_from_iter(args).map_err(|err| ConfigError::Load(err.to_string()))
    }

    /// Deployment environment.
    pub fn environment(&self) -> Result<Environment, ConfigError> {
        self.environment
            .as_deref()
            .map_or(Ok(Environment::default()), Environment::from_str)
    }

    /// Socket address to bind.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let host = self.host.as_deref().unwrap_or(DEFAULT_HOST);
        let port = self.port;
        let invalid = |reason: String| ConfigError::Invalid {
            key: "host",
            value: host.to_owned(),
            reason,
        };
        (host, port)
            .to_socket_addrs()
            .map_err(|err| invalid(err.to_string()))?
            .next()
            .ok_or_else(|| invalid("host resolved to no addresses".to_owned()))
    }

    /// PostgreSQL connection URL.
    pub fn database_url(&self) -> Result<&str, ConfigError> {
        required(self.database_url.as_deref(), "database_url")
    }

    /// Connection pool configuration for [`Self::database_url`].
    pub fn pool_config(&self) -> Result<PoolConfig, ConfigError> {
        Ok(PoolConfig::new(self.database_url()?))
    }

    /// Validated CORS origin policy.
    pub fn cors_policy(&self) -> Result<CorsOriginPolicy, ConfigError> {
        let fallback = required(self.cors_origin.as_deref(), "cors_origin")?;
        let api_base_url = required(self.api_base_url.as_deref(), "api_base_url")?;
        Ok(CorsOriginPolicy::new(fallback, api_base_url)?)
    }

    /// Username resolver honouring the configured attempt bound.
    pub fn username_resolver(&self) -> Result<UsernameResolver, ConfigError> {
        let Some(raw) = self.username_max_attempts else {
            return Ok(UsernameResolver::new(DEFAULT_MAX_ATTEMPTS));
        };
        NonZeroU32::new(raw)
            .map(UsernameResolver::new)
            .ok_or_else(|| ConfigError::Invalid {
                key: "username_max_attempts",
                value: raw.to_string(),
                reason: "must be at least 1".to_owned(),
            })
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for settings parsing and validation.

    use super::*;

    use env_lock::lock_env;
    use rstest::rstest;

    const KEYS: [&str; 7] = [
        "CHATROOM_HOST",
        "CHATROOM_PORT",
        "CHATROOM_DATABASE_URL",
        "CHATROOM_CORS_ORIGIN",
        "CHATROOM_API_BASE_URL",
        "CHATROOM_ENVIRONMENT",
        "CHATROOM_USERNAME_MAX_ATTEMPTS",
    ];

    fn load_with(overrides: &[(&str, &str)]) -> AppSettings {
        let vars = KEYS.map(|key| {
            let value = overrides
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value).to_owned());
            (key, value)
        });
        let _guard = lock_env(vars);
        AppSettings::load_from_args([OsString::from("chatroom-backend")])
            .expect("settings should load")
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let settings = load_with(&[]);

        assert_eq!(settings.port, DEFAULT_PORT);
        assert!(settings.host.is_none() && settings.database_url.is_none());
        assert_eq!(settings.environment(), Ok(Environment::Development));
        assert_eq!(
            settings.bind_addr(),
            Ok(SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)))
        );
        assert_eq!(
            settings.username_resolver().map(|r| r.max_attempts()),
            Ok(DEFAULT_MAX_ATTEMPTS.get())
        );
        assert_eq!(
            settings.database_url(),
            Err(ConfigError::Missing {
                key: "database_url"
            })
        );
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let settings = load_with(&[
            ("CHATROOM_HOST", "127.0.0.1"),
            ("CHATROOM_PORT", "9000"),
            ("CHATROOM_DATABASE_URL", "postgres://chat@localhost/chat"),
            ("CHATROOM_CORS_ORIGIN", "https://web.example.com"),
            ("CHATROOM_API_BASE_URL", "https://auth.example.com/api"),
            ("CHATROOM_ENVIRONMENT", "production"),
            ("CHATROOM_USERNAME_MAX_ATTEMPTS", "25"),
        ]);

        assert_eq!(settings.environment(), Ok(Environment::Production));
        assert_eq!(
            settings.bind_addr(),
            Ok(SocketAddr::from(([127, 0, 0, 1], 9000)))
        );
        assert_eq!(
            settings.pool_config().map(|c| c.database_url().to_owned()),
            Ok("postgres://chat@localhost/chat".to_owned())
        );
        let policy = settings.cors_policy().expect("valid policy");
        assert_eq!(policy.trusted_fallback_origin(), "https://web.example.com");
        assert_eq!(policy.api_origin().as_ref(), "https://auth.example.com");
        assert_eq!(
            settings.username_resolver().map(|r| r.max_attempts()),
            Ok(25)
        );
    }

    #[rstest]
    #[case("staging")]
    #[case("")]
    fn unknown_environment_is_rejected(#[case] value: &str) {
        let settings = AppSettings {
            environment: Some(value.to_owned()),
            ..AppSettings::default()
        };

        assert!(matches!(
            settings.environment(),
            Err(ConfigError::Invalid {
                key: "environment",
                ..
            })
        ));
    }

    #[rstest]
    fn zero_attempt_bound_is_rejected() {
        let settings = AppSettings {
            username_max_attempts: Some(0),
            ..AppSettings::default()
        };

        assert!(settings.username_resolver().is_err());
    }

    #[rstest]
    #[case(None, Some("https://auth.example.com"), "cors_origin")]
    #[case(Some("https://web.example.com"), None, "api_base_url")]
    #[case(Some("   "), Some("https://auth.example.com"), "cors_origin")]
    fn cors_policy_requires_both_origins(
        #[case] cors_origin: Option<&str>,
        #[case] api_base_url: Option<&str>,
        #[case] missing: &str,
    ) {
        let settings = AppSettings {
            cors_origin: cors_origin.map(str::to_owned),
            api_base_url: api_base_url.map(str::to_owned),
            ..AppSettings::default()
        };

        match settings.cors_policy() {
            Err(ConfigError::Missing { key }) => assert_eq!(key, missing),
            other => panic!("expected missing {missing}, got {other:?}"),
        }
    }

    #[rstest]
    fn malformed_api_base_url_is_rejected() {
        let settings = AppSettings {
            cors_origin: Some("https://web.example.com".to_owned()),
            api_base_url: Some("not a url".to_owned()),
            ..AppSettings::default()
        };

        assert!(matches!(
            settings.cors_policy(),
            Err(ConfigError::Origin(_))
        ));
    }
}
