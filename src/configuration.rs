use config::ConfigError;
use serde::Deserialize;

use crate::auth::DEFAULT_ISSUER;

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    #[serde(default)]
    pub application: ApplicationSettings,
    /// Without a database section the in-memory store is used
    pub database: Option<DatabaseSettings>,
    pub auth: AuthSettings,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl ApplicationSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }
}

/// Token signing and password hashing settings
#[derive(Deserialize, Clone)]
pub struct AuthSettings {
    /// HMAC secret for access tokens
    pub secret: String,
    #[serde(default = "default_issuer")]
    pub issuer: String,
    /// bcrypt cost factor
    #[serde(default = "default_hash_cost")]
    pub hash_cost: u32,
    /// Key the Polka webhook must present; unset accepts any caller
    #[serde(default)]
    pub polka_key: Option<String>,
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("hash_cost", &self.hash_cost)
            .field("polka_key", &self.polka_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn default_issuer() -> String {
    DEFAULT_ISSUER.to_string()
}

fn default_hash_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

impl AuthSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.trim().is_empty() {
            return Err(ConfigError::Message("auth.secret must not be empty".to_string()));
        }
        if !(4..=31).contains(&self.hash_cost) {
            return Err(ConfigError::Message(format!(
                "auth.hash_cost must be between 4 and 31, got {}",
                self.hash_cost
            )));
        }
        Ok(())
    }
}

/// Load settings from `configuration.{yaml,toml,json}` and `APP__*` env vars
///
/// Environment variables win, e.g. `APP__AUTH__SECRET` or
/// `APP__APPLICATION__PORT`.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;
    parse_settings(settings)
}

fn parse_settings(settings: config::Config) -> Result<Settings, ConfigError> {
    let settings = settings.try_deserialize::<Settings>()?;
    settings.auth.validate()?;
    Ok(settings)
}
