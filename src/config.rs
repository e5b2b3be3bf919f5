use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub game: GameConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Browser origins allowed by CORS. Empty allows any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expires_in: i64,  // seconds
    pub refresh_token_expires_in: i64, // seconds
}

/// HTTP mail relay. An empty `api_url` disables outgoing mail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    #[serde(default)]
    pub api_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_mail_from")]
    pub from: String,
    #[serde(default = "default_app_name")]
    pub app_name: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            api_key: String::new(),
            from: default_mail_from(),
            app_name: default_app_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Lifetime of validation tokens, in seconds
    #[serde(default = "default_validation_expire")]
    pub validation_expire: i64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            validation_expire: default_validation_expire(),
        }
    }
}

/// Ticket hydration settings.
///
/// `dispatch` maps a prize label to its share of `require`, in percent.
/// The shares are not checked to add up to 100.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default)]
    pub hydrate_on_start: bool,
    #[serde(default = "default_require")]
    pub require: u64,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_dispatch")]
    pub dispatch: BTreeMap<String, u32>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            hydrate_on_start: false,
            require: default_require(),
            batch_size: default_batch_size(),
            dispatch: default_dispatch(),
        }
    }
}

fn default_mail_from() -> String {
    "no-reply@thetiptop.local".to_string()
}

fn default_app_name() -> String {
    "The Tip Top".to_string()
}

fn default_validation_expire() -> i64 {
    900
}

fn default_require() -> u64 {
    1_500_000
}

fn default_batch_size() -> usize {
    1000
}

fn default_dispatch() -> BTreeMap<String, u32> {
    BTreeMap::from([
        ("Infuseur à thé".to_string(), 60),
        ("Une boite de 100g de thé détox".to_string(), 20),
        ("Une boite de 100g de thé signature".to_string(), 10),
        ("Coffret découverte 39€".to_string(), 6),
        ("Coffret découverte 69€".to_string(), 4),
    ])
}

fn get_env(name: &str) -> Option<String> {
    env::var(name).ok()
}

fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Comma separated list, blanks dropped.
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        let mut config: Config = match std::fs::read_to_string(&config_path) {
            Ok(config_str) => Self::parse(&config_str)?,
            // No config file: build everything from the environment
            Err(e) if e.kind() == ErrorKind::NotFound => Self::from_env()?,
            Err(e) => {
                return Err(format!("Cannot read config file {config_path}: {e}").into());
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn parse(config_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        toml::from_str(config_str).map_err(|e| format!("Invalid config file: {e}").into())
    }

    fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let database_url = get_env("DATABASE_URL")
            .ok_or("DATABASE_URL is not set and no config.toml was found")?;

        Ok(Config {
            server: ServerConfig {
                host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: get_env_parse("SERVER_PORT", 8080u16),
                allowed_origins: Vec::new(),
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
            },
            jwt: JwtConfig {
                secret: get_env("JWT_SECRET")
                    .unwrap_or_else(|| "change-me-in-production".to_string()),
                access_token_expires_in: get_env_parse("JWT_ACCESS_EXPIRES_IN", 900i64),
                refresh_token_expires_in: get_env_parse("JWT_REFRESH_EXPIRES_IN", 1800i64),
            },
            mail: MailConfig::default(),
            security: SecurityConfig::default(),
            game: GameConfig::default(),
        })
    }

    /// Environment variables win over file values.
    fn apply_env_overrides(&mut self) {
        if let Some(v) = get_env("SERVER_HOST") {
            self.server.host = v;
        }
        if let Some(p) = get_env("SERVER_PORT").and_then(|v| v.parse().ok()) {
            self.server.port = p;
        }
        if let Some(v) = get_env("CORS_ALLOWED_ORIGINS") {
            self.server.allowed_origins = split_list(&v);
        }
        if let Some(v) = get_env("DATABASE_URL") {
            self.database.url = v;
        }
        if let Some(mc) = get_env("DB_MAX_CONNECTIONS").and_then(|v| v.parse().ok()) {
            self.database.max_connections = mc;
        }
        if let Some(v) = get_env("JWT_SECRET") {
            self.jwt.secret = v;
        }
        if let Some(n) = get_env("JWT_ACCESS_EXPIRES_IN").and_then(|v| v.parse().ok()) {
            self.jwt.access_token_expires_in = n;
        }
        if let Some(n) = get_env("JWT_REFRESH_EXPIRES_IN").and_then(|v| v.parse().ok()) {
            self.jwt.refresh_token_expires_in = n;
        }
        if let Some(v) = get_env("MAIL_API_URL") {
            self.mail.api_url = v;
        }
        if let Some(v) = get_env("MAIL_API_KEY") {
            self.mail.api_key = v;
        }
        if let Some(v) = get_env("MAIL_FROM") {
            self.mail.from = v;
        }
        if let Some(v) = get_env("APP_NAME") {
            self.mail.app_name = v;
        }
        if let Some(n) = get_env("VALIDATION_EXPIRE").and_then(|v| v.parse().ok()) {
            self.security.validation_expire = n;
        }
        if let Some(b) = get_env("GAME_HYDRATE_ON_START").and_then(|v| v.parse().ok()) {
            self.game.hydrate_on_start = b;
        }
        if let Some(n) = get_env("GAME_REQUIRE").and_then(|v| v.parse().ok()) {
            self.game.require = n;
        }
        if let Some(n) = get_env("GAME_BATCH_SIZE").and_then(|v| v.parse().ok()) {
            self.game.batch_size = n;
        }
    }
}
