use std::{
    net::{IpAddr, Ipv4Addr},
    path::{Path, PathBuf},
    time::Duration,
};

use url::Url;

use crate::core::models::ClientConfiguration;
use crate::core::types::{ClientId, ClientSecret, RedirectUri, Scope};

pub const GOOGLE_AUTHORIZATION_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/auth";
pub const GOOGLE_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("{0} must not be empty")]
    Missing(&'static str),
    #[error("scope #{0} is empty")]
    EmptyScope(usize),
    #[error("port must be a number, got {0:?}")]
    InvalidPort(String),
    #[error("{name} must be an absolute path, got {value:?}")]
    InvalidRoute { name: &'static str, value: String },
    #[error("{name} is not a valid URL: {source}")]
    InvalidEndpoint {
        name: &'static str,
        source: url::ParseError,
    },
}

/// Settings for the local listener and the routes it serves.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: IpAddr,
    pub port: u16,
    pub login_route: String,
    pub callback_route: String,
    pub title: String,
    pub verify_state: bool,
    pub exchange_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub client: ClientConfiguration,
    pub server: ServerSettings,
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = serde_yaml::from_str(raw)?;
        file.into_config()
    }
}

/// Layout of the YAML configuration file.
#[derive(Debug, serde::Deserialize)]
struct ConfigFile {
    #[serde(default)]
    client_id: String,
    #[serde(default)]
    client_secret: String,
    port: Port,
    callback_route: String,
    #[serde(default)]
    scopes: Vec<String>,
    #[serde(default)]
    redirect_uri: Option<String>,
    #[serde(default = "default_host")]
    host: IpAddr,
    #[serde(default = "default_login_route")]
    login_route: String,
    #[serde(default = "default_authorization_endpoint")]
    authorization_endpoint: String,
    #[serde(default = "default_token_endpoint")]
    token_endpoint: String,
    #[serde(default = "default_exchange_timeout")]
    exchange_timeout_secs: u64,
    #[serde(default)]
    verify_state: bool,
    #[serde(default = "default_title")]
    title: String,
}

/// Ports are accepted both as YAML numbers and as quoted strings.
#[derive(Debug, serde::Deserialize)]
#[serde(untagged)]
enum Port {
    Number(u16),
    Text(String),
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_login_route() -> String {
    "/login".to_string()
}

fn default_authorization_endpoint() -> String {
    GOOGLE_AUTHORIZATION_ENDPOINT.to_string()
}

fn default_token_endpoint() -> String {
    GOOGLE_TOKEN_ENDPOINT.to_string()
}

fn default_exchange_timeout() -> u64 {
    30
}

fn default_title() -> String {
    "Google OAuth-2 Debug".to_string()
}

fn check_route(name: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.starts_with('/') {
        Ok(())
    } else {
        Err(ConfigError::InvalidRoute {
            name,
            value: value.to_string(),
        })
    }
}

fn parse_endpoint(name: &'static str, value: &str) -> Result<Url, ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Missing(name));
    }
    Url::parse(value).map_err(|source| ConfigError::InvalidEndpoint { name, source })
}

impl ConfigFile {
    fn into_config(self) -> Result<Config, ConfigError> {
        let port = match self.port {
            Port::Number(port) => port,
            Port::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(text.clone()))?,
        };

        if let Some(index) = self.scopes.iter().position(|s| s.trim().is_empty()) {
            return Err(ConfigError::EmptyScope(index));
        }

        check_route("callback_route", &self.callback_route)?;
        check_route("login_route", &self.login_route)?;
        parse_endpoint("authorization_endpoint", &self.authorization_endpoint)?;
        let token_endpoint = parse_endpoint("token_endpoint", &self.token_endpoint)?;

        let redirect_uri = match self.redirect_uri {
            Some(uri) => uri,
            None => format!("http://localhost:{}{}", port, self.callback_route),
        };

        let client = ClientConfiguration::new(
            ClientId(self.client_id),
            ClientSecret(self.client_secret),
            RedirectUri(redirect_uri),
            Scope::from_parts(self.scopes),
            self.authorization_endpoint,
            token_endpoint,
        )?;

        let server = ServerSettings {
            host: self.host,
            port,
            login_route: self.login_route,
            callback_route: self.callback_route,
            title: self.title,
            verify_state: self.verify_state,
            exchange_timeout: Duration::from_secs(self.exchange_timeout_secs),
        };

        Ok(Config { client, server })
    }
}
