use crate::core::config::ConfigError;
use crate::core::types::{ClientId, ClientSecret, RedirectUri, Scope};

use url::Url;

/// Credentials and endpoints of the single client this harness drives.
///
/// Built once at startup and shared read-only between requests.
#[derive(Debug, Clone)]
pub struct ClientConfiguration {
    pub client_id: ClientId,
    pub client_secret: ClientSecret,
    pub redirect_uri: RedirectUri,
    pub scopes: Scope,
    /// Kept as text; it is parsed each time an authorization URL is built.
    pub authorization_endpoint: String,
    pub token_endpoint: Url,
}

impl ClientConfiguration {
    pub fn new(
        client_id: ClientId,
        client_secret: ClientSecret,
        redirect_uri: RedirectUri,
        scopes: Scope,
        authorization_endpoint: String,
        token_endpoint: Url,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            client_id,
            client_secret,
            redirect_uri,
            scopes,
            authorization_endpoint,
            token_endpoint,
        };
        config.validate()?;
        Ok(config)
    }

    /// Every field but the scopes must be non-empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("client_id", self.client_id.0.as_str()),
            ("client_secret", self.client_secret.as_ref()),
            ("redirect_uri", self.redirect_uri.0.as_str()),
            ("authorization_endpoint", self.authorization_endpoint.as_str()),
        ];

        match required.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((name, _)) => Err(ConfigError::Missing(*name)),
            None => Ok(()),
        }
    }
}
