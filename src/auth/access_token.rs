use std::time::SystemTime;

use serde::{de::Error as _, Deserialize, Deserializer};

use crate::auth::error::{ErrorResponse, ExchangeError};
use crate::core::models::ClientConfiguration;
use crate::core::types::{AuthCode, ClientId, Expiry, GrantType, RedirectUri};

/// Form body posted to the provider's token endpoint.
#[derive(Debug, serde::Serialize)]
pub struct AccessTokenRequest<'a> {
    pub grant_type: GrantType,
    pub code: &'a AuthCode,
    pub redirect_uri: &'a RedirectUri,
    pub client_id: &'a ClientId,
    pub client_secret: &'a str,
}

impl<'a> AccessTokenRequest<'a> {
    pub fn new(config: &'a ClientConfiguration, code: &'a AuthCode) -> Self {
        Self {
            grant_type: GrantType::AuthorizationCode,
            code,
            redirect_uri: &config.redirect_uri,
            client_id: &config.client_id,
            client_secret: config.client_secret.as_ref(),
        }
    }
}

/// Token endpoint body, success and error fields alike.
#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    access_token: Option<String>,
    token_type: Option<String>,
    refresh_token: Option<String>,
    #[serde(default, deserialize_with = "deserialize_expires_in")]
    expires_in: Option<u64>,
    error: Option<String>,
    error_description: Option<String>,
    error_uri: Option<String>,
}

fn deserialize_expires_in<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seconds(u64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Seconds(secs)) => Ok(Some(secs)),
        Some(Raw::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(Raw::Text(text)) => text.trim().parse().map(Some).map_err(D::Error::custom),
    }
}

fn filled(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl AccessTokenResponse {
    fn into_token_set(self, now: SystemTime) -> Result<TokenSet, ExchangeError> {
        if let Some(kind) = filled(self.error) {
            return Err(ExchangeError::Provider(ErrorResponse {
                kind,
                description: filled(self.error_description),
                uri: filled(self.error_uri),
            }));
        }

        let access_token = filled(self.access_token).ok_or(ExchangeError::MissingAccessToken)?;
        let expiry = self
            .expires_in
            .filter(|secs| *secs > 0)
            .and_then(|secs| Expiry::after(now, secs))
            .map(|expiry| expiry.unix_timestamp());

        Ok(TokenSet {
            access_token,
            token_type: filled(self.token_type),
            refresh_token: filled(self.refresh_token),
            expiry,
        })
    }
}

fn is_form_encoded(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|ct| ct.split(';').next())
        .map(|mime| mime.trim().eq_ignore_ascii_case("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}

/// Decodes a successful token endpoint body into a [`TokenSet`].
///
/// Bodies are JSON unless the provider labels them form encoded. An
/// unparsable body is an error, never an empty token.
pub fn decode_token_response(
    content_type: Option<&str>,
    body: &[u8],
    now: SystemTime,
) -> Result<TokenSet, ExchangeError> {
    let response: AccessTokenResponse = if is_form_encoded(content_type) {
        serde_urlencoded::from_bytes(body).map_err(|e| ExchangeError::Malformed(e.to_string()))?
    } else {
        serde_json::from_slice(body).map_err(|e| ExchangeError::Malformed(e.to_string()))?
    };

    response.into_token_set(now)
}

/// Decodes the OAuth error carried by a rejected token request, if any.
pub fn decode_error_response(body: &[u8]) -> Option<ErrorResponse> {
    serde_json::from_slice::<ErrorResponse>(body)
        .ok()
        .or_else(|| serde_urlencoded::from_bytes::<ErrorResponse>(body).ok())
        .filter(|e| !e.kind.is_empty())
}

/// Tokens issued by one successful exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSet {
    pub access_token: String,
    pub token_type: Option<String>,
    pub refresh_token: Option<String>,
    /// Absolute expiry, seconds since the Unix epoch.
    pub expiry: Option<i64>,
}

/// JSON shape handed back to the browser.
#[derive(Debug, serde::Serialize)]
pub struct TokenFormatted<'t> {
    pub access_token: &'t str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<&'t str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<&'t str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
}

impl TokenSet {
    pub fn formatted(&self) -> TokenFormatted<'_> {
        TokenFormatted {
            access_token: &self.access_token,
            token_type: self.token_type.as_deref().filter(|t| !t.is_empty()),
            refresh_token: self.refresh_token.as_deref().filter(|t| !t.is_empty()),
            expires_in: self.expiry.filter(|e| *e != 0),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.formatted())
    }
}
