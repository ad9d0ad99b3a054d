use std::time::Duration;

/// OAuth 2.0 error body as returned by a token endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    #[serde(rename = "error")]
    pub kind: String,
    #[serde(rename = "error_description")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "error_uri")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

impl std::fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.kind)?;
        if let Some(description) = &self.description {
            write!(f, ": {}", description)?;
        }
        if let Some(uri) = &self.uri {
            write!(f, " ({})", uri)?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthorizationUrlError {
    #[error("malformed authorization endpoint {endpoint:?}: {source}")]
    MalformedEndpoint {
        endpoint: String,
        source: url::ParseError,
    },
    #[error("authorization endpoint {0:?} is not an http(s) URL")]
    UnsupportedScheme(String),
    #[error("failed to encode authorization request: {0}")]
    Encoding(#[from] serde_urlencoded::ser::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallbackError {
    #[error("user denied the authorization request")]
    Denied,
    #[error("callback carried no authorization code")]
    MissingCode { reason: Option<String> },
}

#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    #[error("token request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("token request timed out after {0:?}")]
    Timeout(Duration),
    #[error("token endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("token endpoint rejected the request: {0}")]
    Provider(ErrorResponse),
    #[error("malformed token response: {0}")]
    Malformed(String),
    #[error("server response missing access_token")]
    MissingAccessToken,
}
