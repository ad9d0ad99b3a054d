use url::Url;

use crate::auth::error::AuthorizationUrlError;
use crate::core::models::ClientConfiguration;
use crate::core::types::{ClientId, RedirectUri, ResponseType, Scope, StateToken};

/// Query of the redirect sent to the provider's authorization endpoint.
#[derive(Debug, serde::Serialize)]
pub struct AuthorizationRequest<'c> {
    pub client_id: &'c ClientId,
    pub scope: &'c Scope,
    pub redirect_uri: &'c RedirectUri,
    pub response_type: ResponseType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<&'c StateToken>,
}

impl<'c> AuthorizationRequest<'c> {
    pub fn new(config: &'c ClientConfiguration) -> Self {
        Self {
            client_id: &config.client_id,
            scope: &config.scopes,
            redirect_uri: &config.redirect_uri,
            response_type: ResponseType::Code,
            state: None,
        }
    }

    pub fn with_state(mut self, state: &'c StateToken) -> Self {
        self.state = Some(state);
        self
    }

    /// Replaces the query of `endpoint` with this request.
    pub fn to_url(&self, endpoint: &str) -> Result<Url, AuthorizationUrlError> {
        let mut url = Url::parse(endpoint).map_err(|source| {
            AuthorizationUrlError::MalformedEndpoint {
                endpoint: endpoint.to_string(),
                source,
            }
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(AuthorizationUrlError::UnsupportedScheme(endpoint.to_string()));
        }

        let query = serde_urlencoded::to_string(self)?;
        let pairs = form_urlencoded::parse(query.as_bytes());
        url.query_pairs_mut().clear().extend_pairs(pairs);
        Ok(url)
    }
}

pub fn authorization_url(
    config: &ClientConfiguration,
    state: Option<&StateToken>,
) -> Result<Url, AuthorizationUrlError> {
    let request = AuthorizationRequest::new(config);
    let request = match state {
        Some(state) => request.with_state(state),
        None => request,
    };
    request.to_url(&config.authorization_endpoint)
}
