use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use tracing::{event, Level};

use crate::auth::{
    decode_error_response, decode_token_response, AccessTokenRequest, ExchangeError, TokenSet,
};
use crate::core::models::ClientConfiguration;
use crate::core::types::AuthCode;

/// Trades an authorization code for tokens at the provider.
#[async_trait]
pub trait TokenExchanger: Send + Sync {
    async fn exchange(
        &self,
        config: &ClientConfiguration,
        code: &AuthCode,
    ) -> Result<TokenSet, ExchangeError>;
}

/// Exchanger posting to the configured token endpoint over HTTP.
///
/// The request future is owned by the inbound request, so a dropped browser
/// connection aborts the outbound call as well. `timeout` bounds it otherwise.
#[derive(Debug, Clone)]
pub struct HttpExchanger {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpExchanger {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, timeout })
    }

    fn transport_error(&self, e: reqwest::Error) -> ExchangeError {
        if e.is_timeout() {
            ExchangeError::Timeout(self.timeout)
        } else {
            ExchangeError::Transport(e)
        }
    }
}

#[async_trait]
impl TokenExchanger for HttpExchanger {
    #[tracing::instrument(skip_all, fields(token_endpoint = %config.token_endpoint))]
    async fn exchange(
        &self,
        config: &ClientConfiguration,
        code: &AuthCode,
    ) -> Result<TokenSet, ExchangeError> {
        let body = serde_urlencoded::to_string(AccessTokenRequest::new(config, code))
            .map_err(|e| ExchangeError::Malformed(e.to_string()))?;

        event!(Level::DEBUG, "Posting authorization_code grant");
        let response = self
            .client
            .post(config.token_endpoint.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;

        event!(Level::DEBUG, status = status.as_u16(), "Token endpoint answered");

        if !status.is_success() {
            return Err(match decode_error_response(&body) {
                Some(error) => ExchangeError::Provider(error),
                None => ExchangeError::Status {
                    status: status.as_u16(),
                    body: String::from_utf8_lossy(&body).into_owned(),
                },
            });
        }

        decode_token_response(content_type.as_deref(), &body, SystemTime::now())
    }
}
