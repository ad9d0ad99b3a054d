use std::sync::Mutex;

use async_trait::async_trait;
use url::Url;

use crate::auth::{ExchangeError, TokenSet};
use crate::core::models::ClientConfiguration;
use crate::core::types::{AuthCode, ClientId, ClientSecret, RedirectUri, Scope};
use crate::provider::exchange::TokenExchanger;

/// Exchanger that records the codes it receives instead of calling out.
#[derive(Default)]
pub struct RecordingExchanger {
    pub codes: Mutex<Vec<String>>,
    pub fail: bool,
}

impl RecordingExchanger {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn codes(&self) -> Vec<String> {
        self.codes.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenExchanger for RecordingExchanger {
    async fn exchange(
        &self,
        _config: &ClientConfiguration,
        code: &AuthCode,
    ) -> Result<TokenSet, ExchangeError> {
        self.codes.lock().unwrap().push(code.0.clone());
        if self.fail {
            return Err(ExchangeError::Status {
                status: 400,
                body: "invalid_grant".to_string(),
            });
        }
        Ok(TokenSet {
            access_token: "tok1".to_string(),
            token_type: Some("Bearer".to_string()),
            refresh_token: Some("ref1".to_string()),
            expiry: Some(1_700_000_000),
        })
    }
}

pub fn client_config() -> ClientConfiguration {
    ClientConfiguration {
        client_id: ClientId("debug-client".to_string()),
        client_secret: ClientSecret("s3cret".to_string()),
        redirect_uri: RedirectUri("http://localhost:8080/callback".to_string()),
        scopes: Scope::from_parts(vec!["openid".to_string(), "email".to_string()]),
        authorization_endpoint: "https://provider.test/authorize".to_string(),
        token_endpoint: Url::parse("https://provider.test/token").unwrap(),
    }
}
