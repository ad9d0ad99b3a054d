use crate::auth::{authorization_url, CallbackError, CallbackRequest, TokenSet};
use crate::core::config::Config;
use crate::core::models::ClientConfiguration;
use crate::core::types::StateToken;
use crate::http::server::Server;
use crate::util::cli::Options;

pub mod error;
pub mod exchange;
pub mod state;
#[cfg(test)]
pub(crate) mod testing;

use error::Error;
use exchange::{HttpExchanger, TokenExchanger};
use state::StateStore;

use clap::Parser;
use std::sync::Arc;
use tracing::{event, Level};
use url::Url;

/// Drives the authorization code flow for the configured client.
pub struct OAuth2Debugger {
    config: ClientConfiguration,
    exchanger: Arc<dyn TokenExchanger>,
    states: Option<StateStore>,
}

impl std::fmt::Debug for OAuth2Debugger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuth2Debugger")
            .field("config", &self.config)
            .field("verify_state", &self.states.is_some())
            .finish()
    }
}

#[derive(Debug)]
pub struct LoginRedirect {
    pub url: Url,
    pub state: Option<StateToken>,
}

impl OAuth2Debugger {
    pub fn new(config: ClientConfiguration, exchanger: Arc<dyn TokenExchanger>) -> Self {
        Self {
            config,
            exchanger,
            states: None,
        }
    }

    /// Correlates every callback with a state token issued at login.
    pub fn with_state_verification(mut self) -> Self {
        self.states = Some(StateStore::new());
        self
    }

    pub fn config(&self) -> &ClientConfiguration {
        &self.config
    }

    #[tracing::instrument(skip_all)]
    pub fn login_request(&self) -> Result<LoginRedirect, Error> {
        let state = self.states.as_ref().map(StateStore::issue);

        let url = authorization_url(&self.config, state.as_ref()).map_err(|e| {
            event!(Level::ERROR, error = %e, "Cannot build authorization URL");
            e
        })?;

        event!(Level::DEBUG, redirect = %url, "Redirecting to authorization endpoint");
        Ok(LoginRedirect { url, state })
    }

    #[tracing::instrument(skip_all)]
    pub async fn callback_request(
        &self,
        req: CallbackRequest,
        cookie_state: Option<StateToken>,
    ) -> Result<TokenSet, Error> {
        let code = req.result().into_code().map_err(|e| {
            match &e {
                CallbackError::Denied => event!(Level::INFO, "User denied the request"),
                CallbackError::MissingCode { reason } => event!(
                    Level::INFO,
                    reason = ?reason,
                    description = ?req.error_description,
                    "Code not found"
                ),
            }
            e
        })?;
        event!(Level::DEBUG, code = %code.0, "Received authorization code");

        self.check_state(&req, cookie_state)?;

        let token = self
            .exchanger
            .exchange(&self.config, &code)
            .await
            .map_err(|e| {
                event!(Level::WARN, error = %e, "Token exchange failed");
                e
            })?;

        event!(
            Level::INFO,
            token_type = ?token.token_type,
            has_refresh_token = token.refresh_token.is_some(),
            "Token exchange succeeded"
        );
        Ok(token)
    }

    fn check_state(&self, req: &CallbackRequest, cookie: Option<StateToken>) -> Result<(), Error> {
        let states = match &self.states {
            Some(states) => states,
            None => return Ok(()),
        };

        match (&req.state, cookie) {
            (Some(state), Some(cookie)) if *state == cookie && states.redeem(state) => Ok(()),
            _ => {
                event!(Level::WARN, "State mismatch on callback");
                Err(Error::StateMismatch)
            }
        }
    }
}

async fn oauth2_debugd(config: Config) -> Option<()> {
    let exchanger = HttpExchanger::new(config.server.exchange_timeout)
        .map_err(|e| event!(Level::ERROR, error = %e, "Failed to build HTTP client"))
        .ok()?;

    let debugger = OAuth2Debugger::new(config.client, Arc::new(exchanger));
    let debugger = if config.server.verify_state {
        debugger.with_state_verification()
    } else {
        debugger
    };

    let server = Server::new(Arc::new(debugger), config.server);
    server.serve().await
}

pub async fn main() -> Result<(), ()> {
    tracing_subscriber::fmt::init();
    dotenv::dotenv().ok();

    let opts = Options::parse();
    let config = Config::from_file(&opts.config).map_err(|e| {
        event!(
            Level::ERROR,
            path = %opts.config.display(),
            error = %e,
            "Error loading config"
        )
    })?;

    oauth2_debugd(config).await.ok_or(())
}
