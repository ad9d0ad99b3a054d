use crate::auth::{AuthorizationUrlError, CallbackError, ExchangeError};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Authorization(#[from] AuthorizationUrlError),
    #[error(transparent)]
    Callback(#[from] CallbackError),
    #[error("state parameter does not match the one issued with the redirect")]
    StateMismatch,
    #[error(transparent)]
    Exchange(#[from] ExchangeError),
}
