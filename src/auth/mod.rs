pub mod access_token;
pub mod authorization;
pub mod callback;
pub mod error;

pub use access_token::*;
pub use authorization::*;
pub use callback::*;
pub use error::{AuthorizationUrlError, CallbackError, ErrorResponse, ExchangeError};
