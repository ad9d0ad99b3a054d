use crate::auth::{
    AuthorizationUrlError, CallbackError, ExchangeError, MISSING_CODE_MESSAGE, USER_DENIED_MESSAGE,
};
use crate::http::encoding::reply::Redirect;
use crate::http::server::HOME_ROUTE;
use crate::provider::error::Error;
use warp::http::StatusCode;
use warp::{Rejection, Reply};

pub const STATE_MISMATCH_MESSAGE: &str = "State mismatch, restart the login..";

#[derive(Debug)]
pub enum DebugRejection {
    Authorization(AuthorizationUrlError),
    Callback(CallbackError),
    StateMismatch,
    Exchange(ExchangeError),
}

impl warp::reject::Reject for DebugRejection {}

impl From<Error> for DebugRejection {
    fn from(error: Error) -> Self {
        match error {
            Error::Authorization(e) => Self::Authorization(e),
            Error::Callback(e) => Self::Callback(e),
            Error::StateMismatch => Self::StateMismatch,
            Error::Exchange(e) => Self::Exchange(e),
        }
    }
}

pub async fn handle_reject(err: Rejection) -> Result<impl Reply, Rejection> {
    let rejection = match err.find::<DebugRejection>() {
        Some(rejection) => rejection,
        None => return Err(err),
    };

    let response = match rejection {
        DebugRejection::Authorization(_) => warp::reply::with_status(
            "Failed to build the authorization URL..",
            StatusCode::INTERNAL_SERVER_ERROR,
        )
        .into_response(),
        DebugRejection::Callback(CallbackError::Denied) => {
            warp::reply::with_status(USER_DENIED_MESSAGE, StatusCode::FORBIDDEN).into_response()
        }
        DebugRejection::Callback(CallbackError::MissingCode { reason }) => {
            let body = match reason {
                Some(reason) => format!("{}\nProvider error: {}", MISSING_CODE_MESSAGE, reason),
                None => MISSING_CODE_MESSAGE.to_string(),
            };
            warp::reply::with_status(body, StatusCode::BAD_REQUEST).into_response()
        }
        DebugRejection::StateMismatch => {
            warp::reply::with_status(STATE_MISMATCH_MESSAGE, StatusCode::BAD_REQUEST)
                .into_response()
        }
        // The provider's error stays in the log, the browser starts over.
        DebugRejection::Exchange(_) => Redirect::to(HOME_ROUTE).into_response(),
    };

    Ok(response)
}
