use std::sync::Arc;

use tracing::{event, Level};
use warp::Filter;

use crate::auth::CallbackRequest;
use crate::core::types::StateToken;
use crate::http::encoding::{self, reply::{self, JsonEncoded}};
use crate::provider::OAuth2Debugger;

pub fn callback_endpoint(
    debugger: Arc<OAuth2Debugger>,
    callback_route: &str,
) -> impl warp::Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let with_debugger = warp::any().map(move || debugger.clone());

    // Either the token set as JSON or a rejection explaining what went wrong
    encoding::route(callback_route)
        .and(warp::get())
        .and(encoding::request_url())
        .and(with_debugger)
        .and(encoding::callback_query())
        .and(encoding::state_cookie())
        .and_then(
            |url: String,
             debugger: Arc<OAuth2Debugger>,
             req: CallbackRequest,
             cookie: Option<StateToken>| async move {
                event!(Level::INFO, %url, "Request");
                let result = debugger.callback_request(req, cookie).await;
                reply::reply(result.map(|token| JsonEncoded::encode(&token)))
            },
        )
}
