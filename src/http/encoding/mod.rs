pub mod error;
pub mod reply;

use std::convert::Infallible;
use std::sync::Arc;

use warp::filters::path::FullPath;
use warp::{Filter, Rejection};

use crate::auth::CallbackRequest;
use crate::core::types::StateToken;

pub const STATE_COOKIE: &str = "oauth2_debug_state";

/// Matches requests whose whole path equals `path`.
///
/// Routes come from configuration and may span several segments, so they
/// cannot be assembled from `warp::path` at compile time.
pub fn route(path: &str) -> impl Filter<Extract = (), Error = Rejection> + Clone {
    let path: Arc<str> = Arc::from(path);

    warp::path::full()
        .and_then(move |full: FullPath| {
            let path = Arc::clone(&path);
            async move {
                if full.as_str() == &*path {
                    Ok(())
                } else {
                    Err(warp::reject::not_found())
                }
            }
        })
        .untuple_one()
}

/// Raw query string, empty when the request carries none.
fn raw_query() -> impl Filter<Extract = (String,), Error = Infallible> + Clone {
    warp::query::raw()
        .or(warp::any().map(String::new))
        .unify()
}

/// Callback parameters, tolerant of repeated keys.
pub fn callback_query() -> impl Filter<Extract = (CallbackRequest,), Error = Infallible> + Clone {
    raw_query().map(|query: String| CallbackRequest::from_query(&query))
}

/// Path and query as the browser requested them.
pub fn request_url() -> impl Filter<Extract = (String,), Error = Infallible> + Clone {
    warp::path::full()
        .and(raw_query())
        .map(|full: FullPath, query: String| {
            if query.is_empty() {
                full.as_str().to_string()
            } else {
                format!("{}?{}", full.as_str(), query)
            }
        })
}

pub fn state_cookie() -> impl Filter<Extract = (Option<StateToken>,), Error = Infallible> + Clone {
    warp::cookie::optional(STATE_COOKIE).map(|c: Option<String>| c.map(StateToken))
}

/// `Set-Cookie` value carrying `state` back to the callback.
pub fn set_state_cookie(state: &StateToken) -> String {
    format!(
        "{}={}; Path=/; Max-Age=300; HttpOnly; SameSite=Lax",
        STATE_COOKIE, state.0
    )
}
