use std::sync::Arc;

use tracing::{event, Level};
use warp::Filter;

use crate::http::encoding::{self, reply::{self, Redirect}};
use crate::provider::{LoginRedirect, OAuth2Debugger};

fn redirect(login: LoginRedirect) -> Redirect {
    let redirect = Redirect::to(login.url.to_string());
    match login.state {
        Some(state) => redirect.with_cookie(encoding::set_state_cookie(&state)),
        None => redirect,
    }
}

pub fn login_endpoint(
    debugger: Arc<OAuth2Debugger>,
    login_route: &str,
) -> impl warp::Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let with_debugger = warp::any().map(move || debugger.clone());

    encoding::route(login_route)
        .and(warp::get())
        .and(encoding::request_url())
        .and(with_debugger)
        .and_then(|url: String, debugger: Arc<OAuth2Debugger>| async move {
            event!(Level::INFO, %url, "Request");
            reply::reply(debugger.login_request().map(redirect))
        })
}
