use super::error::DebugRejection;
use crate::auth::TokenSet;
use tracing::{event, Level};
use warp::http::header::{HeaderValue, CONTENT_TYPE, LOCATION, SET_COOKIE};
use warp::http::StatusCode;
use warp::reply::{Reply, Response};
use warp::Rejection;

/// `307 Temporary Redirect`, optionally setting a cookie on the way.
#[derive(Debug, Clone)]
pub struct Redirect {
    location: String,
    cookie: Option<String>,
}

impl Redirect {
    pub fn to(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            cookie: None,
        }
    }

    pub fn with_cookie(mut self, cookie: String) -> Self {
        self.cookie = Some(cookie);
        self
    }
}

impl Reply for Redirect {
    fn into_response(self) -> Response {
        let location = match HeaderValue::from_str(&self.location) {
            Ok(location) => location,
            Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        };

        let mut response = Response::new(warp::hyper::Body::empty());
        *response.status_mut() = StatusCode::TEMPORARY_REDIRECT;
        response.headers_mut().insert(LOCATION, location);

        if let Some(cookie) = self.cookie.and_then(|c| HeaderValue::from_str(&c).ok()) {
            response.headers_mut().insert(SET_COOKIE, cookie);
        }
        response
    }
}

pub struct JsonEncoded {
    inner: Result<String, serde_json::Error>,
}

impl JsonEncoded {
    pub fn encode(token: &TokenSet) -> Self {
        Self {
            inner: token.to_json(),
        }
    }
}

impl Reply for JsonEncoded {
    fn into_response(self) -> Response {
        match self.inner {
            Ok(body) => {
                let mut response = Response::new(body.into());
                response
                    .headers_mut()
                    .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                response
            }
            Err(e) => {
                event!(Level::ERROR, error = %e, "Error happened in JSON marshal");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

pub fn reply<T, E>(result: Result<T, E>) -> Result<Response, Rejection>
where
    T: Reply,
    E: Into<DebugRejection>,
{
    result
        .map(|t| t.into_response())
        .map_err(|e| warp::reject::custom::<DebugRejection>(e.into()))
}
