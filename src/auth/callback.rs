use std::borrow::Cow;

use crate::auth::error::CallbackError;
use crate::core::types::{AuthCode, StateToken};

pub const MISSING_CODE_MESSAGE: &str = "Code Not Found to provide AccessToken..";
pub const USER_DENIED_MESSAGE: &str = "User has denied Permission..";

const USER_DENIED: &str = "user_denied";

/// Query parameters the provider appends to the redirect URI.
#[derive(Debug, Clone, Default)]
pub struct CallbackRequest {
    pub code: Option<String>,
    pub error_reason: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
    pub state: Option<StateToken>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackResult {
    Code(AuthCode),
    Error { reason: String },
    Absent,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn keep_first(slot: &mut Option<String>, value: Cow<'_, str>) {
    if slot.is_none() {
        *slot = Some(value.into_owned());
    }
}

impl CallbackRequest {
    /// Decodes a raw callback query string. A repeated key keeps its first
    /// value, unknown keys are ignored.
    pub fn from_query(query: &str) -> Self {
        let mut req = Self::default();
        let mut state = None;

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match &*key {
                "code" => keep_first(&mut req.code, value),
                "error_reason" => keep_first(&mut req.error_reason, value),
                "error" => keep_first(&mut req.error, value),
                "error_description" => keep_first(&mut req.error_description, value),
                "state" => keep_first(&mut state, value),
                _ => {}
            }
        }

        req.state = state.map(StateToken);
        req
    }

    pub fn result(&self) -> CallbackResult {
        if let Some(code) = non_empty(&self.code) {
            return CallbackResult::Code(AuthCode(code.to_string()));
        }

        match non_empty(&self.error_reason).or_else(|| non_empty(&self.error)) {
            Some(reason) => CallbackResult::Error {
                reason: reason.to_string(),
            },
            None => CallbackResult::Absent,
        }
    }
}

impl CallbackResult {
    /// Only an explicit `user_denied` counts as a denial.
    pub fn into_code(self) -> Result<AuthCode, CallbackError> {
        match self {
            Self::Code(code) => Ok(code),
            Self::Error { reason } if reason == USER_DENIED => Err(CallbackError::Denied),
            Self::Error { reason } => Err(CallbackError::MissingCode {
                reason: Some(reason),
            }),
            Self::Absent => Err(CallbackError::MissingCode { reason: None }),
        }
    }
}
