use std::collections::HashMap;
use std::sync::Mutex;
use std::time::SystemTime;

use tracing::{event, Level};

use crate::core::types::{Expire, Expiry, StateToken};
use crate::util::random::FromRandom;

/// State tokens handed out with authorization redirects, awaiting their callback.
#[derive(Debug, Default)]
pub struct StateStore {
    issued: Mutex<HashMap<StateToken, Expiry>>,
}

impl Expire for StateStore {
    const EXPIRES_IN_SECS: u64 = 5 * 60;
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> StateToken {
        let token = StateToken::from_random();
        let mut issued = self.lock();
        let now = SystemTime::now();
        issued.retain(|_, expiry| !expiry.is_past(now));
        match Self::expiry() {
            Some(expiry) => {
                issued.insert(token.clone(), expiry);
            }
            None => event!(Level::WARN, "Clock cannot represent state expiry"),
        }
        token
    }

    /// Consumes `token`, succeeding only if it was issued and has not expired.
    pub fn redeem(&self, token: &StateToken) -> bool {
        match self.lock().remove(token) {
            Some(expiry) => !expiry.is_past(SystemTime::now()),
            None => false,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<StateToken, Expiry>> {
        // Entries are inserted and removed whole, a poisoned map is still consistent.
        self.issued.lock().unwrap_or_else(|e| e.into_inner())
    }
}
