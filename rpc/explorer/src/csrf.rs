use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Response},
};
use parking_lot::Mutex;
use rand::RngCore;

use crate::{error::HttpError, router::ExplorerState};

pub const CSRF_HEADER_NAME: &str = "X-CSRF-Token";
const CSRF_TOKEN_SIZE: usize = 32;

struct CsrfToken {
    value: String,
    expires_at: Instant,
}

/// Holds the single currently valid CSRF token. Issuing a token replaces the previous one.
pub struct CsrfStore {
    ttl: Duration,
    token: Mutex<Option<CsrfToken>>,
}

impl CsrfStore {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, token: Mutex::new(None) }
    }

    pub fn issue(&self) -> String {
        let mut bytes = [0u8; CSRF_TOKEN_SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        let value = hex::encode(bytes);
        *self.token.lock() = Some(CsrfToken { value: value.clone(), expires_at: Instant::now() + self.ttl });
        value
    }

    pub fn verify(&self, value: &str) -> bool {
        match self.token.lock().as_ref() {
            Some(token) => token.value == value && Instant::now() < token.expires_at,
            None => false,
        }
    }
}

fn is_state_changing(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Rejects state-changing requests without a valid token, before they are routed
pub async fn csrf_check(State(state): State<Arc<ExplorerState>>, request: Request, next: Next) -> Response {
    if let Some(store) = &state.csrf {
        if is_state_changing(request.method()) {
            let valid = request
                .headers()
                .get(CSRF_HEADER_NAME)
                .and_then(|value| value.to_str().ok())
                .is_some_and(|token| store.verify(token));
            if !valid {
                return HttpError::forbidden("invalid CSRF token").into_response();
            }
        }
    }
    next.run(request).await
}
