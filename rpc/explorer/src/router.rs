use std::sync::Arc;

use axum::{
    Router,
    handler::Handler,
    middleware,
    routing::{MethodRouter, get},
};
use tower_http::timeout::TimeoutLayer;

use crate::{config::ExplorerConfig, csrf, csrf::CsrfStore, gateway::Gatewayer, handlers};

/// State shared by all explorer handlers
pub struct ExplorerState {
    pub gateway: Arc<dyn Gatewayer>,
    /// `None` when CSRF protection is disabled
    pub csrf: Option<CsrfStore>,
}

impl ExplorerState {
    pub fn new(gateway: Arc<dyn Gatewayer>, config: &ExplorerConfig) -> Self {
        Self { gateway, csrf: config.enable_csrf.then(|| CsrfStore::new(config.csrf_token_ttl)) }
    }
}

/// Routes GET to `handler` and answers every other method, HEAD included, with 405
fn get_only<H, T>(handler: H) -> MethodRouter<Arc<ExplorerState>>
where
    H: Handler<T, Arc<ExplorerState>>,
    T: 'static,
{
    get(handler).head(handlers::method_not_allowed).fallback(handlers::method_not_allowed)
}

/// Builds the explorer API. Every endpoint answers GET only.
pub fn create_router(state: Arc<ExplorerState>, config: &ExplorerConfig) -> Router {
    Router::new()
        .route("/explorer/address", get_only(handlers::get_transactions_for_address))
        .route("/richlist", get_only(handlers::get_richlist))
        .route("/addresscount", get_only(handlers::get_address_count))
        .route("/uxout", get_only(handlers::get_uxout))
        .route("/block", get_only(handlers::get_block))
        .route("/blocks", get_only(handlers::get_blocks))
        .route("/csrf", get_only(handlers::get_csrf_token))
        .fallback(handlers::not_found)
        .layer(middleware::from_fn_with_state(state.clone(), csrf::csrf_check))
        .layer(TimeoutLayer::new(config.request_timeout))
        .with_state(state)
}
