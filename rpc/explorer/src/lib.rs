pub mod config;
pub mod csrf;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod router;
pub mod server;
pub mod views;

#[cfg(test)]
mod fake_gateway;

pub use crate::config::ExplorerConfig;
pub use crate::error::{GatewayError, GatewayResult, HttpError};
pub use crate::gateway::{Gateway, Gatewayer};
pub use crate::router::{ExplorerState, create_router};
pub use crate::server::serve;

/// Log/error identifier of this component
pub const IDENT: &str = "explorer";
