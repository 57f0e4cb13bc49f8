use std::{future::Future, sync::Arc};

use tokio::net::TcpListener;
use visor_core::info;

use crate::{
    IDENT,
    config::ExplorerConfig,
    error::GatewayResult,
    gateway::Gatewayer,
    router::{ExplorerState, create_router},
};

/// Serves the explorer API on `config.listen` until `shutdown` resolves
pub async fn serve<F>(config: ExplorerConfig, gateway: Arc<dyn Gatewayer>, shutdown: F) -> GatewayResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let state = Arc::new(ExplorerState::new(gateway, &config));
    let router = create_router(state, &config);
    let listener = TcpListener::bind(config.listen).await?;
    info!("[{0}] listening on http://{1} (csrf {2})", IDENT, listener.local_addr()?, if config.enable_csrf { "enabled" } else { "disabled" });
    axum::serve(listener, router).with_graceful_shutdown(shutdown).await?;
    info!("[{0}] http server stopped", IDENT);
    Ok(())
}
