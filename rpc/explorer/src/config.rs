use std::{
    net::{Ipv4Addr, SocketAddr},
    time::Duration,
};

use visor_addresses::Address;

pub const DEFAULT_LISTEN_PORT: u16 = 6420;
pub const DEFAULT_CSRF_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct ExplorerConfig {
    pub listen: SocketAddr,
    /// Addresses holding coins not yet in circulation, hidden from the richlist by default
    pub distribution_addresses: Vec<Address>,
    pub enable_csrf: bool,
    pub csrf_token_ttl: Duration,
    pub request_timeout: Duration,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_LISTEN_PORT)),
            distribution_addresses: vec![],
            enable_csrf: true,
            csrf_token_ttl: DEFAULT_CSRF_TOKEN_TTL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}
