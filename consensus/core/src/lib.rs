extern crate self as visor_consensus_core;

pub mod api;
pub mod block;
pub mod hashing;
pub mod header;
pub mod notify;
pub mod testutils;
pub mod tx;

pub use block::Block;
pub use header::Header;
