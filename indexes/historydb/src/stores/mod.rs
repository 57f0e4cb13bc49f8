pub mod address_txns;
pub mod address_uxouts;
pub mod blocks;
pub mod meta;
pub mod store_manager;
pub mod transactions;
pub mod uxouts;
