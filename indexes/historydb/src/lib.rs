pub mod api;
pub mod errors;
pub mod index;
pub mod model;
pub mod service;
pub mod stores;
mod update_container;

pub use crate::api::{HistoryIndexControlApi, HistoryIndexRetrievalApi};
pub use crate::errors::{HistoryError, HistoryResult};
pub use crate::index::HistoryIndex;

/// Log/error identifier of this component
pub const IDENT: &str = "historydb";
