extern crate self as visor_core;

pub mod log;

pub use ::log::{debug, error, info, log_enabled, trace, warn};
