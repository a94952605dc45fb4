//! sqlsentry-configs
//!
//! Server configuration types and loader for sqlsentry.

pub mod config;

pub use config::*;
