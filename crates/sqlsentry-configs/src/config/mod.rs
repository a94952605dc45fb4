pub mod defaults;
mod loader;
mod types;

pub use types::{DatabaseSettings, LoggingSettings, SafetySettings, ServerConfig};
