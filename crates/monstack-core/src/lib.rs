pub mod config;
pub mod endpoint;
pub mod types;

pub use config::{ClonePorts, ConfigError, ImageSet, MonstackConfig, StackLayout};
pub use endpoint::Endpoint;
pub use types::*;
