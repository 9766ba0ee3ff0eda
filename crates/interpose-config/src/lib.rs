//! Typed configuration for the Interpose runtime.
//!
//! - TOML and JSON configuration files
//! - `.env` files and `PREFIX__SECTION__KEY` environment overrides
//! - Strict parsing (unknown fields are rejected)
//! - Layered loading (defaults → file → env)
//!
//! # Example
//!
//! ```no_run
//! use interpose_config::ConfigLoader;
//!
//! # fn main() -> Result<(), interpose_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_dotenv()?
//!     .with_optional_file("interpose.toml")?
//!     .with_env_prefix("INTERPOSE")
//!     .load()?;
//!
//! println!("max chain length: {}", config.container.max_chain_length);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [container]
//! max_chain_length = 64
//! log_lifecycle = true
//!
//! [telemetry.logging]
//! enabled = true
//! level = "info"
//! format = "json"
//! span_events = false
//!
//! [telemetry.metrics]
//! enabled = false
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{InterposeConfig, InterposeConfigBuilder};
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{ContainerConfig, LogFormat, LoggingSection, MetricsSection, TelemetrySection};
