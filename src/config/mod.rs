//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional, named by RELAY_CONFIG)
//!     → loader.rs (parse & deserialize)
//!     → environment overlay (OPENAI_API_KEY, ALLOW_ORIGINS, ...)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → shared via Arc with the relay handler
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup and never mutated afterwards
//! - All fields have defaults to allow running with no file at all
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_from_env, ConfigError};
pub use schema::{ApiKey, CorsConfig, RelayConfig, UpstreamConfig};
