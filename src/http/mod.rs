//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID)
//!     → cors.rs (allow-origin resolution, preflight)
//!     → relay handler
//!     → error.rs (structured JSON failures)
//!     → Send to client
//! ```

pub mod cors;
pub mod error;
pub mod request;
pub mod server;

pub use cors::AllowList;
pub use error::RelayError;
pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};
