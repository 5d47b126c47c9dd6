//! Browser-to-upstream relay.
//!
//! # Data Flow
//! ```text
//! {messages, system} (browser JSON)
//!     → payload.rs (parse, build upstream input)
//!     → upstream.rs (bearer-authenticated streaming POST)
//!     → handler.rs (status/headers, byte-level pass-through)
//! ```

pub mod handler;
pub mod payload;
pub mod upstream;

pub use handler::relay_handler;
pub use payload::{InboundPayload, InputItem, Message, Role};
pub use upstream::UpstreamClient;
