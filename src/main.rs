//! ai-relay
//!
//! Keeps the OpenAI credential server-side and relays the streaming
//! Responses API to browser clients.
//!
//! # Architecture Overview
//!
//! ```text
//!     Browser                 ai-relay                          OpenAI
//!   ───────────┐   ┌────────────────────────────────┐   ┌─────────────────┐
//!   POST /api/ │──▶│ cors → parse → transform → key │──▶│ /v1/responses   │
//!   ai/stream  │   │                                 │   │ (stream: true)  │
//!              │◀──│ text/event-stream, unbuffered   │◀──│ SSE bytes       │
//!   ───────────┘   └────────────────────────────────┘   └─────────────────┘
//! ```

use ai_relay::lifecycle::{signals, startup, Shutdown};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (server, listener) = startup::bootstrap().await?;

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
