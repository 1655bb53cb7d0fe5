//! Adapter module - external control via TCP socket with JSON protocol
//!
//! Lets a renderer/input process, or a bot, drive a [`dotlink_core::Session`]
//! over a TCP socket and follow the resulting core events.
//!
//! # Protocol Overview
//!
//! The adapter implements a **line-delimited JSON protocol** over TCP:
//!
//! 1. **Connection**: Client connects to TCP socket (default: 127.0.0.1:7777)
//! 2. **Handshake**: Client sends `hello`, server responds with `welcome`
//! 3. **Controller Assignment**: First client to hello becomes the controller
//! 4. **Streaming**: Server forwards core events and post-command observations
//! 5. **Commanding**: Controller sends gesture and grid commands
//!
//! # Message Types
//!
//! ## Client → Server
//!
//! - **hello**: Initial handshake with client info and requested streams
//! - **command**: `dragStart`, `dragUpdate`, `dragEnd`, `tap`, `shuffle`,
//!   `hint` or `snapshot`, with optional `x`/`y` tile coordinates
//!
//! ## Server → Client
//!
//! - **welcome**: Response to hello with assigned role and action list
//! - **event**: One core event (chain resolved, piece moved, hint found, ...)
//! - **observation**: Grid snapshot plus game state and solvability
//! - **ack**: Command acknowledgment, sent once the game loop applied it
//! - **error**: Error response with code and message
//!
//! # Environment Variables
//!
//! - `DOTLINK_AI_HOST`: Bind address (default: "127.0.0.1")
//! - `DOTLINK_AI_PORT`: Port number (default: 7777)
//! - `DOTLINK_AI_MAX_PENDING`: Command queue capacity (default: 10)
//! - `DOTLINK_AI_DISABLED`: Set to "1" or "true" to disable adapter entirely
//!
//! # Example Protocol Flow
//!
//! ```text
//! Client -> Server: {"type":"hello","seq":1,"ts":0,"client":{"name":"bot","version":"0.1.0"},"protocol_version":"1.0.0"}
//! Server -> Client: {"type":"welcome","seq":1,"ts":...,"protocol_version":"1.0.0","client_id":1,"role":"controller",...}
//! Client -> Server: {"type":"command","seq":2,"ts":0,"action":"dragStart","x":0,"y":0}
//! Server -> Client: {"type":"event","seq":3,"ts":...,"event":{"name":"lineStarted",...}}
//! Server -> Client: {"type":"ack","seq":2,"ts":...,"status":"ok"}
//! ```
//!
//! # Testing
//!
//! ```bash
//! nc 127.0.0.1 7777
//! {"type":"hello","seq":1,"ts":0,"client":{"name":"test","version":"1.0.0"},"protocol_version":"1.0.0"}
//! ```

pub mod protocol;
pub mod runtime;
pub mod server;

pub use dotlink_core as core;
pub use dotlink_types as types;

// Re-export protocol types for convenience
pub use protocol::*;
pub use runtime::{
    apply_inbound, Adapter, ClientCommand, EventForwarder, InboundCommand, InboundPayload,
    OutboundMessage,
};
pub use server::{run_server, ClientOutbound, ServerConfig, ServerState};
