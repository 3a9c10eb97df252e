//! Proxy module for handling JSON-RPC request processing and dispatch.
//!
//! # Main Components
//!
//! - `ProxyEngine`: parses inbound bodies, dispatches worker calls, and picks
//!   the reply to return
//! - `ProxyError`: failures while constructing an engine from configuration
//!
//! # Request Processing Flow
//!
//! ```text
//! Request Body
//!       │
//!       ▼
//! ┌─────────────┐
//! │  JSON parse │ ─── Malformed ──► -32600 envelope
//! └──────┬──────┘
//!        │ Parsed (method + id extracted)
//!        ▼
//! ┌──────────────────┐
//! │  Select targets  │  per SelectionMode
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │  Spawn + collect │  bounded channel, absolute deadline
//! └────────┬─────────┘
//!          │
//!    ┌─────┴──────────────┐
//!    ▼                    ▼
//! Usable reply       Nothing usable
//! (forward verbatim  (-32603 envelope)
//!  or majority body)
//! ```
//!
//! Replies are forwarded byte for byte; the engine only fabricates envelopes
//! when no worker produced a usable one.

pub mod engine;
pub mod errors;

pub use engine::ProxyEngine;
pub use errors::ProxyError;
