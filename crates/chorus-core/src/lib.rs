//! # Chorus Core
//!
//! Core library for the Chorus JSON-RPC fan-out proxy.
//!
//! This crate provides the foundational components for:
//!
//! - **[`proxy`]**: The dispatch engine that fans one inbound request out to
//!   upstream workers, collects their replies under a deadline, and picks the
//!   single body to return.
//!
//! - **[`upstream`]**: Worker selection (round-robin rotation, fan-out
//!   topologies), the HTTP invoker with its cache fast path, and the
//!   majority-vote ballot that groups replies by canonical digest.
//!
//! - **[`cache`]**: TTL-bounded response memoization keyed by
//!   `(worker URI, request body)`, shared across requests, with a background
//!   sweep task.
//!
//! - **[`config`]**: Layered configuration loading (defaults, YAML file,
//!   environment overrides) and startup validation.
//!
//! - **[`types`]**: JSON-RPC 2.0 envelope types, the standard error codes,
//!   and id/method extraction from raw request bytes.
//!
//! - **[`utils`]**: Canonical JSON digesting used as the response equality
//!   key.
//!
//! ## Request Flow
//!
//! ```text
//! Client Request (raw bytes)
//!       │
//!       ▼
//! ┌──────────────┐
//! │ Extract      │ ─── missing method ──► Error Envelope
//! │ id / method  │
//! └──────┬───────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │  Selection   │  fan-out: all workers, original order
//! │  (per mode)  │  rotation modes: cursor-rotated list
//! └──────┬───────┘
//!        │
//!        ▼
//! ┌──────────────┐     per worker:
//! │   Dispatch   │ ──► cache check ──► HTTP POST ──► cache store
//! │ (bounded     │
//! │  channel +   │ ◄── replies stream back until a mode-specific
//! │  deadline)   │     stop rule or the deadline fires
//! └──────┬───────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │  Selection   │  vote mode: majority class by canonical digest
//! │  of response │  other modes: first reply with a JSON value
//! └──────┬───────┘
//!        │
//!        ▼
//! Response bytes (worker pass-through or synthesized envelope)
//! ```

pub mod cache;
pub mod config;
pub mod proxy;
pub mod types;
pub mod upstream;
pub mod utils;
