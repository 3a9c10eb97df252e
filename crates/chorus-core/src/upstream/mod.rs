//! Worker communication and selection.
//!
//! This module handles everything between the proxy and its JSON-RPC
//! workers:
//! - the shared HTTP client and its sanitized error categories
//! - selection modes and the round-robin rotation cursor
//! - the invoker that wraps one worker call in cache lookup and store rules
//! - majority grouping for vote-based response selection
//!
//! # Selection Modes
//!
//! Which workers see a request, and which reply answers it, depends on the
//! configured mode:
//!
//! ```text
//! Request → [mode?]
//!             │
//!             ├─ fist_of_all → every worker, first valid reply wins
//!             │
//!             ├─ most_of_all → every worker, majority reply wins
//!             │
//!             ├─ only_first  → rotated order, one worker at a time until
//!             │                one replies validly
//!             │
//!             └─ only_once   → exactly one rotated worker, no fallback
//! ```

pub mod consensus;
pub mod errors;
pub mod http_client;
pub mod invoker;
pub mod selection;

pub use consensus::{MajorityBallot, ResponseClass};
pub use errors::WorkerCallError;
pub use http_client::WorkerClient;
pub use invoker::{WorkerInvoker, WorkerOutcome, WorkerReply};
pub use selection::{SelectionMode, WorkerPool, WorkerTarget};
