//! Observability: ephemeral remote-call and cache accounting.
//!
//! Counters are thread-local and never affect planning or result semantics.
//! They exist so callers (and tests) can verify how much remote work a
//! consumption actually performed.

pub mod metrics;

pub use metrics::EventOps;
