//! Network adapters and shared infrastructure for the Waybill engine.
//!
//! Responsibilities:
//! - Implement the `waybill-core` ports against public HTTP services.
//! - Provide a thread-safe in-memory cache with per-entry expiry.
//!
//! Boundaries:
//! - Do not encode planning rules (those live in `waybill-core`).
//! - Keep blocking waits off async executors; adapters bridge async clients
//!   to the synchronous ports internally.
//!
//! Invariants:
//! - Clients are `Send + Sync` and safe to share between trips.
//! - No global mutable state.

mod cache;
mod http;
pub mod nominatim;
pub mod ors;

pub use cache::MemoryCache;
pub use http::{DEFAULT_USER_AGENT, ProviderBuildError};
