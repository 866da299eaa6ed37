// Fetch subsystem - paginated search against the external social API.
//
// The third-party search service is an opaque collaborator behind the
// SearchSource trait. Everything moonwatch owns - retry policy, rate-limit
// waits, pacing, incremental persistence - lives in the collector.

pub mod client;
pub mod collector;
pub mod error;
pub mod session;

pub use client::{HttpSearchClient, RawPost, SearchPage, SearchSource};
pub use collector::{collect, FetchOptions, FetchOutcome};
pub use error::FetchError;
pub use session::SessionState;
