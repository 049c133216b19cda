//! In-memory mutation log, index helpers, and store-side clock.

/// Clock abstraction and monotonic stamping.
pub mod clock;
/// Helper index aliases.
pub mod indices;
/// In-memory mutation log.
pub mod store;
