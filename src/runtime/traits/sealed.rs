// ABOUTME: Sealed trait pattern for the backend capability traits.
// ABOUTME: Only in-crate backends may implement ImageOps and PodOps.

/// Sealed trait to prevent external implementations.
///
/// The capability traits can grow methods without breaking downstream code
/// because only in-crate backend types implement them.
pub trait Sealed {}
