// ABOUTME: Backend implementations of the capability traits.
// ABOUTME: BollardBackend for Docker-compatible engines, FakeBackend for self-tests.

mod bollard;
mod error;
mod fake;
pub mod traits;

pub use bollard::BollardBackend;
pub use error::{ConnectError, ConnectErrorKind};
pub use fake::{FakeBackend, FakeImage};
pub use traits::*;
