// ABOUTME: Capability traits for the backend under test.
// ABOUTME: ImageOps covers the image service, PodOps the sandbox/container lifecycle.

mod image;
mod pod;
pub(crate) mod sealed;
mod shared_types;

pub use image::{ImageError, ImageOps};
pub use pod::{PodOps, RuntimeError};
pub use shared_types::*;

/// The full capability surface the harness is injected with: image service
/// plus sandbox/container lifecycle.
pub trait Backend: ImageOps + PodOps {}

impl<T: ImageOps + PodOps> Backend for T {}
