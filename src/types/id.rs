// ABOUTME: Phantom-typed identifiers for images, pod sandboxes, and containers.
// ABOUTME: Prevents passing one resource kind's ID where another is expected.

use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Marker types for the phantom parameter.
/// Empty enums cannot be instantiated and need no trait bounds.
pub enum ImageMarker {}
pub enum PodMarker {}
pub enum ContainerMarker {}

/// A type-safe identifier wrapping the opaque string a backend hands out.
///
/// A `PodId` cannot be passed where a `ContainerId` is expected; mixing
/// resource kinds is a compile error instead of a runtime surprise.
#[must_use = "IDs reference backend resources and should not be ignored"]
pub struct Id<T> {
    value: String,
    _marker: PhantomData<T>,
}

impl<T> Id<T> {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _marker: PhantomData,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_inner(self) -> String {
        self.value
    }
}

// Manual trait implementations: T is only a marker, so derives would put
// unwanted bounds on it.

impl<T> std::fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Id").field("value", &self.value).finish()
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> std::fmt::Display for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

pub type ImageId = Id<ImageMarker>;
pub type PodId = Id<PodMarker>;
pub type ContainerId = Id<ContainerMarker>;
