// ABOUTME: Shared types used across the backend capability traits.
// ABOUTME: Image record, sandbox and container configs, container status.

use crate::types::{ImageId, ImageRef};
use std::collections::HashMap;

/// An image record as reported by the backend's image service.
///
/// Equality is field-for-field; the resolver scenario relies on two status
/// lookups for the same underlying image comparing equal in every field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    /// Content-addressed image ID.
    pub id: ImageId,
    /// Repo tags (`name:tag`) attached to this image, in backend order.
    pub repo_tags: Vec<String>,
    /// Repo digests (`name@sha256:...`) attached to this image.
    pub repo_digests: Vec<String>,
    /// Unpacked size in bytes.
    pub size: u64,
    /// UID of the default image user, when the image specifies a numeric user.
    pub uid: Option<i64>,
    /// Name of the default image user, empty when the image specifies a UID.
    pub username: String,
}

/// Filter for [`super::ImageOps::list_images`]. The default matches all images.
#[derive(Debug, Clone, Default)]
pub struct ImageFilter {
    /// Restrict the listing to a single reference.
    pub reference: Option<ImageRef>,
}

/// Configuration for a pod sandbox hosting pulled-image containers.
#[derive(Debug, Clone)]
pub struct PodSandboxConfig {
    /// Sandbox name, unique per concurrently live sandbox.
    pub name: String,
    /// Pod UID as assigned by the caller.
    pub uid: String,
    /// Namespace the sandbox claims to run in.
    pub namespace: String,
    /// Attempt counter for retried sandboxes.
    pub attempt: u32,
    /// Labels applied to the sandbox.
    pub labels: HashMap<String, String>,
}

impl PodSandboxConfig {
    /// Build a sandbox config with a name-derived UID and default namespace.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            uid: format!("uid-{name}"),
            namespace: "cricheck".to_string(),
            attempt: 0,
            labels: HashMap::new(),
            name,
        }
    }
}

/// Configuration for a container created inside a sandbox.
#[derive(Debug, Clone)]
pub struct ContainerConfig {
    /// Container name, unique within its sandbox.
    pub name: String,
    /// Attempt counter for retried containers.
    pub attempt: u32,
    /// Image the container runs.
    pub image: ImageRef,
    /// Command to run, overriding the image default.
    pub command: Vec<String>,
    /// Labels applied to the container.
    pub labels: HashMap<String, String>,
}

/// Container lifecycle state as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Created,
    Running,
    Exited,
    Unknown,
}

/// Snapshot of a container's state and exit code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerStatus {
    pub state: ContainerState,
    /// Exit code, meaningful only once `state` is [`ContainerState::Exited`].
    pub exit_code: i32,
}
