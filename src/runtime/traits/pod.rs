// ABOUTME: Sandbox and container lifecycle trait for the backend under test.
// ABOUTME: Run/stop/remove sandboxes, create/start/inspect containers.

use super::sealed::Sealed;
use super::shared_types::{ContainerConfig, ContainerStatus, PodSandboxConfig};
use crate::types::{ContainerId, PodId};
use async_trait::async_trait;

/// Sandbox and container lifecycle operations.
#[async_trait]
pub trait PodOps: Sealed + Send + Sync {
    /// Create and start a pod sandbox.
    async fn run_pod_sandbox(&self, config: &PodSandboxConfig) -> Result<PodId, RuntimeError>;

    /// Stop a running sandbox. Stopping an already stopped sandbox succeeds.
    async fn stop_pod_sandbox(&self, id: &PodId) -> Result<(), RuntimeError>;

    /// Remove a stopped sandbox and everything it hosts.
    async fn remove_pod_sandbox(&self, id: &PodId) -> Result<(), RuntimeError>;

    /// Create a container inside a sandbox.
    async fn create_container(
        &self,
        pod: &PodId,
        config: &ContainerConfig,
    ) -> Result<ContainerId, RuntimeError>;

    /// Start a created container.
    async fn start_container(&self, id: &ContainerId) -> Result<(), RuntimeError>;

    /// Report a container's current state and exit code.
    async fn container_status(&self, id: &ContainerId) -> Result<ContainerStatus, RuntimeError>;
}

/// Errors from sandbox and container lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("sandbox not found: {0}")]
    SandboxNotFound(String),

    #[error("container not found: {0}")]
    ContainerNotFound(String),

    #[error("image not found: {0}")]
    ImageNotFound(String),

    #[error("invalid lifecycle state: {0}")]
    InvalidState(String),

    #[error("backend error: {0}")]
    Backend(String),
}
