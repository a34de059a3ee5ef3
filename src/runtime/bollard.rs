// ABOUTME: Bollard-based backend implementation for Docker-compatible engines.
// ABOUTME: Realizes pod sandboxes as labeled pause containers.

use crate::runtime::error::{ConnectError, PingSnafu, SocketSnafu};
use crate::runtime::traits::sealed::Sealed;
use crate::runtime::traits::{
    ContainerConfig, ContainerState, ContainerStatus, Image, ImageError, ImageFilter, ImageOps,
    PodOps, PodSandboxConfig, RuntimeError,
};
use crate::types::{ContainerId, ImageId, ImageRef, PodId};
use async_trait::async_trait;
use bollard::Docker;
use bollard::models::{ContainerCreateBody, HostConfig};
use bollard::query_parameters::{
    CreateContainerOptions, CreateImageOptions, InspectContainerOptions, ListContainersOptions,
    ListImagesOptions, RemoveContainerOptions, RemoveImageOptions, StopContainerOptions,
};
use futures::StreamExt;
use snafu::ResultExt;
use std::collections::HashMap;

/// Label marking every container this harness creates.
const LABEL_KIND: &str = "cricheck.kind";
/// Label tying a member container to its sandbox container's ID.
const LABEL_POD: &str = "cricheck.pod";

const KIND_SANDBOX: &str = "sandbox";
const KIND_CONTAINER: &str = "container";

/// Pause image used to realize sandboxes; its entrypoint blocks forever.
pub const DEFAULT_SANDBOX_IMAGE: &str = "registry.k8s.io/pause:3.10";

// =============================================================================
// Error Mapping Helpers
// =============================================================================

fn map_image_pull_error(e: bollard::errors::Error, image_name: &str) -> ImageError {
    ImageError::PullFailed(format!("{}: {}", image_name, e))
}

fn map_image_remove_error(e: bollard::errors::Error, image_name: &str) -> Option<ImageError> {
    match &e {
        // 404: already absent, and removal is idempotent
        bollard::errors::Error::DockerResponseServerError { status_code, .. }
            if *status_code == 404 =>
        {
            None
        }
        bollard::errors::Error::DockerResponseServerError { status_code, .. }
            if *status_code == 409 =>
        {
            Some(ImageError::InUse(image_name.to_string()))
        }
        _ => Some(ImageError::Backend(format!(
            "failed to remove {}: {}",
            image_name, e
        ))),
    }
}

fn map_sandbox_error(e: bollard::errors::Error, id: &str) -> RuntimeError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code: 404, ..
        } => RuntimeError::SandboxNotFound(id.to_string()),
        _ => RuntimeError::Backend(e.to_string()),
    }
}

fn map_container_create_error(e: bollard::errors::Error) -> RuntimeError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code: 404,
            message,
        } => RuntimeError::ImageNotFound(message.clone()),
        bollard::errors::Error::DockerResponseServerError {
            status_code: 409,
            message,
        } => RuntimeError::InvalidState(message.clone()),
        _ => RuntimeError::Backend(e.to_string()),
    }
}

fn map_container_error(e: bollard::errors::Error, id: &str) -> RuntimeError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code: 404, ..
        } => RuntimeError::ContainerNotFound(id.to_string()),
        bollard::errors::Error::DockerResponseServerError {
            status_code: 304,
            message,
        } => RuntimeError::InvalidState(message.clone()),
        _ => RuntimeError::Backend(e.to_string()),
    }
}

/// Split an image `User` field into the UID / username pair an image service
/// reports. `1002`, `www-data`, and their `:group` suffixed forms all occur.
fn parse_image_user(user: &str) -> (Option<i64>, String) {
    let account = user.split(':').next().unwrap_or_default().trim();
    if account.is_empty() {
        return (None, String::new());
    }
    match account.parse::<i64>() {
        Ok(uid) => (Some(uid), String::new()),
        Err(_) => (None, account.to_string()),
    }
}

// =============================================================================
// BollardBackend
// =============================================================================

/// Backend adapter speaking the Docker-compatible engine API via bollard.
///
/// The capability surface is expressed in pod sandboxes, which plain Docker
/// does not have. A sandbox is realized as a long-running pause container
/// carrying a `cricheck.kind=sandbox` label; member containers join its
/// network namespace and are labeled back to it, so sandbox removal can
/// sweep everything the sandbox hosts.
pub struct BollardBackend {
    client: Docker,
    sandbox_image: String,
}

impl Sealed for BollardBackend {}

impl BollardBackend {
    /// Connect to a Docker-compatible engine over a unix socket and verify
    /// it answers a ping.
    pub async fn connect(socket_path: &str) -> Result<Self, ConnectError> {
        let client = Docker::connect_with_unix(socket_path, 120, bollard::API_DEFAULT_VERSION)
            .context(SocketSnafu { path: socket_path })?;
        client.ping().await.context(PingSnafu { path: socket_path })?;

        Ok(Self {
            client,
            sandbox_image: DEFAULT_SANDBOX_IMAGE.to_string(),
        })
    }

    /// Override the pause image used to realize sandboxes.
    pub fn with_sandbox_image(mut self, image: impl Into<String>) -> Self {
        self.sandbox_image = image.into();
        self
    }

    async fn ensure_sandbox_image(&self) -> Result<(), RuntimeError> {
        match self.client.inspect_image(&self.sandbox_image).await {
            Ok(_) => return Ok(()),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => {}
            Err(e) => return Err(RuntimeError::Backend(e.to_string())),
        }

        let opts = CreateImageOptions {
            from_image: Some(self.sandbox_image.clone()),
            ..Default::default()
        };
        let mut stream = self.client.create_image(Some(opts), None, None);
        while let Some(progress) = stream.next().await {
            progress.map_err(|e| {
                RuntimeError::Backend(format!("pull {}: {}", self.sandbox_image, e))
            })?;
        }
        Ok(())
    }

    /// IDs of member containers labeled back to the given sandbox.
    async fn member_containers(&self, pod: &PodId) -> Result<Vec<String>, RuntimeError> {
        let mut filter_map: HashMap<String, Vec<String>> = HashMap::new();
        filter_map.insert(
            "label".to_string(),
            vec![format!("{}={}", LABEL_POD, pod.as_str())],
        );

        let opts = ListContainersOptions {
            all: true,
            filters: Some(filter_map),
            ..Default::default()
        };

        let containers = self
            .client
            .list_containers(Some(opts))
            .await
            .map_err(|e| RuntimeError::Backend(e.to_string()))?;

        Ok(containers.into_iter().filter_map(|c| c.id).collect())
    }
}

#[async_trait]
impl ImageOps for BollardBackend {
    async fn pull_image(
        &self,
        reference: &ImageRef,
        _sandbox: Option<&PodSandboxConfig>,
    ) -> Result<ImageId, ImageError> {
        let image_name = reference.to_string();
        tracing::debug!(image = %image_name, "pulling image");

        let opts = CreateImageOptions {
            from_image: Some(image_name.clone()),
            ..Default::default()
        };

        // Pull returns a stream of progress updates - consume it
        let mut stream = self.client.create_image(Some(opts), None, None);
        while let Some(progress) = stream.next().await {
            progress.map_err(|e| map_image_pull_error(e, &image_name))?;
        }

        let inspect = self
            .client
            .inspect_image(&image_name)
            .await
            .map_err(|e| ImageError::PullFailed(format!("{}: {}", image_name, e)))?;
        let id = inspect
            .id
            .ok_or_else(|| ImageError::Backend(format!("{}: pulled image has no ID", image_name)))?;

        Ok(ImageId::new(id))
    }

    async fn image_status(&self, reference: &ImageRef) -> Result<Option<Image>, ImageError> {
        let image_name = reference.to_string();

        let inspect = match self.client.inspect_image(&image_name).await {
            Ok(inspect) => inspect,
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => return Ok(None),
            Err(e) => {
                return Err(ImageError::Backend(format!(
                    "failed to inspect {}: {}",
                    image_name, e
                )));
            }
        };

        let (uid, username) = inspect
            .config
            .as_ref()
            .and_then(|c| c.user.as_deref())
            .map(parse_image_user)
            .unwrap_or((None, String::new()));

        Ok(Some(Image {
            id: ImageId::new(inspect.id.unwrap_or_default()),
            repo_tags: inspect.repo_tags.unwrap_or_default(),
            repo_digests: inspect.repo_digests.unwrap_or_default(),
            size: inspect.size.unwrap_or_default().max(0) as u64,
            uid,
            username,
        }))
    }

    async fn remove_image(&self, reference: &ImageRef) -> Result<(), ImageError> {
        let image_name = reference.to_string();

        let opts = RemoveImageOptions::default();

        match self.client.remove_image(&image_name, Some(opts), None).await {
            Ok(_) => Ok(()),
            Err(e) => match map_image_remove_error(e, &image_name) {
                Some(err) => Err(err),
                None => Ok(()),
            },
        }
    }

    async fn list_images(&self, filter: &ImageFilter) -> Result<Vec<Image>, ImageError> {
        let mut filter_map: HashMap<String, Vec<String>> = HashMap::new();
        if let Some(reference) = &filter.reference {
            filter_map.insert("reference".to_string(), vec![reference.to_string()]);
        }

        let opts = ListImagesOptions {
            all: false,
            filters: Some(filter_map),
            ..Default::default()
        };

        let summaries = self
            .client
            .list_images(Some(opts))
            .await
            .map_err(|e| ImageError::Backend(e.to_string()))?;

        Ok(summaries
            .into_iter()
            .map(|s| Image {
                id: ImageId::new(s.id),
                repo_tags: s.repo_tags,
                repo_digests: s.repo_digests,
                size: s.size.max(0) as u64,
                uid: None,
                username: String::new(),
            })
            .collect())
    }
}

#[async_trait]
impl PodOps for BollardBackend {
    async fn run_pod_sandbox(&self, config: &PodSandboxConfig) -> Result<PodId, RuntimeError> {
        self.ensure_sandbox_image().await?;

        let mut labels = config.labels.clone();
        labels.insert(LABEL_KIND.to_string(), KIND_SANDBOX.to_string());
        labels.insert("cricheck.pod-name".to_string(), config.name.clone());
        labels.insert("cricheck.pod-uid".to_string(), config.uid.clone());
        labels.insert("cricheck.namespace".to_string(), config.namespace.clone());

        let body = ContainerCreateBody {
            image: Some(self.sandbox_image.clone()),
            labels: Some(labels),
            ..Default::default()
        };

        let opts = CreateContainerOptions {
            name: Some(format!("cricheck-sandbox-{}-{}", config.name, config.attempt)),
            ..Default::default()
        };

        let response = self
            .client
            .create_container(Some(opts), body)
            .await
            .map_err(map_container_create_error)?;

        self.client
            .start_container(
                &response.id,
                None::<bollard::query_parameters::StartContainerOptions>,
            )
            .await
            .map_err(|e| map_sandbox_error(e, &response.id))?;

        Ok(PodId::new(response.id))
    }

    async fn stop_pod_sandbox(&self, id: &PodId) -> Result<(), RuntimeError> {
        let opts = StopContainerOptions {
            t: Some(2),
            signal: None,
        };

        match self.client.stop_container(id.as_str(), Some(opts)).await {
            Ok(()) => Ok(()),
            // 304: already stopped, which stop treats as success
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 304, ..
            }) => Ok(()),
            Err(e) => Err(map_sandbox_error(e, id.as_str())),
        }
    }

    async fn remove_pod_sandbox(&self, id: &PodId) -> Result<(), RuntimeError> {
        let opts = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };

        // Member containers first, so nothing keeps the namespace alive.
        for member in self.member_containers(id).await? {
            self.client
                .remove_container(&member, Some(opts.clone()))
                .await
                .map_err(|e| map_container_error(e, &member))?;
        }

        self.client
            .remove_container(id.as_str(), Some(opts))
            .await
            .map_err(|e| map_sandbox_error(e, id.as_str()))?;

        Ok(())
    }

    async fn create_container(
        &self,
        pod: &PodId,
        config: &ContainerConfig,
    ) -> Result<ContainerId, RuntimeError> {
        let mut labels = config.labels.clone();
        labels.insert(LABEL_KIND.to_string(), KIND_CONTAINER.to_string());
        labels.insert(LABEL_POD.to_string(), pod.as_str().to_string());

        let host_config = HostConfig {
            network_mode: Some(format!("container:{}", pod.as_str())),
            ..Default::default()
        };

        let body = ContainerCreateBody {
            image: Some(config.image.to_string()),
            cmd: if config.command.is_empty() {
                None
            } else {
                Some(config.command.clone())
            },
            labels: Some(labels),
            host_config: Some(host_config),
            ..Default::default()
        };

        let opts = CreateContainerOptions {
            name: Some(format!("cricheck-{}-{}", config.name, config.attempt)),
            ..Default::default()
        };

        let response = self
            .client
            .create_container(Some(opts), body)
            .await
            .map_err(map_container_create_error)?;

        Ok(ContainerId::new(response.id))
    }

    async fn start_container(&self, id: &ContainerId) -> Result<(), RuntimeError> {
        self.client
            .start_container(
                id.as_str(),
                None::<bollard::query_parameters::StartContainerOptions>,
            )
            .await
            .map_err(|e| map_container_error(e, id.as_str()))
    }

    async fn container_status(&self, id: &ContainerId) -> Result<ContainerStatus, RuntimeError> {
        let details = self
            .client
            .inspect_container(id.as_str(), None::<InspectContainerOptions>)
            .await
            .map_err(|e| map_container_error(e, id.as_str()))?;

        let state = details.state.as_ref();

        let mapped = state
            .and_then(|s| s.status)
            .map(|s| match s {
                bollard::models::ContainerStateStatusEnum::CREATED => ContainerState::Created,
                bollard::models::ContainerStateStatusEnum::RUNNING => ContainerState::Running,
                bollard::models::ContainerStateStatusEnum::EXITED => ContainerState::Exited,
                bollard::models::ContainerStateStatusEnum::DEAD => ContainerState::Exited,
                _ => ContainerState::Unknown,
            })
            .unwrap_or(ContainerState::Unknown);

        let exit_code = state.and_then(|s| s.exit_code).unwrap_or_default() as i32;

        Ok(ContainerStatus {
            state: mapped,
            exit_code,
        })
    }
}
