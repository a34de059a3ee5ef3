// ABOUTME: Deterministic in-memory backend implementing the capability traits.
// ABOUTME: Backs the harness's own tests and the `cricheck selfcheck` command.

use crate::runtime::traits::sealed::Sealed;
use crate::runtime::traits::{
    ContainerConfig, ContainerState, ContainerStatus, Image, ImageError, ImageFilter, ImageOps,
    PodOps, PodSandboxConfig, RuntimeError,
};
use crate::types::{ContainerId, ImageId, ImageRef, PodId};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

/// A catalog entry: one pullable reference and the image it resolves to.
///
/// Several entries may share an `id`/`digest` pair, modeling multiple tags of
/// the same underlying image.
#[derive(Debug, Clone)]
pub struct FakeImage {
    /// The reference exactly as a fixture pulls it.
    pub reference: String,
    /// Content-addressed image ID.
    pub id: String,
    /// Manifest digest (`sha256:...`).
    pub digest: String,
    /// Unpacked size in bytes.
    pub size: u64,
    /// Default image user UID, when numeric.
    pub uid: Option<i64>,
    /// Default image user name, when non-numeric.
    pub username: String,
}

#[derive(Debug, Clone)]
struct StoredImage {
    id: String,
    repo_tags: Vec<String>,
    repo_digests: Vec<String>,
    size: u64,
    uid: Option<i64>,
    username: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PodState {
    Ready,
    Stopped,
}

#[derive(Debug)]
struct Pod {
    state: PodState,
}

#[derive(Debug)]
struct Container {
    pod: String,
    image: String,
    state: ContainerState,
    exit_code: i32,
    /// Status polls remaining before a running container flips to Exited.
    polls_left: u32,
}

#[derive(Default)]
struct Inner {
    catalog: HashMap<String, FakeImage>,
    store: HashMap<String, StoredImage>,
    pull_order: Vec<String>,
    pods: HashMap<String, Pod>,
    containers: HashMap<String, Container>,
    pod_seq: u64,
    container_seq: u64,
    fail_pulls: HashSet<String>,
    hang_images: HashSet<String>,
    panic_status_images: HashSet<String>,
    exit_codes: HashMap<String, i32>,
    polls_until_exit: u32,
}

/// In-memory backend with a scripted image catalog.
///
/// Containers "run" by counting status polls: a running container reports
/// Running for a configurable number of `container_status` calls and then
/// Exited, which lets poll-loop behavior be exercised under paused tokio
/// time. Failure injection covers pulls, exit codes, and containers that
/// never terminate.
pub struct FakeBackend {
    inner: Mutex<Inner>,
}

impl Sealed for FakeBackend {}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                polls_until_exit: 2,
                ..Default::default()
            }),
        }
    }

    /// Build a backend whose registry serves the given catalog.
    pub fn with_catalog(catalog: impl IntoIterator<Item = FakeImage>) -> Self {
        let backend = Self::new();
        for entry in catalog {
            backend.register(entry);
        }
        backend
    }

    /// Add one pullable reference to the registry catalog.
    pub fn register(&self, entry: FakeImage) {
        self.inner
            .lock()
            .catalog
            .insert(entry.reference.clone(), entry);
    }

    /// Make future pulls of `reference` fail.
    pub fn fail_pulls_of(&self, reference: &str) {
        self.inner.lock().fail_pulls.insert(reference.to_string());
    }

    /// Containers created from `reference` never leave the Running state.
    pub fn hang_containers_of(&self, reference: &str) {
        self.inner.lock().hang_images.insert(reference.to_string());
    }

    /// Status polls for containers created from `reference` panic, for
    /// exercising the orchestrator's failure isolation.
    pub fn panic_on_status_of(&self, reference: &str) {
        self.inner
            .lock()
            .panic_status_images
            .insert(reference.to_string());
    }

    /// Containers created from `reference` exit with `code`.
    pub fn exit_code_for(&self, reference: &str, code: i32) {
        self.inner
            .lock()
            .exit_codes
            .insert(reference.to_string(), code);
    }

    /// How many status polls a running container reports Running for.
    pub fn set_polls_until_exit(&self, polls: u32) {
        self.inner.lock().polls_until_exit = polls;
    }

    /// Number of sandboxes that have been created but not removed.
    pub fn live_sandboxes(&self) -> usize {
        self.inner.lock().pods.len()
    }

    /// Number of containers that have been created but not swept away with
    /// their sandbox.
    pub fn live_containers(&self) -> usize {
        self.inner.lock().containers.len()
    }

    /// Number of images currently present in the store.
    pub fn stored_images(&self) -> usize {
        self.inner.lock().store.len()
    }
}

impl Inner {
    /// Resolve a reference against the store: by ID, then digest, then tag.
    fn resolve(&self, reference: &ImageRef) -> Option<&StoredImage> {
        if let Some(stored) = self.store.get(reference.as_str()) {
            return Some(stored);
        }
        if let Some(digest) = reference.qualified_digest() {
            if let Some(stored) = self
                .store
                .values()
                .find(|s| s.repo_digests.iter().any(|d| *d == digest))
            {
                return Some(stored);
            }
        }
        if let Some(tag) = reference.qualified_tag() {
            if let Some(stored) = self
                .store
                .values()
                .find(|s| s.repo_tags.iter().any(|t| *t == tag))
            {
                return Some(stored);
            }
        }
        None
    }

    fn record(&self, stored: &StoredImage) -> Image {
        Image {
            id: ImageId::new(stored.id.clone()),
            repo_tags: stored.repo_tags.clone(),
            repo_digests: stored.repo_digests.clone(),
            size: stored.size,
            uid: stored.uid,
            username: stored.username.clone(),
        }
    }
}

#[async_trait]
impl ImageOps for FakeBackend {
    async fn pull_image(
        &self,
        reference: &ImageRef,
        _sandbox: Option<&PodSandboxConfig>,
    ) -> Result<ImageId, ImageError> {
        let mut inner = self.inner.lock();

        if inner.fail_pulls.contains(reference.as_str()) {
            return Err(ImageError::PullFailed(format!(
                "{}: injected pull failure",
                reference
            )));
        }

        let entry = inner
            .catalog
            .get(reference.as_str())
            .cloned()
            .ok_or_else(|| ImageError::NotFound(reference.to_string()))?;

        let repo_digest = format!("{}@{}", reference.repo(), entry.digest);
        let repo_tag = reference.qualified_tag();

        if !inner.store.contains_key(&entry.id) {
            inner.store.insert(
                entry.id.clone(),
                StoredImage {
                    id: entry.id.clone(),
                    repo_tags: Vec::new(),
                    repo_digests: Vec::new(),
                    size: entry.size,
                    uid: entry.uid,
                    username: entry.username.clone(),
                },
            );
            inner.pull_order.push(entry.id.clone());
        }

        let stored = inner
            .store
            .get_mut(&entry.id)
            .ok_or_else(|| ImageError::Backend("store entry vanished".to_string()))?;
        if let Some(tag) = repo_tag {
            if !stored.repo_tags.contains(&tag) {
                stored.repo_tags.push(tag);
            }
        }
        if !stored.repo_digests.contains(&repo_digest) {
            stored.repo_digests.push(repo_digest);
        }

        Ok(ImageId::new(entry.id))
    }

    async fn image_status(&self, reference: &ImageRef) -> Result<Option<Image>, ImageError> {
        let inner = self.inner.lock();
        Ok(inner.resolve(reference).map(|stored| inner.record(stored)))
    }

    async fn remove_image(&self, reference: &ImageRef) -> Result<(), ImageError> {
        let mut inner = self.inner.lock();
        let Some(id) = inner.resolve(reference).map(|s| s.id.clone()) else {
            // already absent, and removal is idempotent
            return Ok(());
        };
        inner.store.remove(&id);
        inner.pull_order.retain(|stored| *stored != id);
        Ok(())
    }

    async fn list_images(&self, filter: &ImageFilter) -> Result<Vec<Image>, ImageError> {
        let inner = self.inner.lock();

        let only = match &filter.reference {
            Some(reference) => match inner.resolve(reference) {
                Some(stored) => Some(stored.id.clone()),
                None => return Ok(Vec::new()),
            },
            None => None,
        };

        Ok(inner
            .pull_order
            .iter()
            .filter(|id| only.as_ref().is_none_or(|o| o == *id))
            .filter_map(|id| inner.store.get(id))
            .map(|stored| inner.record(stored))
            .collect())
    }
}

#[async_trait]
impl PodOps for FakeBackend {
    async fn run_pod_sandbox(&self, _config: &PodSandboxConfig) -> Result<PodId, RuntimeError> {
        let mut inner = self.inner.lock();
        inner.pod_seq += 1;
        let id = format!("pod-{}", inner.pod_seq);
        inner.pods.insert(
            id.clone(),
            Pod {
                state: PodState::Ready,
            },
        );
        Ok(PodId::new(id))
    }

    async fn stop_pod_sandbox(&self, id: &PodId) -> Result<(), RuntimeError> {
        let mut inner = self.inner.lock();
        let pod = inner
            .pods
            .get_mut(id.as_str())
            .ok_or_else(|| RuntimeError::SandboxNotFound(id.to_string()))?;
        pod.state = PodState::Stopped;
        Ok(())
    }

    async fn remove_pod_sandbox(&self, id: &PodId) -> Result<(), RuntimeError> {
        let mut inner = self.inner.lock();
        let pod = inner
            .pods
            .get(id.as_str())
            .ok_or_else(|| RuntimeError::SandboxNotFound(id.to_string()))?;
        if pod.state != PodState::Stopped {
            return Err(RuntimeError::InvalidState(format!(
                "sandbox {} is not stopped",
                id
            )));
        }
        inner.pods.remove(id.as_str());
        inner.containers.retain(|_, c| c.pod != id.as_str());
        Ok(())
    }

    async fn create_container(
        &self,
        pod: &PodId,
        config: &ContainerConfig,
    ) -> Result<ContainerId, RuntimeError> {
        let mut inner = self.inner.lock();

        let pod_entry = inner
            .pods
            .get(pod.as_str())
            .ok_or_else(|| RuntimeError::SandboxNotFound(pod.to_string()))?;
        if pod_entry.state != PodState::Ready {
            return Err(RuntimeError::InvalidState(format!(
                "sandbox {} is not ready",
                pod
            )));
        }
        if inner.resolve(&config.image).is_none() {
            return Err(RuntimeError::ImageNotFound(config.image.to_string()));
        }

        let polls_left = if inner.hang_images.contains(config.image.as_str()) {
            u32::MAX
        } else {
            inner.polls_until_exit
        };
        let exit_code = inner
            .exit_codes
            .get(config.image.as_str())
            .copied()
            .unwrap_or(0);

        inner.container_seq += 1;
        let id = format!("ctr-{}", inner.container_seq);
        inner.containers.insert(
            id.clone(),
            Container {
                pod: pod.as_str().to_string(),
                image: config.image.as_str().to_string(),
                state: ContainerState::Created,
                exit_code,
                polls_left,
            },
        );
        Ok(ContainerId::new(id))
    }

    async fn start_container(&self, id: &ContainerId) -> Result<(), RuntimeError> {
        let mut inner = self.inner.lock();
        let container = inner
            .containers
            .get_mut(id.as_str())
            .ok_or_else(|| RuntimeError::ContainerNotFound(id.to_string()))?;
        if container.state != ContainerState::Created {
            return Err(RuntimeError::InvalidState(format!(
                "container {} is not in the created state",
                id
            )));
        }
        container.state = ContainerState::Running;
        Ok(())
    }

    async fn container_status(&self, id: &ContainerId) -> Result<ContainerStatus, RuntimeError> {
        let mut inner = self.inner.lock();

        let image = inner
            .containers
            .get(id.as_str())
            .map(|c| c.image.clone())
            .ok_or_else(|| RuntimeError::ContainerNotFound(id.to_string()))?;
        if inner.panic_status_images.contains(&image) {
            drop(inner);
            panic!("injected status panic for {image}");
        }

        let container = inner
            .containers
            .get_mut(id.as_str())
            .ok_or_else(|| RuntimeError::ContainerNotFound(id.to_string()))?;

        if container.state == ContainerState::Running {
            if container.polls_left == 0 {
                container.state = ContainerState::Exited;
            } else if container.polls_left != u32::MAX {
                container.polls_left -= 1;
            }
        }

        Ok(ContainerStatus {
            state: container.state,
            exit_code: if container.state == ContainerState::Exited {
                container.exit_code
            } else {
                0
            },
        })
    }
}
