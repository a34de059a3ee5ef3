// ABOUTME: Concurrent stability orchestrator: one pipeline per image.
// ABOUTME: Pull, sandbox, run to exit, tear down; failures stay isolated.

use crate::runtime::{
    Backend, ContainerConfig, ContainerState, PodOps, PodSandboxConfig, RuntimeError,
};
use crate::suite::wait::{PollError, PollState, poll_until};
use crate::types::{ImageRef, PodId};
use futures::FutureExt;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

/// Where in its lifecycle a pipeline currently is, and therefore where it
/// failed if it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelinePhase {
    SandboxCreating,
    ImagePulling,
    ContainerCreating,
    ContainerStarting,
    AwaitingExit,
    TearingDown,
}

impl fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PipelinePhase::SandboxCreating => "creating sandbox",
            PipelinePhase::ImagePulling => "pulling image",
            PipelinePhase::ContainerCreating => "creating container",
            PipelinePhase::ContainerStarting => "starting container",
            PipelinePhase::AwaitingExit => "awaiting container exit",
            PipelinePhase::TearingDown => "tearing down",
        };
        f.write_str(label)
    }
}

/// One pipeline's failure: which image, at which phase, and why.
#[derive(Debug)]
pub struct PipelineFailure {
    pub image: String,
    pub phase: PipelinePhase,
    pub detail: String,
}

impl fmt::Display for PipelineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} while {}: {}", self.image, self.phase, self.detail)
    }
}

/// Aggregate over all pipelines of one stress invocation.
#[derive(Debug, Default)]
pub struct StressOutcome {
    /// Pipelines that ran to a clean container exit.
    pub completed: usize,
    /// Every failure observed, not just the first.
    pub failures: Vec<PipelineFailure>,
}

impl StressOutcome {
    /// The stress scenario passes only if every pipeline completed.
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn summary(&self) -> String {
        if self.passed() {
            return format!("{} pipelines completed", self.completed);
        }
        let details: Vec<String> = self.failures.iter().map(PipelineFailure::to_string).collect();
        format!(
            "{} of {} pipelines failed: {}",
            self.failures.len(),
            self.completed + self.failures.len(),
            details.join("; ")
        )
    }
}

/// Polling discipline for the exit wait of each pipeline.
#[derive(Debug, Clone)]
pub struct StressSettings {
    /// Fixed interval between container status polls.
    pub poll_interval: Duration,
    /// Hard deadline for a container to reach the exited state.
    pub poll_deadline: Duration,
}

impl Default for StressSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(4),
            poll_deadline: Duration::from_secs(120),
        }
    }
}

/// Run one independent pull → sandbox → run → observe-exit → teardown
/// pipeline per image, all concurrently against the shared backend.
///
/// Pipelines share no mutable state; the [`JoinSet`] drain loop is the join
/// barrier and always returns, whatever individual pipelines do. A panic
/// inside a pipeline is caught at its own boundary, reported as that
/// pipeline's failure, and never disturbs its siblings — which also means
/// each pipeline's sandbox teardown runs on every exit path.
pub async fn run_stress<B>(
    backend: Arc<B>,
    images: &[ImageRef],
    settings: &StressSettings,
) -> StressOutcome
where
    B: Backend + 'static,
{
    // Leftovers from earlier runs may or may not exist; removal errors in
    // this sweep are deliberately ignored.
    for image in images {
        if let Err(e) = backend.remove_image(image).await {
            tracing::debug!(image = %image, error = %e, "pre-run removal skipped");
        }
    }

    let mut tasks: JoinSet<Result<(), PipelineFailure>> = JoinSet::new();
    for image in images {
        let backend = Arc::clone(&backend);
        let image = image.clone();
        let settings = settings.clone();
        tasks.spawn(async move { run_pipeline(backend.as_ref(), &image, &settings).await });
    }

    let mut outcome = StressOutcome::default();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(())) => outcome.completed += 1,
            Ok(Err(failure)) => {
                tracing::warn!(image = %failure.image, phase = %failure.phase, detail = %failure.detail, "pipeline failed");
                outcome.failures.push(failure);
            }
            // Unreachable while pipelines catch their own panics, but a
            // cancelled or aborted task must still be accounted for.
            Err(join_err) => outcome.failures.push(PipelineFailure {
                image: "<unknown>".to_string(),
                phase: PipelinePhase::AwaitingExit,
                detail: format!("pipeline task died: {join_err}"),
            }),
        }
    }

    // Every image gets removed whatever its pipeline did; absence is fine,
    // a refusal is backend inconsistency and counts as a failure.
    for image in images {
        if let Err(e) = backend.remove_image(image).await {
            outcome.failures.push(PipelineFailure {
                image: image.to_string(),
                phase: PipelinePhase::TearingDown,
                detail: e.to_string(),
            });
        }
    }

    outcome
}

/// One pipeline: acquire a sandbox, run the body behind a panic boundary,
/// and tear the sandbox down on every exit path.
async fn run_pipeline<B>(
    backend: &B,
    image: &ImageRef,
    settings: &StressSettings,
) -> Result<(), PipelineFailure>
where
    B: Backend,
{
    let fail = |phase: PipelinePhase, detail: String| PipelineFailure {
        image: image.to_string(),
        phase,
        detail,
    };

    let sandbox_config = PodSandboxConfig::new(sanitize_name(image.as_str()));
    let pod = backend
        .run_pod_sandbox(&sandbox_config)
        .await
        .map_err(|e| fail(PipelinePhase::SandboxCreating, e.to_string()))?;

    let phase = Mutex::new(PipelinePhase::ImagePulling);
    let body = AssertUnwindSafe(pipeline_body(
        backend,
        image,
        &sandbox_config,
        &pod,
        &phase,
        settings,
    ))
    .catch_unwind()
    .await;

    let teardown = teardown_sandbox(backend, &pod).await;

    let primary = match body {
        Ok(result) => result,
        Err(panic) => Err(fail(
            *phase.lock(),
            format!("panicked: {}", panic_detail(panic.as_ref())),
        )),
    };

    match (primary, teardown) {
        (Err(failure), _) => Err(failure),
        (Ok(()), Err(detail)) => Err(fail(PipelinePhase::TearingDown, detail)),
        (Ok(()), Ok(())) => Ok(()),
    }
}

async fn pipeline_body<B>(
    backend: &B,
    image: &ImageRef,
    sandbox_config: &PodSandboxConfig,
    pod: &PodId,
    phase: &Mutex<PipelinePhase>,
    settings: &StressSettings,
) -> Result<(), PipelineFailure>
where
    B: Backend,
{
    let fail = |phase: PipelinePhase, detail: String| PipelineFailure {
        image: image.to_string(),
        phase,
        detail,
    };

    *phase.lock() = PipelinePhase::ImagePulling;
    backend
        .pull_image(image, Some(sandbox_config))
        .await
        .map_err(|e| fail(PipelinePhase::ImagePulling, e.to_string()))?;

    *phase.lock() = PipelinePhase::ContainerCreating;
    let container_config = ContainerConfig {
        name: sandbox_config.name.clone(),
        attempt: 0,
        image: image.clone(),
        // trivial, fast, deterministically terminating
        command: vec!["ls".to_string(), "/".to_string()],
        labels: HashMap::new(),
    };
    let container = backend
        .create_container(pod, &container_config)
        .await
        .map_err(|e| fail(PipelinePhase::ContainerCreating, e.to_string()))?;

    *phase.lock() = PipelinePhase::ContainerStarting;
    backend
        .start_container(&container)
        .await
        .map_err(|e| fail(PipelinePhase::ContainerStarting, e.to_string()))?;

    *phase.lock() = PipelinePhase::AwaitingExit;
    let status = poll_until(settings.poll_interval, settings.poll_deadline, || async {
        let status = backend.container_status(&container).await?;
        Ok::<_, RuntimeError>(match status.state {
            ContainerState::Exited => PollState::Done(status),
            other => PollState::Pending(format!("{other:?}")),
        })
    })
    .await
    .map_err(|e| match e {
        PollError::Op(err) => fail(PipelinePhase::AwaitingExit, err.to_string()),
        PollError::Timeout { waited, last } => fail(
            PipelinePhase::AwaitingExit,
            format!("not exited after {waited:?}, last state {last}"),
        ),
    })?;

    if status.exit_code != 0 {
        return Err(fail(
            PipelinePhase::AwaitingExit,
            format!("container exited with code {}", status.exit_code),
        ));
    }
    Ok(())
}

/// Stop, then remove, the pipeline's sandbox. Both steps are attempted;
/// the first error is reported.
async fn teardown_sandbox<B>(backend: &B, pod: &PodId) -> Result<(), String>
where
    B: PodOps + ?Sized,
{
    let mut first_error = None;

    if let Err(e) = backend.stop_pod_sandbox(pod).await {
        tracing::warn!(pod = %pod, error = %e, "stopping sandbox failed");
        first_error.get_or_insert(format!("stop sandbox {pod}: {e}"));
    }
    if let Err(e) = backend.remove_pod_sandbox(pod).await {
        tracing::warn!(pod = %pod, error = %e, "removing sandbox failed");
        first_error.get_or_insert(format!("remove sandbox {pod}: {e}"));
    }

    match first_error {
        Some(detail) => Err(detail),
        None => Ok(()),
    }
}

fn panic_detail(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "opaque panic payload".to_string()
    }
}

/// Derive a sandbox/container-safe name from an image reference.
fn sanitize_name(reference: &str) -> String {
    reference
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::sanitize_name;

    #[test]
    fn sanitized_names_contain_only_safe_characters() {
        assert_eq!(sanitize_name("rocket.chat"), "rocket-chat");
        assert_eq!(sanitize_name("busybox:1.36"), "busybox-1-36");
        assert_eq!(
            sanitize_name("gcr.io/cri-tools/test"),
            "gcr-io-cri-tools-test"
        );
    }
}
