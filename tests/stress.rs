// ABOUTME: Integration tests for the concurrent stability orchestrator.
// ABOUTME: Liveness, failure isolation, and teardown on every exit path.

mod support;

use cricheck::fixtures;
use cricheck::runtime::ImageOps;
use cricheck::suite::{PipelinePhase, StressSettings, run_stress};
use std::sync::Arc;

fn stress_images() -> Vec<cricheck::types::ImageRef> {
    fixtures::selfcheck_stress_list()
}

#[tokio::test(start_paused = true)]
async fn all_pipelines_complete_cleanly() {
    support::init_tracing();
    let backend = support::preloaded_backend();
    let images = stress_images();

    let outcome = run_stress(Arc::clone(&backend), &images, &StressSettings::default()).await;

    assert!(outcome.passed(), "unexpected failures: {}", outcome.summary());
    assert_eq!(outcome.completed, images.len());
    assert_eq!(backend.live_sandboxes(), 0, "every sandbox must be torn down");
    assert_eq!(backend.live_containers(), 0);
    assert_eq!(backend.stored_images(), 0, "post-run sweep must remove images");
}

#[tokio::test(start_paused = true)]
async fn every_pipeline_is_accounted_for() {
    let backend = support::preloaded_backend();
    let images = stress_images();
    backend.fail_pulls_of("busybox:1.34");
    backend.exit_code_for("busybox:1.35", 2);

    let outcome = run_stress(Arc::clone(&backend), &images, &StressSettings::default()).await;

    // nothing silently dropped: completions plus failures cover the list
    assert_eq!(outcome.completed + outcome.failures.len(), images.len());
    assert_eq!(outcome.failures.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn pull_failure_is_isolated_to_its_pipeline() {
    let backend = support::preloaded_backend();
    let images = stress_images();
    backend.fail_pulls_of("busybox:1.35");

    let outcome = run_stress(Arc::clone(&backend), &images, &StressSettings::default()).await;

    assert_eq!(outcome.completed, images.len() - 1);
    assert_eq!(outcome.failures.len(), 1);
    let failure = &outcome.failures[0];
    assert_eq!(failure.image, "busybox:1.35");
    assert_eq!(failure.phase, PipelinePhase::ImagePulling);
    // the failing pipeline's sandbox is torn down like everyone else's
    assert_eq!(backend.live_sandboxes(), 0);
}

#[tokio::test(start_paused = true)]
async fn nonzero_exit_code_fails_the_pipeline() {
    let backend = support::preloaded_backend();
    let images = stress_images();
    backend.exit_code_for("busybox:1.34", 2);

    let outcome = run_stress(Arc::clone(&backend), &images, &StressSettings::default()).await;

    assert_eq!(outcome.failures.len(), 1);
    let failure = &outcome.failures[0];
    assert_eq!(failure.phase, PipelinePhase::AwaitingExit);
    assert!(
        failure.detail.contains("code 2"),
        "unexpected detail: {}",
        failure.detail
    );
}

#[tokio::test(start_paused = true)]
async fn hung_container_times_out_without_blocking_the_barrier() {
    let backend = support::preloaded_backend();
    let images = stress_images();
    backend.hang_containers_of("busybox:1.36");

    let outcome = run_stress(Arc::clone(&backend), &images, &StressSettings::default()).await;

    assert_eq!(outcome.completed, images.len() - 1);
    assert_eq!(outcome.failures.len(), 1);
    let failure = &outcome.failures[0];
    assert_eq!(failure.image, "busybox:1.36");
    assert_eq!(failure.phase, PipelinePhase::AwaitingExit);
    assert!(
        failure.detail.contains("not exited"),
        "unexpected detail: {}",
        failure.detail
    );
    assert_eq!(backend.live_sandboxes(), 0);
}

#[tokio::test(start_paused = true)]
async fn panicking_pipeline_is_contained_and_cleaned_up() {
    let backend = support::preloaded_backend();
    let images = stress_images();
    backend.panic_on_status_of("busybox:1.35");

    let outcome = run_stress(Arc::clone(&backend), &images, &StressSettings::default()).await;

    assert_eq!(outcome.completed, images.len() - 1);
    assert_eq!(outcome.failures.len(), 1);
    let failure = &outcome.failures[0];
    assert_eq!(failure.image, "busybox:1.35");
    assert_eq!(failure.phase, PipelinePhase::AwaitingExit);
    assert!(
        failure.detail.contains("panicked"),
        "unexpected detail: {}",
        failure.detail
    );
    // the panic must not leak the sandbox of the panicking pipeline
    assert_eq!(backend.live_sandboxes(), 0);
}

#[tokio::test(start_paused = true)]
async fn images_are_removed_even_after_failures() {
    let backend = support::preloaded_backend();
    let images = stress_images();
    backend.exit_code_for("busybox:1.36", 1);

    let outcome = run_stress(Arc::clone(&backend), &images, &StressSettings::default()).await;

    assert!(!outcome.passed());
    for image in &images {
        let status = backend.image_status(image).await.unwrap();
        assert!(status.is_none(), "{image} should be removed by the sweep");
    }
}

#[tokio::test(start_paused = true)]
async fn stress_tolerates_preexisting_images() {
    let backend = support::preloaded_backend();
    let images = stress_images();

    // simulate leftovers from an earlier, dirtier run
    backend.pull_image(&images[0], None).await.unwrap();
    backend.pull_image(&images[2], None).await.unwrap();

    let outcome = run_stress(Arc::clone(&backend), &images, &StressSettings::default()).await;
    assert!(outcome.passed(), "unexpected failures: {}", outcome.summary());
}
