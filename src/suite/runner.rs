// ABOUTME: Ordered execution of the conformance scenarios.
// ABOUTME: Scenarios report independently; one failure never stops the run.

use crate::fixtures;
use crate::output::Output;
use crate::runtime::Backend;
use crate::suite::error::{ScenarioError, check};
use crate::suite::report::{RunReport, ScenarioReport};
use crate::suite::{image_set, lifecycle, resolver, stress};
use crate::types::ImageRef;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Knobs for one suite invocation.
#[derive(Debug, Clone)]
pub struct SuiteSettings {
    /// Fixed interval between container status polls in the stress scenario.
    pub poll_interval: Duration,
    /// Hard deadline for a stress container to reach the exited state.
    pub poll_deadline: Duration,
    /// Images the stress scenario fans out over, one pipeline each.
    pub stress_images: Vec<ImageRef>,
}

impl Default for SuiteSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(4),
            poll_deadline: Duration::from_secs(120),
            stress_images: fixtures::stress_image_list(),
        }
    }
}

/// Run every conformance scenario in order and collect their outcomes.
pub async fn run_suite<B>(backend: Arc<B>, settings: &SuiteSettings, output: &Output) -> RunReport
where
    B: Backend + 'static,
{
    let mut report = RunReport::new();
    let sandbox = fixtures::suite_sandbox_config();

    record(
        &mut report,
        output,
        "public image with tag is pulled and removed",
        async {
            let image = fixtures::image_with_tag();
            let expected: Vec<String> = image.qualified_tag().into_iter().collect();
            lifecycle::pull_and_verify(backend.as_ref(), &image, Some(&sandbox), |record| {
                check(
                    record.repo_tags == expected,
                    format!("repo tags {:?} should equal {expected:?}", record.repo_tags),
                )
            })
            .await
        },
    )
    .await;

    record(
        &mut report,
        output,
        "public image without tag defaults to latest",
        async {
            let image = fixtures::image_without_tag();
            let expected: Vec<String> = image.qualified_tag().into_iter().collect();
            lifecycle::pull_and_verify(backend.as_ref(), &image, Some(&sandbox), |record| {
                check(
                    record.repo_tags == expected,
                    format!("repo tags {:?} should equal {expected:?}", record.repo_tags),
                )
            })
            .await
        },
    )
    .await;

    record(
        &mut report,
        output,
        "public image by digest is pulled and removed",
        async {
            let image = fixtures::image_with_digest();
            let expected: Vec<String> = image.qualified_digest().into_iter().collect();
            lifecycle::pull_and_verify(backend.as_ref(), &image, Some(&sandbox), |record| {
                check(
                    record.repo_tags.is_empty(),
                    format!("digest pull left repo tags {:?}", record.repo_tags),
                )?;
                check(
                    record.repo_digests == expected,
                    format!(
                        "repo digests {:?} should equal {expected:?}",
                        record.repo_digests
                    ),
                )
            })
            .await
        },
    )
    .await;

    record(
        &mut report,
        output,
        "image status resolves every reference form",
        async {
            let image = fixtures::image_with_tag();
            resolver::verify_reference_forms(backend.as_ref(), &image, Some(&sandbox)).await
        },
    )
    .await;

    record(
        &mut report,
        output,
        "image user metadata is populated",
        async {
            for fixture in fixtures::user_image_fixtures() {
                lifecycle::pull_and_verify(
                    backend.as_ref(),
                    &fixture.image,
                    Some(&sandbox),
                    |record| {
                        check(
                            record.uid == fixture.uid,
                            format!(
                                "{}: uid {:?} should be {:?}",
                                fixture.description, record.uid, fixture.uid
                            ),
                        )?;
                        check(
                            record.username == fixture.username,
                            format!(
                                "{}: username {:?} should be {:?}",
                                fixture.description, record.username, fixture.username
                            ),
                        )
                    },
                )
                .await?;
            }
            Ok(())
        },
    )
    .await;

    record(
        &mut report,
        output,
        "listing distinct images yields one tag each",
        async {
            let references = fixtures::distinct_tag_distinct_image_set();
            image_set::distinct_images_have_single_tags(
                backend.as_ref(),
                &references,
                Some(&sandbox),
            )
            .await
        },
    )
    .await;

    record(
        &mut report,
        output,
        "listing one image yields all its tags",
        async {
            let references = fixtures::distinct_tag_same_image_set();
            image_set::same_image_collects_all_tags(backend.as_ref(), &references, Some(&sandbox))
                .await
        },
    )
    .await;

    record(
        &mut report,
        output,
        "concurrent image pipelines are stable",
        async {
            let stress_settings = stress::StressSettings {
                poll_interval: settings.poll_interval,
                poll_deadline: settings.poll_deadline,
            };
            let outcome = stress::run_stress(
                Arc::clone(&backend),
                &settings.stress_images,
                &stress_settings,
            )
            .await;
            if outcome.passed() {
                Ok(())
            } else {
                Err(ScenarioError::Check(outcome.summary()))
            }
        },
    )
    .await;

    report
}

async fn record<F>(report: &mut RunReport, output: &Output, name: &str, scenario: F)
where
    F: Future<Output = Result<(), ScenarioError>>,
{
    output.scenario_started(name);
    let started = Instant::now();
    let result = scenario.await;
    let duration = started.elapsed();

    match result {
        Ok(()) => {
            output.scenario_passed(name, duration);
            report.push(ScenarioReport::passed(name, duration));
        }
        Err(error) => {
            let reason = error.to_string();
            output.scenario_failed(name, &reason, duration);
            report.push(ScenarioReport::failed(name, reason, duration));
        }
    }
}
