// ABOUTME: Integration tests for the single-image lifecycle checker.
// ABOUTME: Pull/verify/remove invariants against the fake backend.

mod support;

use cricheck::fixtures;
use cricheck::runtime::ImageOps;
use cricheck::suite::{ScenarioError, check, ensure_absent, pull_and_verify, remove_and_verify};

#[tokio::test]
async fn tagged_pull_round_trips_and_removes() {
    support::init_tracing();
    let backend = support::preloaded_backend();
    let image = fixtures::image_with_tag();
    let sandbox = fixtures::suite_sandbox_config();
    let expected: Vec<String> = image.qualified_tag().into_iter().collect();

    pull_and_verify(backend.as_ref(), &image, Some(&sandbox), |record| {
        check(
            record.repo_tags == expected,
            format!("repo tags {:?} should equal {expected:?}", record.repo_tags),
        )
    })
    .await
    .expect("scenario should pass");

    let after = backend.image_status(&image).await.unwrap();
    assert!(after.is_none(), "image should be gone after the scenario");
}

#[tokio::test]
async fn tagless_pull_defaults_to_latest() {
    let backend = support::preloaded_backend();
    let image = fixtures::image_without_tag();
    let sandbox = fixtures::suite_sandbox_config();

    pull_and_verify(backend.as_ref(), &image, Some(&sandbox), |record| {
        check(
            record.repo_tags == vec!["busybox:latest".to_string()],
            format!("repo tags {:?} should be [busybox:latest]", record.repo_tags),
        )
    })
    .await
    .expect("scenario should pass");
}

#[tokio::test]
async fn digest_pull_has_no_repo_tags() {
    let backend = support::preloaded_backend();
    let image = fixtures::image_with_digest();
    let sandbox = fixtures::suite_sandbox_config();
    let expected: Vec<String> = image.qualified_digest().into_iter().collect();

    pull_and_verify(backend.as_ref(), &image, Some(&sandbox), |record| {
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
    .expect("scenario should pass");
}

#[tokio::test]
async fn user_metadata_fixtures_verify() {
    let backend = support::preloaded_backend();
    let sandbox = fixtures::suite_sandbox_config();

    for fixture in fixtures::user_image_fixtures() {
        pull_and_verify(backend.as_ref(), &fixture.image, Some(&sandbox), |record| {
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
        })
        .await
        .unwrap_or_else(|e| panic!("{}: {e}", fixture.description));
    }
}

#[tokio::test]
async fn ensure_absent_tolerates_missing_image() {
    let backend = support::preloaded_backend();
    let image = fixtures::image_with_tag();

    // nothing pulled yet: absence is a valid pre-state
    ensure_absent(backend.as_ref(), &image)
        .await
        .expect("absence should not be an error");
}

#[tokio::test]
async fn ensure_absent_removes_leftovers_by_id() {
    let backend = support::preloaded_backend();
    let image = fixtures::image_with_tag();

    backend.pull_image(&image, None).await.unwrap();
    ensure_absent(backend.as_ref(), &image).await.unwrap();

    let after = backend.image_status(&image).await.unwrap();
    assert!(after.is_none(), "leftover image should have been removed");
}

#[tokio::test]
async fn failing_structural_check_fails_the_scenario() {
    let backend = support::preloaded_backend();
    let image = fixtures::image_with_tag();

    let result = pull_and_verify(backend.as_ref(), &image, None, |_record| {
        Err(ScenarioError::Check("structural mismatch".to_string()))
    })
    .await;

    match result {
        Err(ScenarioError::Check(detail)) => assert!(detail.contains("structural mismatch")),
        other => panic!("expected a check failure, got {other:?}"),
    }
}

#[tokio::test]
async fn remove_and_verify_requires_a_present_image() {
    let backend = support::preloaded_backend();
    let image = fixtures::image_with_tag();

    let result = remove_and_verify(backend.as_ref(), &image).await;
    assert!(matches!(result, Err(ScenarioError::Check(_))));
}
