// ABOUTME: Single-image lifecycle primitives: ensure-absent, pull-and-verify.
// ABOUTME: Every scenario builds on these pull/remove building blocks.

use crate::runtime::{Image, ImageOps, PodSandboxConfig};
use crate::suite::error::{ScenarioError, check};
use crate::types::ImageRef;

/// Make sure no image resolvable from `reference` exists before a scenario
/// starts. Removal goes through the record's canonical ID: a tag reference
/// could be ambiguous or stale after earlier runs. An absent image is a
/// valid pre-state, not an error.
pub async fn ensure_absent<I>(images: &I, reference: &ImageRef) -> Result<(), ScenarioError>
where
    I: ImageOps + ?Sized,
{
    if let Some(record) = images.image_status(reference).await? {
        tracing::debug!(image = %reference, id = %record.id, "removing leftover image");
        let id_ref = ImageRef::parse(record.id.as_str())?;
        images.remove_image(&id_ref).await?;
    }
    Ok(())
}

/// Remove a present image by its canonical ID and verify the backend then
/// reports it absent.
pub async fn remove_and_verify<I>(images: &I, reference: &ImageRef) -> Result<(), ScenarioError>
where
    I: ImageOps + ?Sized,
{
    let record = images
        .image_status(reference)
        .await?
        .ok_or_else(|| ScenarioError::Check(format!("{reference}: no record to remove")))?;

    let id_ref = ImageRef::parse(record.id.as_str())?;
    images.remove_image(&id_ref).await?;

    let after = images.image_status(reference).await?;
    check(
        after.is_none(),
        format!("{reference}: still present after removal"),
    )
}

/// Pull an image and verify the post-pull invariants: the record exists, its
/// ID matches what the pull returned, its size is populated, and the
/// caller-supplied structural check holds. The image is removed afterwards
/// and must then be absent.
pub async fn pull_and_verify<I, F>(
    images: &I,
    reference: &ImageRef,
    sandbox: Option<&PodSandboxConfig>,
    check_record: F,
) -> Result<(), ScenarioError>
where
    I: ImageOps + ?Sized,
    F: FnOnce(&Image) -> Result<(), ScenarioError>,
{
    ensure_absent(images, reference).await?;

    let pulled_id = images.pull_image(reference, sandbox).await?;
    tracing::debug!(image = %reference, id = %pulled_id, "pulled");

    let record = images
        .image_status(reference)
        .await?
        .ok_or_else(|| ScenarioError::Check(format!("{reference}: no record after pull")))?;

    check(
        !record.id.as_str().is_empty(),
        format!("{reference}: record has an empty ID"),
    )?;
    check(
        record.id == pulled_id,
        format!(
            "{reference}: pull returned ID {pulled_id} but status reports {}",
            record.id
        ),
    )?;
    check(
        record.size > 0,
        format!("{reference}: record has zero size"),
    )?;
    check_record(&record)?;

    remove_and_verify(images, reference).await
}

/// Remove every listed image, logging and collecting hard failures without
/// stopping the sweep. Absence is success; any error returned here means the
/// backend refused a removal outright.
pub async fn remove_all<I>(images: &I, references: &[ImageRef]) -> Result<(), ScenarioError>
where
    I: ImageOps + ?Sized,
{
    let mut first_error = None;
    for reference in references {
        if let Err(e) = images.remove_image(reference).await {
            tracing::warn!(image = %reference, error = %e, "cleanup removal failed");
            first_error.get_or_insert(e);
        }
    }
    match first_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}
