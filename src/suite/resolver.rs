// ABOUTME: Reference-form equivalence scenario.
// ABOUTME: Status by ID, by each tag, and by each digest must agree exactly.

use crate::runtime::{ImageOps, PodSandboxConfig};
use crate::suite::error::{ScenarioError, check};
use crate::suite::lifecycle::{ensure_absent, remove_and_verify};
use crate::types::ImageRef;

/// Pull one image and verify that every reference form the backend reports
/// for it — its ID, each repo tag, each repo digest — resolves to a record
/// equal in all fields. A digest-only image simply has no tags to iterate.
pub async fn verify_reference_forms<I>(
    images: &I,
    reference: &ImageRef,
    sandbox: Option<&PodSandboxConfig>,
) -> Result<(), ScenarioError>
where
    I: ImageOps + ?Sized,
{
    ensure_absent(images, reference).await?;
    images.pull_image(reference, sandbox).await?;

    let original = images
        .image_status(reference)
        .await?
        .ok_or_else(|| ScenarioError::Check(format!("{reference}: no record after pull")))?;

    let mut forms: Vec<String> = Vec::with_capacity(
        1 + original.repo_tags.len() + original.repo_digests.len(),
    );
    forms.push(original.id.as_str().to_string());
    forms.extend(original.repo_tags.iter().cloned());
    forms.extend(original.repo_digests.iter().cloned());

    for form in &forms {
        let resolved = images.image_status(&ImageRef::parse(form)?).await?;
        check(
            resolved.as_ref() == Some(&original),
            format!("status by {form:?} diverges from the original record"),
        )?;
    }

    remove_and_verify(images, reference).await
}
