// ABOUTME: Listing scenarios over sets of related image references.
// ABOUTME: Checks the de-duplication semantics of the listing API.

use crate::runtime::{Image, ImageFilter, ImageOps, PodSandboxConfig};
use crate::suite::error::{ScenarioError, check};
use crate::suite::lifecycle::{ensure_absent, remove_all};
use crate::types::{ImageId, ImageRef};
use std::collections::HashSet;

/// Collapse a sequence of observed IDs into first-occurrence order.
///
/// Used to count distinct images pulled; cleanup always iterates the original
/// reference list instead.
pub fn dedupe_first_occurrence(ids: &[ImageId]) -> Vec<ImageId> {
    let mut seen = HashSet::new();
    ids.iter()
        .filter(|id| seen.insert((*id).clone()))
        .cloned()
        .collect()
}

async fn pull_set<I>(
    images: &I,
    references: &[ImageRef],
    sandbox: Option<&PodSandboxConfig>,
) -> Result<Vec<ImageId>, ScenarioError>
where
    I: ImageOps + ?Sized,
{
    let mut ids = Vec::with_capacity(references.len());
    for reference in references {
        ensure_absent(images, reference).await?;
        ids.push(images.pull_image(reference, sandbox).await?);
    }
    Ok(ids)
}

fn find_record<'a>(listing: &'a [Image], id: &ImageId) -> Option<&'a Image> {
    listing.iter().find(|img| img.id == *id)
}

/// Pull K references mapping to K distinct images and verify the listing
/// contains K entries, each carrying exactly the one repo tag it was pulled
/// by, in pull order.
pub async fn distinct_images_have_single_tags<I>(
    images: &I,
    references: &[ImageRef],
    sandbox: Option<&PodSandboxConfig>,
) -> Result<(), ScenarioError>
where
    I: ImageOps + ?Sized,
{
    let primary = async {
        let ids = pull_set(images, references, sandbox).await?;
        let unique = dedupe_first_occurrence(&ids);
        check(
            unique.len() == references.len(),
            format!(
                "{} references produced {} distinct images",
                references.len(),
                unique.len()
            ),
        )?;

        let listing = images.list_images(&ImageFilter::default()).await?;
        for (reference, id) in references.iter().zip(&unique) {
            let record = find_record(&listing, id).ok_or_else(|| {
                ScenarioError::Check(format!("{reference}: image {id} missing from listing"))
            })?;
            check(
                record.repo_tags.len() == 1,
                format!(
                    "{reference}: expected exactly 1 repo tag, found {:?}",
                    record.repo_tags
                ),
            )?;
            let expected = reference.qualified_tag().unwrap_or_default();
            check(
                record.repo_tags[0] == expected,
                format!(
                    "{reference}: repo tag {:?} should be {expected:?}",
                    record.repo_tags[0]
                ),
            )?;
        }
        Ok(())
    }
    .await;

    // Cleanup iterates the original reference list on success and failure
    // alike; a hard removal error only surfaces when the checks passed.
    let cleanup = remove_all(images, references).await;
    primary.and(cleanup)
}

/// Pull K references that all map to one underlying image and verify the
/// listing collapses them into a single entry whose sorted repo tags equal
/// the sorted input tag set exactly.
pub async fn same_image_collects_all_tags<I>(
    images: &I,
    references: &[ImageRef],
    sandbox: Option<&PodSandboxConfig>,
) -> Result<(), ScenarioError>
where
    I: ImageOps + ?Sized,
{
    let primary = async {
        let ids = pull_set(images, references, sandbox).await?;
        let unique = dedupe_first_occurrence(&ids);
        check(
            unique.len() == 1,
            format!(
                "{} references produced {} distinct images, expected 1",
                references.len(),
                unique.len()
            ),
        )?;

        let listing = images.list_images(&ImageFilter::default()).await?;
        let record = find_record(&listing, &unique[0]).ok_or_else(|| {
            ScenarioError::Check(format!("image {} missing from listing", unique[0]))
        })?;

        let mut observed = record.repo_tags.clone();
        observed.sort();
        let mut expected: Vec<String> = references
            .iter()
            .filter_map(ImageRef::qualified_tag)
            .collect();
        expected.sort();

        check(
            observed == expected,
            format!("repo tags {observed:?} should equal {expected:?}"),
        )
    }
    .await;

    let cleanup = remove_all(images, references).await;
    primary.and(cleanup)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ImageId {
        ImageId::new(s)
    }

    #[test]
    fn dedupe_keeps_first_occurrence_order() {
        let ids = vec![id("c"), id("a"), id("c"), id("b"), id("a")];
        assert_eq!(
            dedupe_first_occurrence(&ids),
            vec![id("c"), id("a"), id("b")]
        );
    }

    #[test]
    fn dedupe_of_empty_is_empty() {
        assert!(dedupe_first_occurrence(&[]).is_empty());
    }

    #[test]
    fn dedupe_of_identical_ids_is_single() {
        let ids = vec![id("x"), id("x"), id("x")];
        assert_eq!(dedupe_first_occurrence(&ids), vec![id("x")]);
    }
}
