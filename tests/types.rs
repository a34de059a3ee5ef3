// ABOUTME: Property and compile-time tests for the core types.
// ABOUTME: ImageRef parsing robustness and ID-type safety.

use cricheck::suite::dedupe_first_occurrence;
use cricheck::types::{ContainerId, ImageId, ImageRef, PodId};
use proptest::prelude::*;

proptest! {
    /// Parsing arbitrary input never panics; it either produces a reference
    /// or a typed error.
    #[test]
    fn parse_never_panics(input in ".*") {
        let _ = ImageRef::parse(&input);
    }

    /// Well-formed name[:tag] references parse and display back verbatim.
    #[test]
    fn well_formed_references_round_trip(
        name in "[a-z][a-z0-9]{0,11}",
        tag in proptest::option::of("[a-z0-9][a-z0-9.]{0,7}"),
    ) {
        let input = match &tag {
            Some(tag) => format!("{name}:{tag}"),
            None => name.clone(),
        };
        let parsed = ImageRef::parse(&input).expect("reference should parse");
        prop_assert_eq!(parsed.to_string(), input);
        prop_assert_eq!(parsed.name(), name.as_str());
        prop_assert_eq!(parsed.tag(), tag.as_deref());
    }

    /// Dedup output is unique, covers every input ID, and is an
    /// order-preserving subsequence of the input.
    #[test]
    fn dedupe_is_unique_complete_and_ordered(ids in proptest::collection::vec("[a-f]{1,2}", 0..20)) {
        let ids: Vec<ImageId> = ids.iter().map(|id| ImageId::new(id.as_str())).collect();
        let unique = dedupe_first_occurrence(&ids);

        for (i, a) in unique.iter().enumerate() {
            for b in &unique[i + 1..] {
                prop_assert_ne!(a, b);
            }
        }
        for id in &ids {
            prop_assert!(unique.contains(id));
        }
        // subsequence: each unique element is found in the input after the
        // previous one's position
        let mut input_pos = 0;
        for id in &unique {
            let found = ids[input_pos..].iter().position(|candidate| candidate == id);
            prop_assert!(found.is_some(), "output is not a subsequence of input");
            input_pos += found.unwrap_or(0) + 1;
        }
    }
}

/// The ID phantom types are distinct at compile time: these signatures only
/// compile because each function demands its own ID kind. Passing a `PodId`
/// where a `ContainerId` is expected is rejected by the compiler.
#[test]
fn id_types_are_distinct() {
    fn takes_pod(id: &PodId) -> &str {
        id.as_str()
    }
    fn takes_container(id: &ContainerId) -> &str {
        id.as_str()
    }

    let pod = PodId::new("pod-1");
    let container = ContainerId::new("ctr-1");
    assert_eq!(takes_pod(&pod), "pod-1");
    assert_eq!(takes_container(&container), "ctr-1");
}

#[test]
fn image_id_equality_and_display() {
    let a = ImageId::new("sha256:abc");
    let b = ImageId::new("sha256:abc");
    assert_eq!(a, b);
    assert_eq!(a.to_string(), "sha256:abc");
    assert_eq!(b.into_inner(), "sha256:abc");
}
