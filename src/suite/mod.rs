// ABOUTME: Conformance scenarios exercising the backend capability surface.
// ABOUTME: Lifecycle, reference resolution, listing, and the concurrent stress run.

mod error;
mod image_set;
mod lifecycle;
mod report;
mod resolver;
mod runner;
mod stress;
mod wait;

pub use error::{ScenarioError, check};
pub use image_set::{
    dedupe_first_occurrence, distinct_images_have_single_tags, same_image_collects_all_tags,
};
pub use lifecycle::{ensure_absent, pull_and_verify, remove_and_verify};
pub use report::{RunReport, ScenarioReport, ScenarioStatus};
pub use resolver::verify_reference_forms;
pub use runner::{SuiteSettings, run_suite};
pub use stress::{PipelineFailure, PipelinePhase, StressOutcome, StressSettings, run_stress};
pub use wait::{PollError, PollState, poll_until};
