//! Merging per-patch recognition results
//!
//! Observations come back in patch-local normalized space. They are rescaled
//! into source space, ordered top to bottom and joined into the final text.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::error::VisionError;
use super::language::RecognitionLanguage;
use super::observation::{NormalizedRect, Observation};
use super::patch::Patch;

/// What one patch's recognition produced
#[derive(Debug)]
pub struct PatchOutcome {
    /// Index of the patch in slice order
    pub index: usize,
    /// Patch-local observations, or why the patch failed
    pub result: Result<Vec<Observation>, VisionError>,
}

impl PatchOutcome {
    /// Outcome of a patch whose recognition failed
    pub fn failed(index: usize, reason: impl Into<String>) -> Self {
        Self {
            index,
            result: Err(VisionError::PatchRecognition {
                index,
                reason: reason.into(),
            }),
        }
    }
}

/// Observations of one recognition pass in source-image space
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedResult {
    /// Language the pass ran with
    pub language: RecognitionLanguage,
    /// Number of patches dispatched
    pub patch_count: usize,
    /// Observations sorted top to bottom
    pub observations: Vec<Observation>,
    /// Patches whose recognition failed and contributed nothing
    pub failed_patches: Vec<usize>,
}

impl MergedResult {
    /// Top candidates joined with newlines, in reading order
    pub fn text(&self) -> String {
        join_text(&self.observations)
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Whether every dispatched patch recognized successfully
    pub fn is_complete(&self) -> bool {
        self.failed_patches.is_empty()
    }
}

/// Rescale a patch-local observation into source space
///
/// `division_ratio` is the source height divided by the patch height and
/// `offset_fraction` the patch's bottom edge in source space. Only the
/// vertical axis changes since patches span the full source width.
pub fn remap_observation(
    observation: Observation,
    division_ratio: f32,
    offset_fraction: f32,
) -> Observation {
    let bounds = observation.bounds;
    Observation {
        bounds: NormalizedRect {
            x: bounds.x,
            y: bounds.y / division_ratio + offset_fraction,
            width: bounds.width,
            height: bounds.height / division_ratio,
        },
        ..observation
    }
}

/// Remap every observation a patch produced
///
/// Uses the patch's real geometry: with half-band overlap, patch `i` starts
/// `i` half-bands down, so its offset is not `i / division_count`. For patch 2
/// of an 800 px image at 8 divisions a local `y` of 0.5 lands at 0.8125, not
/// `0.5 / 8 + 2 / 8`; `remap_observation` covers that fixed-offset form.
pub fn remap_patch_observations(patch: &Patch, observations: Vec<Observation>) -> Vec<Observation> {
    let ratio = patch.division_ratio();
    let offset = patch.offset_fraction();
    observations
        .into_iter()
        .map(|obs| remap_observation(obs, ratio, offset))
        .collect()
}

/// Order observations top of the image first
///
/// Stable, so observations at the same height keep their incoming order.
pub fn sort_top_to_bottom(observations: &mut [Observation]) {
    observations.sort_by(|a, b| b.bounds.y.total_cmp(&a.bounds.y));
}

/// Drop repeats of a line that was read in two overlapping patches
///
/// An observation is a repeat when an already kept observation has the same
/// top candidate and a vertically intersecting box.
pub fn deduplicate_overlaps(observations: Vec<Observation>) -> Vec<Observation> {
    let mut kept: Vec<Observation> = Vec::with_capacity(observations.len());

    for obs in observations {
        let duplicate = kept.iter().any(|k| {
            k.top_candidate().is_some()
                && k.top_candidate() == obs.top_candidate()
                && k.bounds.overlaps_vertically(&obs.bounds)
        });
        if !duplicate {
            kept.push(obs);
        }
    }

    kept
}

/// Join the top candidate of each observation with newlines
pub fn join_text(observations: &[Observation]) -> String {
    observations
        .iter()
        .filter_map(Observation::top_candidate)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Combine patch outcomes into one source-space result
///
/// Failed patches are logged and recorded but never fail the merge.
pub fn merge_outcomes(
    patches: &[Patch],
    mut outcomes: Vec<PatchOutcome>,
    language: RecognitionLanguage,
    deduplicate: bool,
) -> MergedResult {
    // Completion order must not leak into the result
    outcomes.sort_by_key(|o| o.index);

    let mut observations = Vec::new();
    let mut failed_patches = Vec::new();

    for outcome in outcomes {
        let Some(patch) = patches.get(outcome.index) else {
            warn!("Dropping outcome for unknown patch {}", outcome.index);
            continue;
        };

        match outcome.result {
            Ok(local) => observations.extend(remap_patch_observations(patch, local)),
            Err(err) => {
                warn!("{}", err);
                failed_patches.push(outcome.index);
            }
        }
    }

    sort_top_to_bottom(&mut observations);

    if deduplicate {
        let before = observations.len();
        observations = deduplicate_overlaps(observations);
        debug!("Deduplication removed {} observations", before - observations.len());
    }

    MergedResult {
        language,
        patch_count: patches.len(),
        observations,
        failed_patches,
    }
}
