//! Multi-patch recognition pipeline
//!
//! One pass slices the image, recognizes every patch concurrently on the
//! blocking worker pool, waits for all of them and merges the results.
//! Patch failures are tolerated; the patch simply contributes nothing.

use futures_util::future::join_all;
use image::RgbaImage;
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::{Result, VisionError};
use super::input::load_image;
use super::language::RecognitionLanguage;
use super::merge::{merge_outcomes, MergedResult, PatchOutcome};
use super::patch::{Patch, PatchSlicer};
use super::{RecognitionLevel, RecognitionRequest, TextRecognizer};
use crate::config::RecognitionSettings;
use crate::shared::RecognitionState;

/// Recognition pipeline bound to one backend
pub struct RecognitionPipeline {
    recognizer: Arc<dyn TextRecognizer>,
    slicer: PatchSlicer,
    level: RecognitionLevel,
    uses_language_correction: bool,
    max_concurrent_patches: usize,
    deduplicate_overlaps: bool,
    state: Arc<RwLock<RecognitionState>>,
}

impl RecognitionPipeline {
    /// Create a pipeline with default settings
    pub fn new(recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self::with_settings(recognizer, &RecognitionSettings::default())
    }

    /// Create a pipeline with custom settings
    pub fn with_settings(recognizer: Arc<dyn TextRecognizer>, settings: &RecognitionSettings) -> Self {
        let state = RecognitionState {
            selected_language: settings.language,
            ..Default::default()
        };

        Self {
            recognizer,
            slicer: PatchSlicer::new(settings.division_count),
            level: settings.level,
            uses_language_correction: settings.uses_language_correction,
            max_concurrent_patches: settings.max_concurrent_patches.max(1),
            deduplicate_overlaps: settings.deduplicate_overlaps,
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Shared handle to the observable state
    pub fn state(&self) -> Arc<RwLock<RecognitionState>> {
        self.state.clone()
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> RecognitionState {
        self.state.read().clone()
    }

    /// Whether a pass is in flight
    pub fn is_recognizing(&self) -> bool {
        self.state.read().is_recognizing()
    }

    /// Language used for the next pass
    pub fn language(&self) -> RecognitionLanguage {
        self.state.read().selected_language
    }

    /// Select the language for the next pass
    pub fn set_language(&self, language: RecognitionLanguage) {
        self.state.write().selected_language = language;
    }

    /// Joined text of the last pass
    pub fn recognized_text(&self) -> String {
        self.state.read().recognized_text.clone()
    }

    /// Decode an image file and recognize it
    pub async fn recognize_file(&self, path: &Path) -> Result<MergedResult> {
        let image = load_image(path)?;
        self.recognize(&image).await
    }

    /// Recognize `image` and invoke `completion` with the joined text
    ///
    /// The completion receives an empty string when the pass fails as a whole.
    pub async fn recognize_with_callback<F>(&self, image: &RgbaImage, completion: F)
    where
        F: FnOnce(String),
    {
        let text = match self.recognize(image).await {
            Ok(result) => result.text(),
            Err(e) => {
                warn!("Text recognition failed: {}", e);
                String::new()
            }
        };
        completion(text);
    }

    /// Run one recognition pass over `image`
    pub async fn recognize(&self, image: &RgbaImage) -> Result<MergedResult> {
        let language = {
            let mut state = self.state.write();
            if !state.begin() {
                return Err(VisionError::Busy);
            }
            state.selected_language
        };
        let mut pass = PassGuard::new(&self.state);

        let pass_id = Uuid::new_v4();
        let start = Instant::now();

        let patches = match self.slicer.slice(image) {
            Ok(patches) => patches,
            Err(e) => {
                warn!("Recognition pass {} aborted: {}", pass_id, e);
                pass.fail(e.to_string());
                return Err(e);
            }
        };

        info!(
            "Recognition pass {} started: {} patches, language {}",
            pass_id,
            patches.len(),
            language
        );

        let request = RecognitionRequest {
            language,
            level: self.level,
            uses_language_correction: self.uses_language_correction,
        };

        let patches = Arc::new(patches);
        let outcomes = self.dispatch(&patches, &request).await;
        let result = merge_outcomes(&patches, outcomes, language, self.deduplicate_overlaps);

        info!(
            "Recognition pass {} complete in {:?}: {} observations, {} failed patches",
            pass_id,
            start.elapsed(),
            result.observations.len(),
            result.failed_patches.len()
        );

        pass.complete(result.clone());
        Ok(result)
    }

    /// Recognize every patch concurrently and collect the outcomes
    async fn dispatch(&self, patches: &Arc<Vec<Patch>>, request: &RecognitionRequest) -> Vec<PatchOutcome> {
        let (tx, rx) = crossbeam_channel::unbounded();
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_patches));

        let tasks = (0..patches.len()).map(|index| {
            let patches = Arc::clone(patches);
            let recognizer = Arc::clone(&self.recognizer);
            let request = request.clone();
            let semaphore = Arc::clone(&semaphore);
            let tx = tx.clone();

            async move {
                let _permit = semaphore.acquire_owned().await.ok();

                let task_tx = tx.clone();
                let handle = tokio::task::spawn_blocking(move || {
                    let patch = &patches[index];
                    let result = recognizer.recognize(&patch.image, &request).map_err(|e| {
                        VisionError::PatchRecognition {
                            index,
                            reason: e.to_string(),
                        }
                    });
                    if let Ok(observations) = &result {
                        debug!(
                            "Patch {} ({}): {} observations",
                            index,
                            recognizer.name(),
                            observations.len()
                        );
                    }
                    let _ = task_tx.send(PatchOutcome { index, result });
                });

                if let Err(e) = handle.await {
                    let _ = tx.send(PatchOutcome::failed(
                        index,
                        format!("recognition task aborted: {}", e),
                    ));
                }
            }
        });

        join_all(tasks).await;
        drop(tx);

        rx.try_iter().collect()
    }
}

/// Publishes the end of a pass, or marks it failed if the pass is dropped
struct PassGuard<'a> {
    state: &'a RwLock<RecognitionState>,
    finished: bool,
}

impl<'a> PassGuard<'a> {
    fn new(state: &'a RwLock<RecognitionState>) -> Self {
        Self { state, finished: false }
    }

    fn complete(&mut self, result: MergedResult) {
        self.state.write().complete(result);
        self.finished = true;
    }

    fn fail(&mut self, reason: String) {
        self.state.write().fail(reason);
        self.finished = true;
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.state.write().fail("recognition pass was cancelled");
        }
    }
}
