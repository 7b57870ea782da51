//! Recognition state shared between the pipeline and its caller

use crate::vision::{MergedResult, RecognitionLanguage};

/// Where the pipeline is in its Idle → Recognizing → Completed/Failed cycle
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RecognitionPhase {
    /// Nothing has run, or the last result was cleared
    #[default]
    Idle,
    /// A pass has been dispatched and not yet merged
    Recognizing,
    /// The last pass produced a merged result
    Completed,
    /// The last pass failed as a whole
    Failed(String),
}

/// Observable state of one pipeline instance
///
/// Updated once when a pass starts and once when it ends; no partial
/// results are ever published.
#[derive(Debug, Clone, Default)]
pub struct RecognitionState {
    /// Language used for the next pass
    pub selected_language: RecognitionLanguage,
    /// Current phase
    pub phase: RecognitionPhase,
    /// Joined text of the last pass (empty after a failure)
    pub recognized_text: String,
    /// Merged result of the last successful pass
    pub last_result: Option<MergedResult>,
    /// Last error message (if any)
    pub last_error: Option<String>,
}

impl RecognitionState {
    /// Whether a pass is in flight (drives the spinner)
    pub fn is_recognizing(&self) -> bool {
        self.phase == RecognitionPhase::Recognizing
    }

    /// Move to `Recognizing`; false if a pass is already in flight
    pub fn begin(&mut self) -> bool {
        if self.is_recognizing() {
            return false;
        }
        self.phase = RecognitionPhase::Recognizing;
        self.clear_error();
        true
    }

    /// Publish a completed pass
    pub fn complete(&mut self, result: MergedResult) {
        self.recognized_text = result.text();
        self.last_result = Some(result);
        self.phase = RecognitionPhase::Completed;
    }

    /// Publish a failed pass
    pub fn fail(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        self.recognized_text.clear();
        self.last_result = None;
        self.set_error(reason.clone());
        self.phase = RecognitionPhase::Failed(reason);
    }

    /// Drop the last outcome and return to `Idle`
    pub fn reset(&mut self) {
        if self.is_recognizing() {
            return;
        }
        self.phase = RecognitionPhase::Idle;
        self.recognized_text.clear();
        self.last_result = None;
        self.clear_error();
    }

    /// Clear any error state
    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Set an error message
    pub fn set_error(&mut self, error: impl Into<String>) {
        self.last_error = Some(error.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::{NormalizedRect, Observation};

    #[test]
    fn test_lifecycle() {
        let mut state = RecognitionState::default();
        assert_eq!(state.phase, RecognitionPhase::Idle);
        assert!(!state.is_recognizing());

        assert!(state.begin());
        assert!(state.is_recognizing());
        assert!(!state.begin(), "second pass must be rejected");

        let result = MergedResult {
            observations: vec![Observation::new("hello", 1.0, NormalizedRect::default())],
            patch_count: 1,
            ..Default::default()
        };
        state.complete(result);
        assert_eq!(state.phase, RecognitionPhase::Completed);
        assert_eq!(state.recognized_text, "hello");
        assert!(state.last_result.is_some());

        state.reset();
        assert_eq!(state.phase, RecognitionPhase::Idle);
        assert!(state.recognized_text.is_empty());
    }

    #[test]
    fn test_fail_clears_text() {
        let mut state = RecognitionState {
            recognized_text: "stale".to_string(),
            ..Default::default()
        };
        assert!(state.begin());
        state.fail("bad image");

        assert_eq!(state.phase, RecognitionPhase::Failed("bad image".to_string()));
        assert!(state.recognized_text.is_empty());
        assert_eq!(state.last_error.as_deref(), Some("bad image"));
    }

    #[test]
    fn test_reset_ignored_while_recognizing() {
        let mut state = RecognitionState::default();
        state.begin();
        state.reset();
        assert!(state.is_recognizing());
    }
}
