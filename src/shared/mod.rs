//! Shared state between the recognition pipeline and its caller
//!
//! The caller reads snapshots of this state to render the recognized text
//! and the in-progress spinner.

pub mod state;

pub use state::{RecognitionPhase, RecognitionState};
