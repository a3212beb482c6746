// src/detection/mod.rs
//
// Vision stages of the per-tick pipeline.
//
// Signal flow:
//   Frame → classifier (color masks) → estimator (fish Y, sweet-spot Y)
//         → kinematics (smoothed sweet-spot velocity) → controller
//
// Everything here is signal extraction: degraded input degrades the
// estimates, it never produces errors.

pub mod classifier;
pub mod estimator;
pub mod kinematics;

pub use classifier::{classify, progress_fill, ui_visible, Mask, SegmentMasks};
pub use estimator::{PositionEstimator, TrackerState};
