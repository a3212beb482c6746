// src/detection/estimator.rs
//
// Reduces color masks to two scalar Y estimates per tick: the fish
// marker and the sweet spot (the gap between zone bars). All the
// robustness filtering lives here: minimum evidence, largest-run
// selection, edge rejection, glitch-jump rejection, per-session warmup.
//
// Estimation only ever touches TrackerState; it never drives actuation.

use super::classifier::SegmentMasks;
use crate::types::{DetectionConfig, PositionEstimate};
use tracing::debug;

/// Rows of the clear-row index list further apart than this break a run.
const RUN_BREAK_GAP: usize = 5;
/// A row counts as clear when its zone-bar pixel count is below this
/// fraction of the frame's busiest row.
const CLEAR_ROW_RATIO: f32 = 0.2;

/// Per-session tracking state, created fresh at every Idle→Tracking
/// transition and owned by the estimator + kinematics stages.
#[derive(Debug, Clone)]
pub struct TrackerState {
    pub last_fish_y: Option<f32>,
    pub last_sweet_spot_y: f32,
    pub prev_sweet_spot_y: Option<f32>,
    pub smoothed_velocity: f32,
    /// True while the marker shows its green "locked on" art.
    pub fish_tracked: bool,
    pub warmup_remaining: u32,
    /// Midpoint the sweet-spot estimate was seeded to at session start.
    pub seed_y: f32,
}

impl TrackerState {
    /// Seed the sweet spot at the frame's vertical midpoint so
    /// downstream consumers never see a missing first value.
    pub fn new(frame_height: usize, warmup_ticks: u32) -> Self {
        let seed_y = frame_height as f32 / 2.0;
        Self {
            last_fish_y: None,
            last_sweet_spot_y: seed_y,
            prev_sweet_spot_y: None,
            smoothed_velocity: 0.0,
            fish_tracked: false,
            warmup_remaining: warmup_ticks,
            seed_y,
        }
    }
}

pub struct PositionEstimator {
    det: DetectionConfig,
}

impl PositionEstimator {
    pub fn new(det: DetectionConfig) -> Self {
        Self { det }
    }

    /// Fish marker Y. White and green art are ORed together; whichever
    /// dominates decides the contact offset and the tracked flag.
    pub fn fish_position(&self, masks: &SegmentMasks, state: &mut TrackerState) -> PositionEstimate {
        let white = masks.fish_white.row_counts();
        let green = masks.fish_green.row_counts();

        let white_total: usize = white.iter().sum();
        let green_total: usize = green.iter().sum();
        let evidence = white_total + green_total;

        if evidence < self.det.min_fish_pixels {
            debug!("fish marker not found ({} px)", evidence);
            return PositionEstimate {
                y: state.last_fish_y,
                evidence,
            };
        }

        let weighted: usize = white
            .iter()
            .zip(green.iter())
            .enumerate()
            .map(|(y, (w, g))| y * (w + g))
            .sum();
        let centroid = weighted as f32 / evidence as f32;

        state.fish_tracked = green_total > white_total;
        let offset = if state.fish_tracked {
            self.det.green_contact_offset
        } else {
            self.det.white_contact_offset
        };

        let fish_y = centroid + offset;
        state.last_fish_y = Some(fish_y);
        PositionEstimate {
            y: Some(fish_y),
            evidence,
        }
    }

    /// Sweet-spot Y: mean row of the longest run of clear rows between
    /// the zone bars. Falls back to the last accepted value whenever the
    /// reading is absent or implausible.
    pub fn sweet_spot_position(
        &self,
        masks: &SegmentMasks,
        state: &mut TrackerState,
    ) -> PositionEstimate {
        let rows = masks.zone_bar.row_counts();
        let max_row = rows.iter().copied().max().unwrap_or(0);

        let held = PositionEstimate {
            y: Some(state.last_sweet_spot_y),
            evidence: 0,
        };

        // No zone bars at all: nothing to find a gap in.
        if max_row == 0 {
            debug!("sweet spot: no zone-bar pixels, holding last value");
            return held;
        }

        let threshold = max_row as f32 * CLEAR_ROW_RATIO;
        let clear_rows: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, &c)| (c as f32) < threshold)
            .map(|(y, _)| y)
            .collect();

        let Some(run) = longest_run(&clear_rows) else {
            debug!("sweet spot: no clear rows, holding last value");
            return held;
        };

        let candidate = run.iter().sum::<usize>() as f32 / run.len() as f32;

        // Bar-rendering artifacts cluster at the frame edges.
        let height = masks.zone_bar.height as f32;
        if candidate < self.det.edge_margin || candidate > height - 1.0 - self.det.edge_margin {
            debug!("sweet spot: {:.1} inside edge margin, rejected", candidate);
            return held;
        }

        if state.warmup_remaining > 0 {
            state.warmup_remaining -= 1;
            debug!(
                "sweet spot: warmup accept {:.1} ({} warmup ticks left)",
                candidate, state.warmup_remaining
            );
        } else {
            let jump = (candidate - state.last_sweet_spot_y).abs();
            if jump > self.det.max_sweet_spot_jump {
                debug!(
                    "sweet spot: rejecting glitch jump {:.1} → {:.1} (Δ{:.1})",
                    state.last_sweet_spot_y, candidate, jump
                );
                return held;
            }
        }

        state.last_sweet_spot_y = candidate;
        PositionEstimate {
            y: Some(candidate),
            evidence: run.len(),
        }
    }
}

/// Longest maximal run of consecutive-ish indices (gap ≤ RUN_BREAK_GAP).
fn longest_run(indices: &[usize]) -> Option<&[usize]> {
    if indices.is_empty() {
        return None;
    }
    let mut best: &[usize] = &indices[..0];
    let mut start = 0;
    for i in 1..=indices.len() {
        let broken = i == indices.len() || indices[i] - indices[i - 1] > RUN_BREAK_GAP;
        if broken {
            if i - start > best.len() {
                best = &indices[start..i];
            }
            start = i;
        }
    }
    Some(best)
}
