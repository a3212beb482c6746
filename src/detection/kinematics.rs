// src/detection/kinematics.rs
//
// Sweet-spot velocity, exponentially smoothed across consecutive ticks.
// Weight fixed at 0.5: tuned against detection noise at ~100 Hz, not a
// config knob. Sign convention: positive = falling (rows grow downward),
// negative = rising.

use super::estimator::TrackerState;

const SMOOTHING: f32 = 0.5;

/// Fold the newest sweet-spot reading into the smoothed velocity.
/// The first reading of a session has no predecessor and leaves the
/// velocity at zero.
pub fn track_velocity(state: &mut TrackerState, sweet_spot_y: f32) {
    if let Some(prev) = state.prev_sweet_spot_y {
        let raw_delta = sweet_spot_y - prev;
        state.smoothed_velocity = SMOOTHING * state.smoothed_velocity + (1.0 - SMOOTHING) * raw_delta;
    }
    state.prev_sweet_spot_y = Some(sweet_spot_y);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> TrackerState {
        TrackerState::new(300, 5)
    }

    #[test]
    fn first_sample_produces_no_velocity() {
        let mut state = fresh();
        track_velocity(&mut state, 150.0);
        assert_eq!(state.smoothed_velocity, 0.0);
        assert_eq!(state.prev_sweet_spot_y, Some(150.0));
    }

    #[test]
    fn constant_motion_converges_to_raw_delta() {
        let mut state = fresh();
        let mut y = 100.0;
        track_velocity(&mut state, y);
        for _ in 0..12 {
            y += 4.0;
            track_velocity(&mut state, y);
        }
        assert!((state.smoothed_velocity - 4.0).abs() < 0.01);
    }

    #[test]
    fn single_spike_is_damped_by_half() {
        let mut state = fresh();
        track_velocity(&mut state, 100.0);
        track_velocity(&mut state, 100.0); // settled, v = 0
        track_velocity(&mut state, 120.0); // raw delta +20
        assert_eq!(state.smoothed_velocity, 10.0);
        track_velocity(&mut state, 120.0); // raw delta 0 decays it
        assert_eq!(state.smoothed_velocity, 5.0);
    }

    #[test]
    fn rising_motion_is_negative() {
        let mut state = fresh();
        track_velocity(&mut state, 200.0);
        track_velocity(&mut state, 190.0);
        assert!(state.smoothed_velocity < 0.0);
    }
}
