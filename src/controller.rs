// src/controller.rs
//
// The actuation decision engine: an ordered rule chain evaluated every
// tick, first match wins. Priority order encodes "recover from large
// error" > "prevent momentum overshoot" > "track precisely" > "maintain
// position against gravity":
//
//   1. missing data            → dither (4-tick hold/release cycle)
//   2. stuck at seed, |v|≈0    → dither
//   3. large error             → sustained hold/release
//   4. |v| over brake limit    → oppose the velocity
//   5. outside dead zone       → hold/release by error sign
//   6. inside dead zone        → edge pinning / brake-out / pulse cycle

use crate::types::{ControlConfig, Decision};
use tracing::debug;

// ============================================================================
// FIXED TUNING (not config: these are tied to the rule chain itself)
// ============================================================================
/// Full dither period while signal is lost (hold half, release half).
const DITHER_CYCLE_TICKS: u32 = 4;
/// Velocity below this while parked at the seed means the estimator
/// never acquired a real reading.
const SEED_STUCK_VELOCITY: f32 = 0.5;
/// Velocity below this means it is not trustworthy yet (session warmup).
const WARMUP_VELOCITY: f32 = 0.1;
/// In-zone residual drift worth braking against.
const DRIFT_VELOCITY: f32 = 1.5;
/// Ticks of counter-action allowed to arrest in-zone drift.
const BRAKE_TICKS_NEEDED: u32 = 5;
/// Distance from a travel limit that counts as "at the edge".
const EDGE_STEADY_BAND: f32 = 15.0;

/// Per-session controller state, created fresh at Idle→Tracking.
/// `is_holding` always mirrors the last command issued.
#[derive(Debug, Clone, Default)]
pub struct ControllerPhase {
    pub is_holding: bool,
    pub in_dead_zone: bool,
    pub brake_ticks: u32,
    pub pulse_index: u32,
}

/// Everything the rule chain looks at on one tick.
#[derive(Debug, Clone, Copy)]
pub struct ControlInputs {
    pub fish_y: Option<f32>,
    pub sweet_spot_y: Option<f32>,
    /// Marker showing its green "locked on" art.
    pub fish_tracked: bool,
    pub velocity: f32,
    /// Session-start seed of the sweet-spot estimate.
    pub seed_y: f32,
    pub frame_height: f32,
}

pub struct Controller {
    cfg: ControlConfig,
}

impl Controller {
    pub fn new(cfg: ControlConfig) -> Self {
        Self { cfg }
    }

    pub fn decide(&self, inputs: &ControlInputs, phase: &mut ControllerPhase) -> Decision {
        // Rule 1: either position unknown. Dither instead of locking up.
        let (Some(fish_y), Some(sweet_y)) = (inputs.fish_y, inputs.sweet_spot_y) else {
            debug!("signal lost, dithering");
            return self.dither(phase);
        };

        // Rule 2: estimate never left the seed and nothing is moving,
        // so the estimator has not acquired a real reading yet.
        if sweet_y == inputs.seed_y && inputs.velocity.abs() < SEED_STUCK_VELOCITY {
            debug!("sweet spot stuck at seed {:.1}, dithering", inputs.seed_y);
            return self.dither(phase);
        }

        // Negative error: fish above the sweet spot, hold to rise.
        let error = fish_y - sweet_y;

        // Rule 3: large errors are closed flat-out; braking and dead-zone
        // logic only exist to prevent oscillation near convergence.
        if error.abs() >= self.cfg.large_error {
            phase.in_dead_zone = false;
            return self.command(phase, error < 0.0);
        }

        let in_warmup = inputs.velocity.abs() < WARMUP_VELOCITY;

        // Rule 4: momentum brake. Oppose the velocity before the error
        // ever reaches the dead zone.
        if !in_warmup && inputs.velocity.abs() > self.cfg.brake_velocity {
            phase.in_dead_zone = false;
            debug!("braking against v={:+.1}", inputs.velocity);
            return self.command(phase, inputs.velocity > 0.0);
        }

        let dead_zone = if in_warmup {
            self.cfg.warmup_dead_zone
        } else {
            self.cfg.dead_zone
        };

        // Rule 5: plain proportional tracking outside the dead zone.
        if error.abs() > dead_zone {
            phase.in_dead_zone = false;
            return self.command(phase, error < 0.0);
        }

        // Rule 6: inside the dead zone.
        if !phase.in_dead_zone {
            phase.in_dead_zone = true;
            phase.brake_ticks = 0;
            phase.pulse_index = 0;
            debug!("entering dead zone, v={:+.1}", inputs.velocity);
        }

        let near_top = sweet_y <= EDGE_STEADY_BAND;
        let near_bottom = sweet_y >= inputs.frame_height - EDGE_STEADY_BAND;

        // Pinned at a travel limit while locked on: steady action toward
        // that limit beats dithering right at the edge.
        if inputs.fish_tracked && near_top {
            return self.command(phase, true);
        }
        if inputs.fish_tracked && near_bottom {
            return self.command(phase, false);
        }
        // Lost tracking AND sitting at the bottom limit: climb back out.
        if !inputs.fish_tracked && near_bottom {
            return self.command(phase, true);
        }

        // Residual drift: counter it for a bounded number of ticks.
        if inputs.velocity > DRIFT_VELOCITY && phase.brake_ticks < BRAKE_TICKS_NEEDED {
            phase.brake_ticks += 1;
            return self.command(phase, true);
        }
        if inputs.velocity < -DRIFT_VELOCITY && phase.brake_ticks < BRAKE_TICKS_NEEDED {
            phase.brake_ticks += 1;
            return self.command(phase, false);
        }

        // Velocity arrested: pulse-width maintenance. The duty cycle is
        // hold-biased because gravity only pulls downward.
        let cycle = self.cfg.pulse_hold_ticks + self.cfg.pulse_release_ticks;
        let idx = phase.pulse_index % cycle.max(1);
        phase.pulse_index = (idx + 1) % cycle.max(1);
        self.command(phase, idx < self.cfg.pulse_hold_ticks)
    }

    fn command(&self, phase: &mut ControllerPhase, hold: bool) -> Decision {
        phase.is_holding = hold;
        if hold {
            Decision::Hold
        } else {
            Decision::Release
        }
    }

    fn dither(&self, phase: &mut ControllerPhase) -> Decision {
        phase.in_dead_zone = false;
        let idx = phase.pulse_index % DITHER_CYCLE_TICKS;
        phase.pulse_index = (idx + 1) % DITHER_CYCLE_TICKS;
        self.command(phase, idx < DITHER_CYCLE_TICKS / 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ControlConfig;

    const HEIGHT: f32 = 300.0;
    const SEED: f32 = 150.0;

    fn controller() -> Controller {
        Controller::new(ControlConfig::default())
    }

    fn inputs(fish_y: f32, sweet_y: f32, velocity: f32) -> ControlInputs {
        ControlInputs {
            fish_y: Some(fish_y),
            sweet_spot_y: Some(sweet_y),
            fish_tracked: false,
            velocity,
            seed_y: SEED,
            frame_height: HEIGHT,
        }
    }

    #[test]
    fn missing_data_dithers_half_hold_half_release() {
        let ctl = controller();
        let mut phase = ControllerPhase::default();
        let lost = ControlInputs {
            fish_y: None,
            ..inputs(0.0, 0.0, 0.0)
        };
        let seq: Vec<Decision> = (0..8).map(|_| ctl.decide(&lost, &mut phase)).collect();
        assert_eq!(
            seq,
            vec![
                Decision::Hold,
                Decision::Hold,
                Decision::Release,
                Decision::Release,
                Decision::Hold,
                Decision::Hold,
                Decision::Release,
                Decision::Release,
            ]
        );
    }

    #[test]
    fn stuck_at_seed_with_flat_velocity_dithers() {
        let ctl = controller();
        let mut phase = ControllerPhase::default();
        let stuck = inputs(SEED + 2.0, SEED, 0.2);
        let seq: Vec<Decision> = (0..4).map(|_| ctl.decide(&stuck, &mut phase)).collect();
        assert_eq!(seq[0], Decision::Hold);
        assert_eq!(seq[2], Decision::Release);
        // A moving sweet spot at the same value is NOT stuck.
        let moving = inputs(SEED + 2.0, SEED, 3.0);
        let got = ctl.decide(&moving, &mut phase);
        assert_ne!(got, Decision::Undetermined);
        assert!(phase.in_dead_zone);
    }

    #[test]
    fn large_error_overrides_everything_on_every_tick() {
        let ctl = controller();
        let mut phase = ControllerPhase::default();
        // Fish 50 px below: sustained release, tick after tick.
        for _ in 0..10 {
            assert_eq!(ctl.decide(&inputs(170.0, 120.0, 0.0), &mut phase), Decision::Release);
            assert!(!phase.is_holding);
        }
        // Fish 50 px above: sustained hold, regardless of phase history.
        for _ in 0..10 {
            assert_eq!(ctl.decide(&inputs(70.0, 120.0, 0.0), &mut phase), Decision::Hold);
            assert!(phase.is_holding);
        }
    }

    #[test]
    fn brake_takes_precedence_over_dead_zone_pulsing() {
        let ctl = controller();
        let mut phase = ControllerPhase::default();
        // Error of 5 px is inside the dead zone, but falling at +20
        // (over brake_velocity = 8) must be met with a hold.
        assert_eq!(ctl.decide(&inputs(125.0, 120.0, 20.0), &mut phase), Decision::Hold);
        assert!(!phase.in_dead_zone);
        // Rising fast: release.
        assert_eq!(ctl.decide(&inputs(125.0, 120.0, -20.0), &mut phase), Decision::Release);
    }

    #[test]
    fn outside_dead_zone_tracks_error_sign() {
        let ctl = controller();
        let mut phase = ControllerPhase::default();
        // 25 px below large_error but above dead_zone, velocity modest.
        assert_eq!(ctl.decide(&inputs(95.0, 120.0, 1.0), &mut phase), Decision::Hold);
        assert_eq!(ctl.decide(&inputs(145.0, 120.0, 1.0), &mut phase), Decision::Release);
    }

    #[test]
    fn dead_zone_pulse_matches_configured_duty_cycle() {
        let ctl = controller();
        let mut phase = ControllerPhase::default();
        let settled = inputs(120.0, 120.0, 0.0);

        let mut holds = 0;
        let mut releases = 0;
        for _ in 0..24 {
            match ctl.decide(&settled, &mut phase) {
                Decision::Hold => holds += 1,
                Decision::Release => releases += 1,
                Decision::Undetermined => panic!("settled tick must decide"),
            }
        }
        // 5:1 duty cycle over 24 ticks = 4 full cycles.
        assert_eq!(holds, 20);
        assert_eq!(releases, 4);
    }

    #[test]
    fn dead_zone_entry_resets_pulse_and_brake_counters() {
        let ctl = controller();
        let mut phase = ControllerPhase::default();
        phase.pulse_index = 3;
        phase.brake_ticks = 4;
        ctl.decide(&inputs(120.0, 120.0, 0.0), &mut phase);
        assert!(phase.in_dead_zone);
        // Counters were zeroed before the first pulse tick ran.
        assert_eq!(phase.pulse_index, 1);
        assert_eq!(phase.brake_ticks, 0);
    }

    #[test]
    fn in_zone_drift_is_braked_before_pulsing_starts() {
        let ctl = controller();
        let mut phase = ControllerPhase::default();
        // Falling at 3 px/tick inside the zone: hold until the brake
        // budget runs out.
        for _ in 0..BRAKE_TICKS_NEEDED {
            assert_eq!(ctl.decide(&inputs(120.0, 120.0, 3.0), &mut phase), Decision::Hold);
        }
        // Budget exhausted: falls through to the pulse cycle.
        assert_eq!(ctl.decide(&inputs(120.0, 120.0, 3.0), &mut phase), Decision::Hold);
        assert_eq!(phase.pulse_index, 1);

        // Rising drift brakes the other way.
        let mut phase = ControllerPhase::default();
        assert_eq!(ctl.decide(&inputs(120.0, 120.0, -3.0), &mut phase), Decision::Release);
    }

    #[test]
    fn locked_marker_at_travel_limits_pins_steadily() {
        let ctl = controller();
        let mut phase = ControllerPhase::default();
        let mut top = inputs(10.0, 10.0, 0.0);
        top.fish_tracked = true;
        for _ in 0..6 {
            assert_eq!(ctl.decide(&top, &mut phase), Decision::Hold);
        }
        let mut bottom = inputs(292.0, 292.0, 0.0);
        bottom.fish_tracked = true;
        for _ in 0..6 {
            assert_eq!(ctl.decide(&bottom, &mut phase), Decision::Release);
        }
    }

    #[test]
    fn untracked_marker_at_bottom_edge_recovers_with_hold() {
        let ctl = controller();
        let mut phase = ControllerPhase::default();
        let sunk = inputs(292.0, 292.0, 0.0);
        for _ in 0..6 {
            assert_eq!(ctl.decide(&sunk, &mut phase), Decision::Hold);
        }
    }

    #[test]
    fn warmup_uses_the_narrow_dead_zone() {
        let ctl = controller();
        let mut phase = ControllerPhase::default();
        // 10 px error with velocity ~0: inside the normal zone (20) but
        // outside the warmup zone (5), so warmup reacts immediately.
        assert_eq!(ctl.decide(&inputs(110.0, 120.0, 0.0), &mut phase), Decision::Hold);
        assert!(!phase.in_dead_zone);
    }
}
