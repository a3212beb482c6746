// src/session.rs
//
// Lifecycle state machine: Idle → Tracking → Caught → Idle, cyclic.
// Owns the per-session TrackerState and ControllerPhase and resets them
// on every Idle→Tracking transition. One tick = one frame through the
// whole pipeline plus at most one actuator call.

use crate::actuator::Actuator;
use crate::controller::{ControlInputs, Controller, ControllerPhase};
use crate::detection::{classify, kinematics, progress_fill, ui_visible};
use crate::detection::{PositionEstimator, TrackerState};
use crate::types::{Config, Decision, Frame};
use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    /// Waiting for a bite; the minigame UI is not on screen.
    Idle,
    /// Minigame active, controller in charge.
    Tracking,
    /// Fish caught, waiting out the settle delay before the recast.
    Caught,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "IDLE",
            SessionState::Tracking => "TRACKING",
            SessionState::Caught => "CAUGHT",
        }
    }
}

/// Discrete lifecycle events, surfaced for the telemetry sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionEvent {
    BiteDetected,
    Caught,
    Recast,
    IdleRecast,
    AntiIdle,
}

/// Per-tick observability snapshot. Side-effect-only: nothing feeds
/// back into the pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    pub state: &'static str,
    pub fish_y: Option<f32>,
    pub sweet_spot_y: Option<f32>,
    pub velocity: f32,
    pub decision: Decision,
    pub is_holding: bool,
    pub progress: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<SessionEvent>,
}

pub struct Session {
    config: Config,
    estimator: PositionEstimator,
    controller: Controller,

    state: SessionState,
    tracker: TrackerState,
    phase: ControllerPhase,

    idle_since_ms: f64,
    caught_at_ms: f64,
    consecutive_idle_recasts: u32,

    pub catches: u64,
    pub idle_recasts: u64,
    pub anti_idle_actions: u64,
}

impl Session {
    pub fn new(config: Config) -> Self {
        let estimator = PositionEstimator::new(config.detection.clone());
        let controller = Controller::new(config.control.clone());
        let frame_height = config.capture.height as usize;
        Self {
            estimator,
            controller,
            state: SessionState::Idle,
            tracker: TrackerState::new(frame_height, config.detection.warmup_ticks),
            phase: ControllerPhase::default(),
            idle_since_ms: 0.0,
            caught_at_ms: 0.0,
            consecutive_idle_recasts: 0,
            catches: 0,
            idle_recasts: 0,
            anti_idle_actions: 0,
            config,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_holding(&self) -> bool {
        self.phase.is_holding
    }

    pub fn idle_elapsed_ms(&self, now_ms: f64) -> f64 {
        now_ms - self.idle_since_ms
    }

    pub fn consecutive_idle_recasts(&self) -> u32 {
        self.consecutive_idle_recasts
    }

    pub fn sweet_spot_seed(&self) -> f32 {
        self.tracker.seed_y
    }

    /// One full pipeline pass over one captured frame.
    pub fn tick(&mut self, frame: &Frame, actuator: &mut dyn Actuator) -> Result<TickReport> {
        match self.state {
            SessionState::Idle => self.tick_idle(frame, actuator),
            SessionState::Tracking => self.tick_tracking(frame, actuator),
            SessionState::Caught => self.tick_caught(frame, actuator),
        }
    }

    fn tick_idle(&mut self, frame: &Frame, actuator: &mut dyn Actuator) -> Result<TickReport> {
        let masks = classify(frame, &self.config.colors);

        if ui_visible(&masks, &self.config.detection) {
            info!("🎣 Fish on the line → TRACKING");
            self.tracker =
                TrackerState::new(frame.height, self.config.detection.warmup_ticks);
            self.phase = ControllerPhase::default();
            self.consecutive_idle_recasts = 0;
            // The sweet spot drops the instant the minigame opens; start
            // holding before the first estimate lands.
            actuator.press()?;
            self.phase.is_holding = true;
            self.state = SessionState::Tracking;
            return Ok(self.report(Decision::Hold, 0.0, Some(SessionEvent::BiteDetected)));
        }

        let mut event = None;
        if frame.timestamp_ms - self.idle_since_ms >= self.config.session.idle_timeout_ms {
            self.consecutive_idle_recasts += 1;
            self.idle_recasts += 1;
            self.idle_since_ms = frame.timestamp_ms;
            warn!(
                "⏰ Idle timeout, recasting ({}/{})",
                self.consecutive_idle_recasts, self.config.session.max_idle_recasts
            );
            actuator.click()?;
            event = Some(SessionEvent::IdleRecast);

            if self.consecutive_idle_recasts >= self.config.session.max_idle_recasts {
                warn!("🚨 Recasts not biting, running anti-idle movement");
                actuator.wiggle()?;
                self.anti_idle_actions += 1;
                self.consecutive_idle_recasts = 0;
                event = Some(SessionEvent::AntiIdle);
            }
        }

        Ok(self.report(Decision::Undetermined, 0.0, event))
    }

    fn tick_tracking(&mut self, frame: &Frame, actuator: &mut dyn Actuator) -> Result<TickReport> {
        let masks = classify(frame, &self.config.colors);
        let progress = progress_fill(frame, &self.config.colors.progress_fill);

        let ui_gone = !ui_visible(&masks, &self.config.detection);
        if ui_gone || progress > self.config.session.progress_caught_threshold {
            info!(
                "✅ Fish caught ({}) → CAUGHT",
                if ui_gone { "bars gone" } else { "progress full" }
            );
            actuator.release()?;
            self.phase.is_holding = false;
            self.caught_at_ms = frame.timestamp_ms;
            self.catches += 1;
            self.state = SessionState::Caught;
            return Ok(self.report(Decision::Release, progress, Some(SessionEvent::Caught)));
        }

        let fish = self.estimator.fish_position(&masks, &mut self.tracker);
        let sweet = self.estimator.sweet_spot_position(&masks, &mut self.tracker);
        if let Some(y) = sweet.y {
            kinematics::track_velocity(&mut self.tracker, y);
        }

        let inputs = ControlInputs {
            fish_y: fish.y,
            sweet_spot_y: sweet.y,
            fish_tracked: self.tracker.fish_tracked,
            velocity: self.tracker.smoothed_velocity,
            seed_y: self.tracker.seed_y,
            frame_height: frame.height as f32,
        };
        let decision = self.controller.decide(&inputs, &mut self.phase);

        match decision {
            Decision::Hold => actuator.press()?,
            Decision::Release => actuator.release()?,
            Decision::Undetermined => {}
        }

        debug!(
            "fish={:?} sweet={:?} v={:+.1} → {}",
            fish.y,
            sweet.y,
            self.tracker.smoothed_velocity,
            decision.as_str()
        );

        Ok(self.report(decision, progress, None))
    }

    fn tick_caught(&mut self, frame: &Frame, actuator: &mut dyn Actuator) -> Result<TickReport> {
        let mut event = None;
        if frame.timestamp_ms - self.caught_at_ms >= self.config.session.recast_delay_ms {
            info!("🪝 Recasting → IDLE");
            actuator.click()?;
            self.state = SessionState::Idle;
            self.idle_since_ms = frame.timestamp_ms;
            event = Some(SessionEvent::Recast);
        }
        Ok(self.report(Decision::Undetermined, 0.0, event))
    }

    fn report(&self, decision: Decision, progress: f32, event: Option<SessionEvent>) -> TickReport {
        TickReport {
            state: self.state.as_str(),
            fish_y: self.tracker.last_fish_y,
            sweet_spot_y: Some(self.tracker.last_sweet_spot_y),
            velocity: self.tracker.smoothed_velocity,
            decision,
            is_holding: self.phase.is_holding,
            progress,
            event,
        }
    }
}
