// src/types.rs

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub capture: CaptureConfig,
    pub colors: ColorConfig,
    pub detection: DetectionConfig,
    pub control: ControlConfig,
    pub session: SessionConfig,
    pub telemetry: TelemetryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Screen region holding the tracking bar (left bar of the minigame UI).
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
    /// Directory of recorded frames for the replay frame source.
    pub frames_dir: String,
    /// Target tick interval. 10 ms ≈ 100 checks per second.
    pub poll_interval_ms: u64,
}

/// Inclusive per-channel RGB range. A pixel matches when every channel
/// sits within [lower, upper].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ColorRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl ColorRange {
    pub fn contains(&self, px: [u8; 3]) -> bool {
        (0..3).all(|c| px[c] >= self.lower[c] && px[c] <= self.upper[c])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorConfig {
    /// Fish marker while we are NOT tracking it (white icon).
    pub fish_white: ColorRange,
    /// Fish marker while tracking is locked on (green icon).
    pub fish_green: ColorRange,
    /// The colored "not your zone" bar sections. The sweet spot is the
    /// gap between them.
    pub zone_bar: ColorRange,
    /// Dark bar background, used for UI presence detection.
    pub bar_background: ColorRange,
    /// Green fill of the progress bar on the right side.
    pub progress_fill: ColorRange,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Minimum matched pixels before a fish marker reading is trusted.
    pub min_fish_pixels: usize,
    /// Minimum dark pixels before the minigame UI counts as visible.
    pub min_bar_pixels: usize,
    /// Sweet-spot moves larger than this per tick are detection glitches.
    pub max_sweet_spot_jump: f32,
    /// Sweet-spot estimates this close to the frame top/bottom are
    /// bar-rendering artifacts and get rejected.
    pub edge_margin: f32,
    /// Ticks at session start during which jump filtering is disabled.
    pub warmup_ticks: u32,
    /// Centroid-to-contact-point offsets for the two marker icons. The
    /// white and green art differ in height, so their measured centroid
    /// sits at different distances from the effective contact row.
    pub white_contact_offset: f32,
    pub green_contact_offset: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Error band (px) inside which bang-bang action is replaced by
    /// braking and pulsing.
    pub dead_zone: f32,
    /// Narrower band used while velocity is not yet trustworthy, for
    /// faster initial convergence.
    pub warmup_dead_zone: f32,
    /// |velocity| above this triggers momentum braking.
    pub brake_velocity: f32,
    /// |error| at or above this is closed with sustained action, no
    /// braking or dead-zone logic.
    pub large_error: f32,
    /// Duty cycle of the position-maintenance pulse. Hold must outweigh
    /// release: gravity only pulls one way.
    pub pulse_hold_ticks: u32,
    pub pulse_release_ticks: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Progress fill above this counts as a catch even while the UI is
    /// still on screen.
    pub progress_caught_threshold: f32,
    /// Settle delay between a catch and the recast click.
    pub recast_delay_ms: f64,
    /// Idle wait longer than this triggers a recast click.
    pub idle_timeout_ms: f64,
    /// Consecutive timeout recasts before the anti-idle escalation.
    pub max_idle_recasts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// JSONL session-event log. Empty string disables it.
    pub events_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

/// One captured tick of the tracking-bar region, RGB8 row-major.
#[derive(Debug, Clone)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: usize,
    pub height: usize,
    pub timestamp_ms: f64,
}

impl Frame {
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let i = (y * self.width + x) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }
}

/// Per-entity, per-tick reduction of a mask to a scalar row.
#[derive(Debug, Clone, Copy)]
pub struct PositionEstimate {
    pub y: Option<f32>,
    pub evidence: usize,
}

/// Actuation decision for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Decision {
    Hold,
    Release,
    /// No decision; the session keeps whatever the button is doing.
    Undetermined,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Hold => "HOLD",
            Decision::Release => "RELEASE",
            Decision::Undetermined => "NONE",
        }
    }
}

// Defaults mirror config.yaml so tests can build configs without YAML.

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            left: 1035,
            top: 429,
            width: 48,
            height: 303,
            frames_dir: "frames".to_string(),
            poll_interval_ms: 10,
        }
    }
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            fish_white: ColorRange {
                lower: [200, 200, 200],
                upper: [255, 255, 255],
            },
            fish_green: ColorRange {
                lower: [140, 220, 100],
                upper: [200, 255, 160],
            },
            zone_bar: ColorRange {
                lower: [50, 140, 220],
                upper: [120, 200, 255],
            },
            bar_background: ColorRange {
                lower: [0, 0, 0],
                upper: [50, 50, 50],
            },
            progress_fill: ColorRange {
                lower: [0, 200, 0],
                upper: [100, 255, 100],
            },
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_fish_pixels: 10,
            min_bar_pixels: 500,
            max_sweet_spot_jump: 50.0,
            edge_margin: 8.0,
            warmup_ticks: 5,
            white_contact_offset: 0.0,
            green_contact_offset: 4.0,
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            dead_zone: 20.0,
            warmup_dead_zone: 5.0,
            brake_velocity: 8.0,
            large_error: 30.0,
            pulse_hold_ticks: 5,
            pulse_release_ticks: 1,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            progress_caught_threshold: 0.95,
            recast_delay_ms: 1000.0,
            idle_timeout_ms: 30_000.0,
            max_idle_recasts: 3,
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            events_path: "events.jsonl".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capture: CaptureConfig::default(),
            colors: ColorConfig::default(),
            detection: DetectionConfig::default(),
            control: ControlConfig::default(),
            session: SessionConfig::default(),
            telemetry: TelemetryConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
