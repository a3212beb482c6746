// src/main.rs

mod actuator;
mod capture;
mod config;
mod controller;
mod detection;
mod session;
mod types;

use actuator::{Actuator, SimulatedActuator};
use anyhow::Result;
use capture::{FrameSource, ReplayCapture};
use session::{Session, SessionEvent};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use types::Config;

fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.yaml".to_string());
    let config = Config::load(&config_path)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!("autofisher={}", config.logging.level))
        .init();

    info!("🎣 Fishing autopilot starting");
    info!(
        "Region {}x{} at ({}, {}), tick every {} ms",
        config.capture.width,
        config.capture.height,
        config.capture.left,
        config.capture.top,
        config.capture.poll_interval_ms
    );
    info!(
        "Control: dead_zone={:.0}, brake_v={:.0}, large_error={:.0}, pulse={}:{}",
        config.control.dead_zone,
        config.control.brake_velocity,
        config.control.large_error,
        config.control.pulse_hold_ticks,
        config.control.pulse_release_ticks
    );

    let mut capture = ReplayCapture::new(&config.capture.frames_dir)?;
    let mut actuator = SimulatedActuator::new();

    // Cooperative cancellation: a frontend (hotkey handler, supervisor)
    // flips these; the loop checks them once per iteration.
    let running = Arc::new(AtomicBool::new(true));
    let enabled = Arc::new(AtomicBool::new(true));

    let stats = run_loop(
        &config,
        &mut capture,
        &mut actuator,
        running.clone(),
        enabled.clone(),
    );

    // Ordered teardown: never exit with the button held.
    actuator.release()?;
    let stats = stats?;

    info!("\n📊 Final report:");
    info!("  Ticks processed: {}", stats.ticks);
    info!("  🐟 Catches: {}", stats.catches);
    info!("  ⏰ Idle recasts: {}", stats.idle_recasts);
    info!("  🚨 Anti-idle actions: {}", stats.anti_idle_actions);
    info!("  Tick rate: {:.1}/s", stats.ticks_per_sec);
    info!("Goodbye 👋");
    Ok(())
}

struct RunStats {
    ticks: u64,
    catches: u64,
    idle_recasts: u64,
    anti_idle_actions: u64,
    ticks_per_sec: f64,
}

fn run_loop(
    config: &Config,
    capture: &mut dyn FrameSource,
    actuator: &mut dyn Actuator,
    running: Arc<AtomicBool>,
    enabled: Arc<AtomicBool>,
) -> Result<RunStats> {
    let mut session = Session::new(config.clone());
    let mut events = open_event_log(&config.telemetry.events_path)?;
    let interval = Duration::from_millis(config.capture.poll_interval_ms);
    let started = Instant::now();
    let mut ticks: u64 = 0;

    while running.load(Ordering::Relaxed) {
        let tick_start = Instant::now();

        if enabled.load(Ordering::Relaxed) {
            let Some(frame) = capture.grab()? else {
                info!("Frame source exhausted, stopping");
                break;
            };
            let report = session.tick(&frame, actuator)?;
            ticks += 1;

            if let Some(event) = report.event {
                log_event(&mut events, event, frame.timestamp_ms, &session)?;
            }

            if ticks % 100 == 0 {
                debug!(
                    "tick {}: state={} fish={:?} sweet={:?} v={:+.1} holding={} idle={:.0}ms recasts={}",
                    ticks,
                    report.state,
                    report.fish_y,
                    report.sweet_spot_y,
                    report.velocity,
                    session.is_holding(),
                    session.idle_elapsed_ms(frame.timestamp_ms),
                    session.consecutive_idle_recasts()
                );
            }
        }

        if let Some(remaining) = interval.checked_sub(tick_start.elapsed()) {
            std::thread::sleep(remaining);
        }
    }

    if let Some(f) = events.as_mut() {
        f.flush()?;
    }

    let elapsed = started.elapsed().as_secs_f64();
    Ok(RunStats {
        ticks,
        catches: session.catches,
        idle_recasts: session.idle_recasts,
        anti_idle_actions: session.anti_idle_actions,
        ticks_per_sec: ticks as f64 / elapsed.max(f64::EPSILON),
    })
}

fn open_event_log(path: &str) -> Result<Option<std::fs::File>> {
    if path.is_empty() {
        return Ok(None);
    }
    let file = std::fs::File::create(path)?;
    info!("💾 Session events → {}", path);
    Ok(Some(file))
}

fn log_event(
    sink: &mut Option<std::fs::File>,
    event: SessionEvent,
    timestamp_ms: f64,
    session: &Session,
) -> Result<()> {
    let Some(file) = sink.as_mut() else {
        return Ok(());
    };
    let line = serde_json::json!({
        "event": event,
        "timestamp_ms": timestamp_ms,
        "state": session.state().as_str(),
        "catches": session.catches,
        "idle_recasts": session.idle_recasts,
    });
    writeln!(file, "{}", serde_json::to_string(&line)?)?;
    file.flush()?;
    Ok(())
}
