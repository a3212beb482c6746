// src/actuator.rs
//
// Synthetic-input boundary. The session only ever talks to the Actuator
// trait; platform input backends (and the test fake) live behind it.

use anyhow::Result;
use std::time::Duration;
use tracing::{debug, info};

/// One logical button. `press`/`release` are idempotent: pressing an
/// already-held button is a no-op, so the controller can re-issue its
/// decision every tick without flooding the OS.
pub trait Actuator {
    fn press(&mut self) -> Result<()>;
    fn release(&mut self) -> Result<()>;
    /// Press + short delay + release, forcing a release first. Used for
    /// casting and recasting.
    fn click(&mut self) -> Result<()>;
    /// Anti-idle escalation: a small simulated movement that resets the
    /// game's AFK detection without disturbing the cast.
    fn wiggle(&mut self) -> Result<()>;
}

/// Log-only actuator for replay runs and dry testing against recorded
/// frame dumps. State-tracks the button so the idempotency contract is
/// exercised the same way a live backend would.
pub struct SimulatedActuator {
    holding: bool,
    click_delay: Duration,
}

impl SimulatedActuator {
    pub fn new() -> Self {
        Self {
            holding: false,
            click_delay: Duration::from_millis(50),
        }
    }

    pub fn is_holding(&self) -> bool {
        self.holding
    }
}

impl Default for SimulatedActuator {
    fn default() -> Self {
        Self::new()
    }
}

impl Actuator for SimulatedActuator {
    fn press(&mut self) -> Result<()> {
        if !self.holding {
            self.holding = true;
            debug!("🖱️  press");
        }
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        if self.holding {
            self.holding = false;
            debug!("🖱️  release");
        }
        Ok(())
    }

    fn click(&mut self) -> Result<()> {
        self.release()?;
        debug!("🖱️  click ({}ms)", self.click_delay.as_millis());
        Ok(())
    }

    fn wiggle(&mut self) -> Result<()> {
        info!("🖱️  anti-idle wiggle");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_and_release_are_idempotent() {
        let mut actuator = SimulatedActuator::new();
        actuator.press().unwrap();
        actuator.press().unwrap();
        assert!(actuator.is_holding());
        actuator.release().unwrap();
        actuator.release().unwrap();
        assert!(!actuator.is_holding());
    }

    #[test]
    fn click_forces_release_first() {
        let mut actuator = SimulatedActuator::new();
        actuator.press().unwrap();
        actuator.click().unwrap();
        assert!(!actuator.is_holding());
    }
}
