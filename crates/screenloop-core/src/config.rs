//! Configuration types for screenloop

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Recorder configuration
///
/// `fps` sets the minimum spacing between captures; the poll and pause values
/// tune how the capture worker waits. The defaults keep the failure pause two
/// orders of magnitude above the idle poll so a broken capture source cannot
/// spin hot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecorderConfig {
    /// Target frame rate in frames per second
    pub fps: f64,
    /// Sleep between cadence checks while waiting for the next frame slot
    pub idle_poll_ms: u64,
    /// Sleep after a failed capture before retrying
    pub failure_pause_ms: u64,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            fps: 30.0,
            idle_poll_ms: 1,
            failure_pause_ms: 100,
        }
    }
}

impl RecorderConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: set frame rate
    pub fn with_fps(mut self, fps: f64) -> Self {
        self.fps = fps;
        self
    }

    /// Builder pattern: set the idle poll interval
    pub fn with_idle_poll_ms(mut self, ms: u64) -> Self {
        self.idle_poll_ms = ms;
        self
    }

    /// Builder pattern: set the failure pause
    pub fn with_failure_pause_ms(mut self, ms: u64) -> Self {
        self.failure_pause_ms = ms;
        self
    }

    /// Minimum spacing between captures, `1 / fps` seconds
    pub fn frame_interval(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / self.fps).unwrap_or(Duration::ZERO)
    }

    /// Sleep between cadence checks
    pub fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.idle_poll_ms)
    }

    /// Sleep after a failed capture
    pub fn failure_pause(&self) -> Duration {
        Duration::from_millis(self.failure_pause_ms)
    }

    /// Check that the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if !self.fps.is_finite() || self.fps <= 0.0 {
            return Err(Error::Config(format!(
                "fps must be a positive number, got {}",
                self.fps
            )));
        }
        Ok(())
    }
}
