//! Screenloop Capture - pixel acquisition for the recorder
//!
//! This crate defines the seam between the recorder and the OS screen-grab
//! facility, and ships an X11 MIT-SHM backend for it.

pub mod x11_capture;

pub use screenloop_core::{Frame, Region};
pub use x11_capture::X11Capture;

use screenloop_core::{Error, Result};

/// A source of captured frames
///
/// `capture` samples the display once, for the given region or the whole
/// display when absent. Sources are `Send` because a recording session moves
/// its source into the background worker thread and takes it back on stop.
pub trait CaptureSource: Send {
    /// Capture a single frame of the given region, or the full display
    fn capture(&mut self, region: Option<&Region>) -> Result<Frame>;
}

/// Detect if running under Wayland
pub fn is_wayland() -> bool {
    std::env::var("XDG_SESSION_TYPE")
        .map(|v| v == "wayland")
        .unwrap_or(false)
        || std::env::var("WAYLAND_DISPLAY").is_ok()
}

/// Create the capture source for the current session type
///
/// Only X11 sessions are supported; Wayland compositors do not expose the
/// root window for reading, so constructing a source there fails up front
/// instead of producing black frames.
pub fn default_source() -> Result<X11Capture> {
    if is_wayland() {
        return Err(Error::Unsupported(
            "Wayland session detected, X11 is required for screen capture".to_string(),
        ));
    }
    X11Capture::new()
}
