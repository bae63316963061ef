//! Screenloop - timed screen capture into in-memory frame sequences
//!
//! A [`Recorder`] samples a display region at a target frame rate on a
//! background worker thread and hands the accumulated frames back on stop:
//!
//! ```no_run
//! use screenloop::{default_source, Recorder, RecorderConfig, Region};
//!
//! # fn main() -> screenloop::Result<()> {
//! let source = default_source()?;
//! let mut recorder = Recorder::new(source, RecorderConfig::new().with_fps(10.0))?;
//!
//! recorder.start(Some(Region::new(0, 0, 640, 480)));
//! std::thread::sleep(std::time::Duration::from_secs(2));
//! let frames = recorder.stop();
//!
//! println!("captured {} frames", frames.len());
//! # Ok(())
//! # }
//! ```

pub mod recorder;

pub use recorder::Recorder;
pub use screenloop_capture::{default_source, is_wayland, CaptureSource, X11Capture};
pub use screenloop_core::{Error, Frame, RecorderConfig, Region, Result};
