//! Screenloop Core - Shared types for screen recording
//!
//! This crate provides the foundational types used across all screenloop
//! components.

pub mod config;
pub mod error;
pub mod frame;
pub mod region;

pub use config::RecorderConfig;
pub use error::{Error, Result};
pub use frame::Frame;
pub use region::Region;
