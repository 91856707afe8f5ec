//! Dual-channel capture session
//!
//! The controller drives a front and a back channel through a
//! [`CaptureBackend`] and enforces the recording ceiling with a 100 ms tick.
//!
//! # Example
//! ```rust,ignore
//! use duocam::capture::CaptureSessionController;
//! use duocam::config::CaptureConfig;
//!
//! let controller = CaptureSessionController::simulated(CaptureConfig::default());
//! let mut completions = controller.subscribe_completions();
//!
//! controller.start().await;
//! // ... later, or let the 15 s ceiling stop it:
//! let outcome = controller.stop().await;
//! ```

mod backend;
mod controller;
mod types;

pub use backend::{CaptureBackend, NullCaptureBackend};
pub use controller::CaptureSessionController;
pub use types::{CaptureMode, CaptureOutcome, CaptureStatus, OutcomeSource};
