//! Testing utilities for duocam
//!
//! Hardware-free capture and ready-made library fixtures for offline tests.

pub mod synthetic_data;

pub use synthetic_data::{
    synthetic_payload,
    synthetic_recording,
    ChannelEvent,
    SyntheticCaptureBackend,
    SYNTHETIC_MAGIC,
};
