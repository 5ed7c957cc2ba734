//! NEURA Core - Fundamental types and primitives
//!
//! This crate defines the core types used throughout NEURA:
//! - Emotion labels and their static profiles (points, tone, narration)
//! - Expression scores and detections handed over by the inference model
//! - Achievement definitions
//! - Session timestamps
//! - Pipeline events and errors

pub mod emotion;
pub mod classification;
pub mod achievement;
pub mod time;
pub mod event;
pub mod error;

pub use emotion::*;
pub use classification::*;
pub use achievement::*;
pub use time::*;
pub use event::*;
pub use error::*;
