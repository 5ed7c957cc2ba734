//! NEURA Test Harness - simulated sessions and pipeline validation
//!
//! This crate provides:
//! - Scripted frame sources and detectors
//! - A synchronous session simulator
//! - Chaos detectors (failures, dropped faces, noise, latency)
//! - An end-to-end scenario harness with invariant checks

pub mod simulator;
pub mod chaos;
pub mod integration;

pub use simulator::*;
pub use chaos::*;
pub use integration::*;
