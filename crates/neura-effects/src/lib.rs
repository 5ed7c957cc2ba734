//! NEURA Effects - side effects of emotion transitions and unlocks
//!
//! This is NOT an audio engine or a renderer.
//! Speech, oscillators and particles are external capabilities behind
//! [`EffectSink`]; this crate decides WHEN and WITH WHAT to call them.
//!
//! Key concepts:
//! - Effects are applied exactly once per session event
//! - Timers (fades, delays, popups) are keyed, cancellable, fire-once tasks
//! - A failing sink never affects detection or progression

pub mod sink;
pub mod scheduler;
pub mod ambient;
pub mod celebration;
pub mod dispatcher;

pub use sink::*;
pub use scheduler::*;
pub use ambient::*;
pub use celebration::*;
pub use dispatcher::*;
