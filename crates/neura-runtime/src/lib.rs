//! NEURA Runtime - session orchestration and the sampling loop
//!
//! Each refresh tick runs one pass:
//! 1. Apply live settings (sensitivity, narration, ambient)
//! 2. Poll the frame source; defer if not ready
//! 3. Run inference (at most one in flight)
//! 4. Stabilize the result
//! 5. Record history
//! 6. Gamify
//! 7. Dispatch effects
//!
//! Stages 4-7 are synchronous and owned by a single [`Session`].

pub mod config;
pub mod session;
pub mod sampler;
pub mod pipeline;
pub mod telemetry;

pub use config::*;
pub use session::*;
pub use sampler::*;
pub use pipeline::*;
pub use telemetry::*;
