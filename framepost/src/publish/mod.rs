//! Publishing pipeline: platform names, the per-platform connectors, and the
//! orchestrator that runs one create-and-post cycle end to end.

pub mod orchestrator;
pub mod platform;
pub mod publisher;

pub use orchestrator::{Orchestrator, PostOutcome, PublishReport};
pub use platform::Platform;
pub use publisher::{PublishFailure, Publisher};
