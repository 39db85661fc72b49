//! The polling worker: loop controller, message processing and shutdown wiring.

pub mod controller;
pub mod processor;
pub mod shutdown;

pub use controller::{
    IterationOutcome, LoopController, LoopSettings, RunSummary, StopReason,
};
pub use processor::{MessageProcessor, SimulatedProcessor};
pub use shutdown::spawn_shutdown_listener;
