//! Observability for the worker: subscriber setup and per-iteration log scoping.

pub mod logging;
pub mod scope;

pub use logging::{init_from_settings, init_logging, parse_level, LogFormat};
pub use scope::{worker_span, IterationScope, LoopId};
