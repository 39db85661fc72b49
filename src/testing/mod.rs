//! Testing utilities and mock implementations
//!
//! Doubles for every collaborator of the polling loop, so the loop can be
//! exercised without AWS or a metadata endpoint.

pub mod mocks;

pub use mocks::*;
