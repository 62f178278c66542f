//! Step iterator contract and shared step state
//!
//! The engine never drives test steps itself; the embedder's step machinery
//! does. This crate pins down the seam between them:
//! - `StepIterator` - async-action discipline, notifications, shared data
//!   and the step controls the runner invokes
//! - `StepState` - the mutable per-run state both sides read
//! - `RecordingStepIterator` (feature `stub`, default) - an in-memory
//!   iterator that logs every interaction for tests

pub mod iterator;
pub mod state;

#[cfg(feature = "stub")]
pub mod recording;

pub use iterator::*;
pub use state::*;

#[cfg(feature = "stub")]
pub use recording::*;
