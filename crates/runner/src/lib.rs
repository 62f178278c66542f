//! Run orchestration
//!
//! The dispatcher executes gestures; this crate runs everything around
//! them:
//! - `Runner`: frame message routing, delegated steps, before-unload and
//!   download coordination, dialog and page-error policy
//! - `RunnerContext`: the collaborator bundle one run is wired to
//! - `RunnerEvent`: progress notifications published for the embedder
//! - frame-argument normalization for steps that run inside a frame

pub mod context;
pub mod events;
pub mod runner;

mod frames;

pub use context::*;
pub use events::*;
pub use runner::*;

/// Returns true when the stub collaborators are compiled in.
pub const fn is_stubbed() -> bool {
    cfg!(feature = "stub")
}
