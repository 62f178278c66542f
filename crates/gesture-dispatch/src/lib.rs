//! Gesture dispatch - from a loosely shaped call to a finished automation
//!
//! One dispatcher instance serves one window. Every gesture call walks the
//! same road:
//! - parse the dynamic arguments into tagged shapes (fatal argument errors
//!   fire here, before anything touches the page)
//! - resolve the targets, one descriptor at a time
//! - gate each target on visibility
//! - build per-target options and run the page-side automation
//! - classify automation rejections into the error taxonomy
//!
//! Targets are processed strictly in series; the first failure stops the
//! call. The waiting-started and action-run notifications fire at most once
//! per call, on the first target.

pub mod args;
pub mod context;
pub mod dispatcher;

mod input;
mod page;
mod pointer;
mod waiting;

pub use args::*;
pub use context::*;
pub use dispatcher::*;
