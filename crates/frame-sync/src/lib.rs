//! Cross-frame step protocol
//!
//! A test step can target content inside a nested frame, or belong to the
//! frame outright. This crate carries the conversation between the parent
//! document and its frames:
//! - `FrameMessage`: the tagged command set, flat records on the wire
//! - `FrameChannel`: transport seam, with an in-memory pair for tests
//! - `FrameBus`: per-command handler dispatch plus request/response
//!   correlation
//! - `StepDelegation`: drives one step handed to a frame, including the
//!   existence ping and the removed-frame fallback

pub mod bus;
pub mod channel;
pub mod delegation;
pub mod protocol;

pub use bus::*;
pub use channel::*;
pub use delegation::*;
pub use protocol::*;

/// Returns true when the in-memory channel is compiled in.
pub const fn is_stubbed() -> bool {
    cfg!(feature = "stub")
}
