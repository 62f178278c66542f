//! Page collaborator contracts - selector queries, DOM inspection and
//! gesture automations
//!
//! Everything the engine knows about a live page goes through this crate:
//! - `ElementQuery` evaluates selector strings into node handles
//! - `DomInspector` answers node predicates and geometry
//! - `AutomationProvider`/`AutomationSet` build the page-side automations
//!   that simulate gestures
//! - navigation, screenshot, readiness and download-flag plumbing
//! - dialog and page lifecycle events published over the event bus
//!
//! The default `stub` feature ships `StubPage`, an in-memory page with
//! scripted appearance/visibility schedules and a timestamped call log; the
//! engine's tests run against it.

pub mod events;
pub mod keys;
pub mod options;
pub mod ports;
pub mod target;

#[cfg(feature = "stub")]
pub mod stub;

pub use events::*;
pub use keys::*;
pub use options::*;
pub use ports::*;
pub use target::*;

#[cfg(feature = "stub")]
pub use stub::*;

/// Returns `true` when the crate is compiled with the in-memory stub page.
pub const fn is_stubbed() -> bool {
    cfg!(feature = "stub")
}
