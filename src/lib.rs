//! Enact - browser-side execution engine for scripted UI tests
//!
//! The engine takes parsed test steps and drives them against a live page:
//! gesture calls resolve their targets, ride out DOM churn, run page-side
//! automations and classify failures into a uniform error taxonomy; whole
//! steps can be delegated into child frames and synchronized back. The
//! member crates divide along that line:
//!
//! - `core_types` - identifiers, gesture names, errors, runner settings
//! - `event_bus` - broadcast plumbing behind page and runner events
//! - `page_adapter` - ports onto the page plus the in-memory stub
//! - `step_context` - the step iterator seam and shared step state
//! - `target_resolver` - descriptor-to-element resolution with polling
//! - `visibility_gate` - visibility polling ahead of each automation
//! - `gesture_dispatch` - the gesture command surface
//! - `frame_sync` - frame messaging and whole-step delegation
//! - `runner` - run orchestration around the dispatcher
//!
//! [`Engine`] wires a dispatcher and a runner over one set of page
//! collaborators; embedders needing only one half build it directly from
//! the member crates.

pub mod engine;

pub use engine::Engine;

pub use enact_core_types as core_types;
pub use enact_event_bus as event_bus;
pub use enact_frame_sync as frame_sync;
pub use enact_gesture_dispatch as gesture_dispatch;
pub use enact_page_adapter as page_adapter;
pub use enact_runner as runner;
pub use enact_step_context as step_context;
pub use enact_target_resolver as target_resolver;
pub use enact_visibility_gate as visibility_gate;

// Re-export commonly used types for external use
pub use enact_core_types::{
    ErrorKind, ErrorRecord, GestureName, NodeId, ResolvedTarget, RunnerSettings, WindowId,
};
pub use enact_gesture_dispatch::{ActionDispatcher, RunContext};
pub use enact_page_adapter::{ActionTargetSpec, TargetInput};
pub use enact_runner::{Runner, RunnerContext, RunnerEvent};
