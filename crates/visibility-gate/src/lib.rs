//! Visibility gate - no gesture runs against an element nobody can see
//!
//! Sits between target resolution and dispatch. Regular elements are polled
//! on the availability cadence until visible or the selector timeout runs
//! out; option and optgroup elements get their own immediate rule because
//! they live inside a closed dropdown.

pub mod gate;

pub use gate::*;
