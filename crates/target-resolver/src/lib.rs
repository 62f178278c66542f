//! Target availability - from descriptor to concrete nodes
//!
//! The first argument of a gesture names what to act on: a node, a node
//! collection, a selector or a producer callback. Concrete nodes are taken
//! as-is; selectors and producers are re-evaluated on the availability
//! cadence until they yield something or the selector timeout runs out.

pub mod resolver;

pub use resolver::*;
