//! # World Model
//!
//! The world graph that rules are evaluated against: typed entities,
//! directed relationships, named pressures and the simulation clock.
//! This crate holds state and answers queries; it contains no rule logic.
//!
//! ## Surfaces
//!
//! - **`GraphView`**: read-only query facade handed to rule evaluation
//! - **`MutationSink`**: commits change sets that rule evaluation prepared
//! - **`WorldGraph`**: the in-memory implementation of both

pub mod entities;
pub mod error;
pub mod mechanics;
pub mod world_state;

pub use entities::*;
pub use error::{Result, WorldError};
pub use mechanics::*;
pub use world_state::*;
