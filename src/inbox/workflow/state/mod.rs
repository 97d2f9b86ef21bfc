// SPDX-License-Identifier: MIT

//! Shared state threaded through the workflow graph
//!
//! This module provides:
//! - `TaskKind` - the closed set of branches a run can take
//! - `SharedState` - the record every node reads
//! - `StatePatch` - what a node returns; the engine applies it

mod schema;
mod store;

pub use schema::TaskKind;
pub use store::{SharedState, StatePatch};
