// SPDX-License-Identifier: MIT

//! Node roles of the inbox workflow
//!
//! - `EntryNode` - opens the run record and fills in a default instruction
//! - `ClassifyNode` - picks the task from the instruction text
//! - `BranchNode` - runs the task executor for one task kind

mod branch;
mod classify;
mod entry;

pub use branch::{instruction_for, BranchNode};
pub use classify::{Classifier, ClassifyNode};
pub use entry::EntryNode;
