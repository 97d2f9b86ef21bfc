// SPDX-License-Identifier: MIT

//! State graph: definition, validation and execution

mod builder;
mod executor;
pub mod types;

pub use builder::GraphBuilder;
pub use executor::CompiledGraph;
pub use types::{Edge, InvokeConfig, DEFAULT_STEP_LIMIT, END};
