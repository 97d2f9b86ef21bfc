// SPDX-License-Identifier: MIT

//! Agent development kit: agents, models, tools and the crate's error types.

pub mod agent;
pub mod error;
pub mod model;
pub mod tool;

/// Boxed error used at the agent, model and tool seams
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
