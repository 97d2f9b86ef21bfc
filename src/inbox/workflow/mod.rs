// SPDX-License-Identifier: MIT

pub mod builder;
pub mod graph;
pub mod node;
pub mod nodes;
pub mod router;
pub mod state;
