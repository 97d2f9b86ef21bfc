// SPDX-License-Identifier: MIT

//! Inbox automation: configuration, mailbox tools, the mail agent,
//! persistence and the workflow graph

pub mod agent_factory;
pub mod config;
pub mod executor;
pub mod store;
pub mod tools;
pub mod workflow;
