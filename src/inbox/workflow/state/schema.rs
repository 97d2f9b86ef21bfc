// SPDX-License-Identifier: MIT

//! Task kinds the classifier can select

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Branch selected for a run. Serialized in snake_case so checkpoints and
/// ledger rows carry the same spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Fetch, classify, label and reply to unread mail
    ProcessInbox,
    /// Summarize recent important mail
    DailySummary,
}

impl TaskKind {
    pub const ALL: [TaskKind; 2] = [TaskKind::ProcessInbox, TaskKind::DailySummary];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::ProcessInbox => "process_inbox",
            TaskKind::DailySummary => "daily_summary",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "process_inbox" => Ok(TaskKind::ProcessInbox),
            "daily_summary" => Ok(TaskKind::DailySummary),
            other => Err(format!("unknown task kind: {}", other)),
        }
    }
}
