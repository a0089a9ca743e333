//! Task and challenge payloads

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::VersionedId;

/// What a task reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskResultType {
    Boolean,
    Number,
    Score,
    Duration,
}

impl TaskResultType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "BOOLEAN" => Some(TaskResultType::Boolean),
            "NUMBER" => Some(TaskResultType::Number),
            "SCORE" => Some(TaskResultType::Score),
            "DURATION" => Some(TaskResultType::Duration),
            _ => None,
        }
    }
}

/// When a task action fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionTrigger {
    Success,
    Failure,
    Always,
}

impl ActionTrigger {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SUCCESS" => Some(ActionTrigger::Success),
            "FAILURE" => Some(ActionTrigger::Failure),
            "ALWAYS" => Some(ActionTrigger::Always),
            _ => None,
        }
    }

    /// Whether an action with this trigger fires for the given result.
    pub fn fires(&self, passed: bool) -> bool {
        match self {
            ActionTrigger::Success => passed,
            ActionTrigger::Failure => !passed,
            ActionTrigger::Always => true,
        }
    }
}

impl fmt::Display for ActionTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionTrigger::Success => f.write_str("SUCCESS"),
            ActionTrigger::Failure => f.write_str("FAILURE"),
            ActionTrigger::Always => f.write_str("ALWAYS"),
        }
    }
}

/// A declarative side effect of a task: emit a named signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskAction {
    pub on: ActionTrigger,
    pub emit: String,
}

/// Compiled task: which ruleset decides it and what it emits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledTask {
    pub ruleset_ref: VersionedId,
    pub result_type: TaskResultType,
    #[serde(default)]
    pub actions: Vec<TaskAction>,
    #[serde(default)]
    pub description: String,
}

/// Compiled challenge: an ordered list of task references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledChallenge {
    pub tasks: Vec<VersionedId>,
}
