//! Execution identity, lifecycle state, and the server's execution document.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Identifies one execution of one workflow.
///
/// Only the trigger step creates handles, so holding one means the server
/// accepted the execution request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionHandle {
    pub workflow_id: String,
    pub execution_id: String,
}

impl ExecutionHandle {
    pub fn new(workflow_id: impl Into<String>, execution_id: impl Into<String>) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            execution_id: execution_id.into(),
        }
    }

    /// API path of the execution document, relative to the API root.
    pub fn record_path(&self) -> String {
        format!("workflows/{}/executions/{}/", self.workflow_id, self.execution_id)
    }

    /// API path of the execution's `state` sub-resource.
    pub fn state_path(&self) -> String {
        format!("workflows/{}/executions/{}/state", self.workflow_id, self.execution_id)
    }
}

/// Lifecycle state of an execution.
///
/// `Timeout` is produced by the poller when it gives up waiting; the server
/// never reports it. Server values the client does not model are carried in
/// `Unknown` and treated as still in progress.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExecutionState {
    Running,
    Completed,
    Failed,
    Canceled,
    Timeout,
    Unknown(String),
}

impl ExecutionState {
    /// Interpret a state string reported by the server.
    pub fn from_server(raw: &str) -> Self {
        match raw {
            "running" => Self::Running,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            "canceled" => Self::Canceled,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Canceled | Self::Timeout)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
            Self::Timeout => "timeout",
            Self::Unknown(raw) => raw.as_str(),
        }
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ExecutionState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ExecutionState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.as_str() {
            "timeout" => Self::Timeout,
            other => Self::from_server(other),
        })
    }
}

/// Full execution document as returned by the server.
///
/// The document is kept exactly as received; accessors only read from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionRecord {
    document: Value,
}

impl ExecutionRecord {
    pub fn new(document: Value) -> Self {
        Self { document }
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    pub fn into_document(self) -> Value {
        self.document
    }

    pub fn id(&self) -> Option<&str> {
        self.str_field("id")
    }

    pub fn state(&self) -> Option<ExecutionState> {
        self.str_field("state").map(ExecutionState::from_server)
    }

    pub fn started_by(&self) -> Option<&str> {
        self.str_field("started-by")
    }

    pub fn start_date(&self) -> Option<&str> {
        self.str_field("start-date")
    }

    pub fn end_date(&self) -> Option<&str> {
        self.str_field("end-date")
    }

    pub fn input_parameters(&self) -> Option<&Value> {
        self.document.get("input-parameters")
    }

    pub fn output_parameters(&self) -> Option<&Value> {
        self.document.get("output-parameters")
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.document.get(key).and_then(Value::as_str)
    }
}
