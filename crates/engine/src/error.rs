//! Error taxonomy for the execution pipeline.

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use vro_api::{StatusCode, TransportError};
use vro_util::http::{JsonParseError, describe_status};

/// A fatal condition raised by one of the pipeline operations.
///
/// Terminal execution states (`failed`, `canceled`, `timeout`) are outcomes,
/// not errors, and never appear here.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Connection, DNS, TLS, or URL failure.
    #[error("{0}")]
    Transport(#[source] TransportError),

    /// A success response whose body was not valid JSON.
    #[error("Unable to convert to JSON: {0}")]
    Decode(#[source] JsonParseError),

    #[error("no workflow named {name}")]
    NotFound { name: String },

    #[error("{count} workflows named {name}")]
    Ambiguous { name: String, count: u64 },

    #[error("workflow lookup for '{name}' failed with status code: {}", describe_status(.status))]
    Resolve { name: String, status: StatusCode },

    #[error("POST failed with status code: {}", describe_status(.status))]
    Trigger { workflow_id: String, status: StatusCode },

    #[error("Failed to get state of workflow: {workflow_id} execution id: {execution_id} (status {status})")]
    StatePoll {
        workflow_id: String,
        execution_id: String,
        status: StatusCode,
    },

    #[error("Failed to get result of workflow: {workflow_id} execution id: {execution_id} (status {status})")]
    Fetch {
        workflow_id: String,
        execution_id: String,
        status: StatusCode,
    },

    #[error("unexpected response from {operation}: {message}")]
    MalformedResponse { operation: &'static str, message: String },

    #[error("Invalid inputs. Unable to convert to JSON: {0}")]
    InvalidInputs(#[source] serde_json::Error),

    #[error("waiting for execution {execution_id} was cancelled")]
    Cancelled { execution_id: String },
}

impl WorkflowError {
    pub(crate) fn malformed(operation: &'static str, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            operation,
            message: message.into(),
        }
    }
}

impl From<TransportError> for WorkflowError {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::Decode(parse_error) => Self::Decode(parse_error),
            other => Self::Transport(other),
        }
    }
}

/// Pipeline stage an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    Resolve,
    Trigger,
    Poll,
    Fetch,
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Resolve => "resolve",
            Self::Trigger => "trigger",
            Self::Poll => "poll",
            Self::Fetch => "fetch",
        };
        f.write_str(label)
    }
}

/// A [`WorkflowError`] tagged with the step that raised it and whatever
/// identifiers were known at the time.
#[derive(Debug, Error)]
#[error("{step} failed: {source}")]
pub struct PipelineError {
    pub step: PipelineStep,
    pub workflow_id: Option<String>,
    pub execution_id: Option<String>,
    #[source]
    pub source: WorkflowError,
}

impl PipelineError {
    pub fn new(step: PipelineStep, source: WorkflowError) -> Self {
        Self {
            step,
            workflow_id: None,
            execution_id: None,
            source,
        }
    }

    pub fn with_workflow_id(mut self, workflow_id: impl Into<String>) -> Self {
        self.workflow_id = Some(workflow_id.into());
        self
    }

    pub fn with_execution_id(mut self, execution_id: impl Into<String>) -> Self {
        self.execution_id = Some(execution_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_call() {
        let error = WorkflowError::Trigger {
            workflow_id: "wf-123".into(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
        };
        assert_eq!(error.to_string(), "POST failed with status code: 500 Internal Server Error");

        let error = WorkflowError::Ambiguous {
            name: "test-workflow".into(),
            count: 2,
        };
        assert_eq!(error.to_string(), "2 workflows named test-workflow");

        let tagged = PipelineError::new(PipelineStep::Resolve, WorkflowError::NotFound { name: "nope".into() });
        assert_eq!(tagged.to_string(), "resolve failed: no workflow named nope");
    }

    #[test]
    fn decode_failures_are_split_from_transport_failures() {
        let parse_error = vro_util::http::parse_response_json_strict("{", None).unwrap_err();
        let error = WorkflowError::from(TransportError::Decode(parse_error));
        assert!(matches!(error, WorkflowError::Decode(_)));

        let error = WorkflowError::from(TransportError::Client { message: "boom".into() });
        assert!(matches!(error, WorkflowError::Transport(_)));
    }
}
