//! Caller-facing outcome report.
//!
//! Every invocation ends in exactly one [`Report`]. A business outcome (the
//! workflow ran but did not complete) and a client error are both failures,
//! told apart by [`FailureKind`].

use serde::Serialize;
use serde_json::Value;
use vro_types::{ExecutionHandle, ExecutionRecord, ExecutionState};

use crate::error::{PipelineError, PipelineStep};
use crate::poll::PollOutcome;

/// How a successful pipeline run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowOutcome {
    /// Triggered without waiting for completion.
    Started { handle: ExecutionHandle },
    /// Reached `completed`; the record was fetched.
    Completed {
        handle: ExecutionHandle,
        poll: PollOutcome,
        record: ExecutionRecord,
    },
    /// Reached a terminal state other than `completed`.
    Unsuccessful { handle: ExecutionHandle, poll: PollOutcome },
}

impl WorkflowOutcome {
    pub fn handle(&self) -> &ExecutionHandle {
        match self {
            Self::Started { handle } | Self::Completed { handle, .. } | Self::Unsuccessful { handle, .. } => handle,
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Unsuccessful { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The execution ended `failed`, `canceled` or `timeout`.
    Execution,
    /// The client could not complete the pipeline.
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// Whether an execution was started on the server.
    pub changed: bool,
    pub failed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<PipelineStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ExecutionState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
    /// Full execution document, present only for `completed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

impl Report {
    fn started(handle: &ExecutionHandle) -> Self {
        Self {
            changed: true,
            failed: false,
            msg: None,
            failure: None,
            step: None,
            workflow_id: Some(handle.workflow_id.clone()),
            execution_id: Some(handle.execution_id.clone()),
            status: None,
            attempts: None,
            result: None,
        }
    }

    pub fn from_outcome(outcome: WorkflowOutcome) -> Self {
        match outcome {
            WorkflowOutcome::Started { handle } => Self::started(&handle),
            WorkflowOutcome::Completed { handle, poll, record } => Self {
                status: Some(poll.state),
                attempts: Some(poll.attempts),
                result: Some(record.into_document()),
                ..Self::started(&handle)
            },
            WorkflowOutcome::Unsuccessful { handle, poll } => Self {
                failed: true,
                msg: Some(format!("Workflow status: {}", poll.state)),
                failure: Some(FailureKind::Execution),
                status: Some(poll.state),
                attempts: Some(poll.attempts),
                ..Self::started(&handle)
            },
        }
    }

    pub fn from_error(error: &PipelineError) -> Self {
        Self {
            changed: error.execution_id.is_some(),
            failed: true,
            msg: Some(error.to_string()),
            failure: Some(FailureKind::Error),
            step: Some(error.step),
            workflow_id: error.workflow_id.clone(),
            execution_id: error.execution_id.clone(),
            status: None,
            attempts: None,
            result: None,
        }
    }

    pub fn from_result(result: Result<WorkflowOutcome, PipelineError>) -> Self {
        match result {
            Ok(outcome) => Self::from_outcome(outcome),
            Err(error) => Self::from_error(&error),
        }
    }
}
