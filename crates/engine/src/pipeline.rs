//! Resolve, trigger, poll and fetch, in that order, for one workflow run.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use vro_api::Transport;
use vro_types::{ExecutionState, InputParameterSet, WorkflowReference};

use crate::error::{PipelineError, PipelineStep, WorkflowError};
use crate::fetch::fetch_execution_record;
use crate::poll::{PollClock, PollSettings, poll_execution};
use crate::report::WorkflowOutcome;
use crate::resolve::resolve_reference;
use crate::trigger::trigger_execution;

/// Everything needed to run one workflow.
#[derive(Debug, Clone)]
pub struct WorkflowRequest {
    pub reference: WorkflowReference,
    pub inputs: Option<InputParameterSet>,
    pub wait_for_completion: bool,
    pub poll: PollSettings,
}

impl WorkflowRequest {
    pub fn new(reference: WorkflowReference) -> Self {
        Self {
            reference,
            inputs: None,
            wait_for_completion: true,
            poll: PollSettings::default(),
        }
    }

    pub fn with_inputs(mut self, inputs: InputParameterSet) -> Self {
        self.inputs = Some(inputs);
        self
    }
}

/// Run a workflow end to end.
///
/// The first error aborts the run and is tagged with its step and the ids
/// known so far. A terminal state other than `completed` is an outcome, not an
/// error, and is never followed by a fetch.
pub fn run_workflow(
    transport: &dyn Transport,
    request: &WorkflowRequest,
    clock: &dyn PollClock,
    cancel: &CancellationToken,
) -> Result<WorkflowOutcome, PipelineError> {
    info!(workflow = %request.reference, wait = request.wait_for_completion, "running workflow");

    let workflow_id =
        resolve_reference(transport, &request.reference).map_err(|error| PipelineError::new(PipelineStep::Resolve, error))?;

    let handle = trigger_execution(transport, &workflow_id, request.inputs.as_ref())
        .map_err(|error| PipelineError::new(PipelineStep::Trigger, error).with_workflow_id(&workflow_id))?;
    if !request.wait_for_completion {
        return Ok(WorkflowOutcome::Started { handle });
    }

    let tag = |step: PipelineStep, error: WorkflowError| {
        PipelineError::new(step, error)
            .with_workflow_id(&handle.workflow_id)
            .with_execution_id(&handle.execution_id)
    };

    let poll = poll_execution(transport, &handle, request.poll, clock, cancel).map_err(|error| tag(PipelineStep::Poll, error))?;
    if poll.state != ExecutionState::Completed {
        warn!(execution_id = %handle.execution_id, state = %poll.state, "workflow did not complete");
        return Ok(WorkflowOutcome::Unsuccessful { handle, poll });
    }

    let record = fetch_execution_record(transport, &handle).map_err(|error| tag(PipelineStep::Fetch, error))?;
    Ok(WorkflowOutcome::Completed { handle, poll, record })
}
