//! Execution submission.

use tracing::info;
use url::Url;
use vro_api::{StatusCode, Transport};
use vro_types::{ExecutionHandle, InputParameterSet};

use crate::error::WorkflowError;

const OPERATION: &str = "execution trigger";

/// Start an execution of `workflow_id` and return its handle.
///
/// Only `202 Accepted` counts as success. The execution id is taken from the
/// `Location` header (`.../executions/<id>/`).
pub fn trigger_execution(
    transport: &dyn Transport,
    workflow_id: &str,
    inputs: Option<&InputParameterSet>,
) -> Result<ExecutionHandle, WorkflowError> {
    let body = inputs.map(serde_json::to_value).transpose().map_err(WorkflowError::InvalidInputs)?;
    let path = format!("workflows/{workflow_id}/executions/");

    let response = transport.post(&path, body.as_ref())?;
    if response.status != StatusCode::ACCEPTED {
        return Err(WorkflowError::Trigger {
            workflow_id: workflow_id.to_string(),
            status: response.status,
        });
    }

    let location = response
        .header("location")
        .ok_or_else(|| WorkflowError::malformed(OPERATION, "202 response has no Location header"))?;
    let execution_id = execution_id_from_location(&response.url, location)?;

    info!(
        workflow_id = %workflow_id,
        execution_id = %execution_id,
        parameters = inputs.map_or(0, InputParameterSet::len),
        "workflow execution started"
    );
    Ok(ExecutionHandle::new(workflow_id, execution_id))
}

/// Second-to-last `/` segment of the location's path.
fn execution_id_from_location(response_url: &Url, location: &str) -> Result<String, WorkflowError> {
    let url = response_url
        .join(location)
        .map_err(|error| WorkflowError::malformed(OPERATION, format!("invalid Location '{location}': {error}")))?;

    let segments: Vec<&str> = url.path().split('/').collect();
    let execution_id = segments
        .len()
        .checked_sub(2)
        .and_then(|index| segments.get(index))
        .filter(|segment| !segment.is_empty())
        .ok_or_else(|| WorkflowError::malformed(OPERATION, format!("no execution id in Location '{location}'")))?;

    Ok((*execution_id).to_string())
}
