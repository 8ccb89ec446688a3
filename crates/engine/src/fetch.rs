//! Execution record retrieval.

use tracing::debug;
use vro_api::{StatusCode, Transport};
use vro_types::{ExecutionHandle, ExecutionRecord};

use crate::error::WorkflowError;

/// Fetch the full execution document, returned exactly as the server sent it.
pub fn fetch_execution_record(transport: &dyn Transport, handle: &ExecutionHandle) -> Result<ExecutionRecord, WorkflowError> {
    let response = transport.get(&handle.record_path())?;
    if response.status != StatusCode::OK {
        return Err(WorkflowError::Fetch {
            workflow_id: handle.workflow_id.clone(),
            execution_id: handle.execution_id.clone(),
            status: response.status,
        });
    }

    let document = response
        .body
        .ok_or_else(|| WorkflowError::malformed("execution record", "response body is empty"))?;
    debug!(execution_id = %handle.execution_id, "execution record fetched");
    Ok(ExecutionRecord::new(document))
}
