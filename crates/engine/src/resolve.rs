//! Workflow name resolution.

use tracing::{debug, info};
use vro_api::{StatusCode, Transport};
use vro_types::{LinkCollection, WorkflowReference};
use vro_util::http::encode_query_value;

use crate::error::WorkflowError;

/// Look up the id of the single workflow named `name`.
///
/// The server filters by name; zero matches and multiple matches are both
/// errors, so the id returned is never a guess.
pub fn resolve_workflow_id(transport: &dyn Transport, name: &str) -> Result<String, WorkflowError> {
    let path = format!("workflows?conditions=name={}", encode_query_value(name));
    debug!(workflow_name = %name, "resolving workflow by name");

    let response = transport.get(&path)?;
    if response.status != StatusCode::OK {
        return Err(WorkflowError::Resolve {
            name: name.to_string(),
            status: response.status,
        });
    }

    let collection: LinkCollection = match response.body {
        Some(body) => serde_json::from_value(body).map_err(|error| WorkflowError::malformed("workflow lookup", error.to_string()))?,
        None => LinkCollection::default(),
    };

    match collection.match_count() {
        0 => Err(WorkflowError::NotFound { name: name.to_string() }),
        1 => {
            let workflow_id = collection
                .link
                .first()
                .and_then(|entry| entry.attribute("id"))
                .ok_or_else(|| WorkflowError::malformed("workflow lookup", format!("match for '{name}' has no id attribute")))?;
            info!(workflow_name = %name, workflow_id = %workflow_id, "workflow resolved");
            Ok(workflow_id.to_string())
        }
        count => Err(WorkflowError::Ambiguous {
            name: name.to_string(),
            count,
        }),
    }
}

/// Turn a reference into a workflow id; a uuid is used as-is without a request.
pub fn resolve_reference(transport: &dyn Transport, reference: &WorkflowReference) -> Result<String, WorkflowError> {
    match reference {
        WorkflowReference::Uuid(uuid) => Ok(uuid.clone()),
        WorkflowReference::Name(name) => resolve_workflow_id(transport, name),
    }
}
