//! # vRO Engine
//!
//! Runs one workflow on a vRealize Orchestrator server and decides how it
//! ended. The engine is synchronous: every step blocks the calling thread and
//! talks to the server through a [`vro_api::Transport`].
//!
//! ## Pipeline
//!
//! 1. **Resolve** a workflow name to its id (a uuid is used directly)
//! 2. **Trigger** an execution and read its id from the `Location` header
//! 3. **Poll** the execution state until it is terminal or the timeout passes
//! 4. **Fetch** the execution record when the state is `completed`
//!
//! [`report::Report`] turns the result into the document printed for callers.
//!
//! ## Usage
//!
//! ```ignore
//! use tokio_util::sync::CancellationToken;
//! use vro_api::HttpTransport;
//! use vro_engine::{Report, SystemClock, WorkflowRequest, run_workflow};
//! use vro_types::{Credentials, ServerEndpoint, WorkflowReference};
//!
//! let endpoint = ServerEndpoint::new("vro.domain.local", Credentials::new("vcoadmin", "vcoadmin"));
//! let transport = HttpTransport::new(&endpoint)?;
//! let request = WorkflowRequest::new(WorkflowReference::Name("test-workflow".into()));
//! let report = Report::from_result(run_workflow(&transport, &request, &SystemClock, &CancellationToken::new()));
//! println!("{}", serde_json::to_string_pretty(&report)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod poll;
pub mod report;
pub mod resolve;
pub mod trigger;

#[cfg(test)]
mod testing;

pub use error::{PipelineError, PipelineStep, WorkflowError};
pub use fetch::fetch_execution_record;
pub use pipeline::{WorkflowRequest, run_workflow};
pub use poll::{
    DEFAULT_POLL_INTERVAL, DEFAULT_POLL_TIMEOUT, PollClock, PollOutcome, PollSettings, SystemClock, execution_state, poll_execution,
};
pub use report::{FailureKind, Report, WorkflowOutcome};
pub use resolve::{resolve_reference, resolve_workflow_id};
pub use trigger::trigger_execution;
