//! Shared type definitions for the vRO workflow runner.
//!
//! Everything here is plain data: the server endpoint a session talks to, the
//! reference a caller uses to pick a workflow, the opaque input parameters that
//! are forwarded to the server, and the execution handle/state/record that flow
//! back out of the engine.

pub mod endpoint;
pub mod execution;
pub mod link;
pub mod workflow;

pub use endpoint::{Credentials, DEFAULT_PORT, ServerEndpoint};
pub use execution::{ExecutionHandle, ExecutionRecord, ExecutionState};
pub use link::{Attribute, LinkCollection, LinkEntry};
pub use workflow::{InputParameter, InputParameterSet, ParameterDescriptor, WorkflowReference};
