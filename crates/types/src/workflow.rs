//! Workflow selection and execution inputs.
//!
//! Input parameters are opaque to the client. The parameter document is kept
//! verbatim, key order included, so the document the server receives is the
//! document the caller built. `name`, `type`, `scope` and `value` are only
//! read through accessors.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// How the caller identifies the workflow to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowReference {
    /// Human-readable name, resolved to an id through the server.
    Name(String),
    /// Server-assigned workflow id, used as-is.
    Uuid(String),
}

impl WorkflowReference {
    /// Build a reference from optional name/uuid inputs, requiring exactly one.
    pub fn from_parts(name: Option<String>, uuid: Option<String>) -> Option<Self> {
        match (name, uuid) {
            (Some(name), None) => Some(Self::Name(name)),
            (None, Some(uuid)) => Some(Self::Uuid(uuid)),
            _ => None,
        }
    }
}

impl fmt::Display for WorkflowReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "name '{name}'"),
            Self::Uuid(uuid) => write!(f, "uuid '{uuid}'"),
        }
    }
}

/// A single parameter descriptor, built in wire order.
///
/// Descriptors read back out of an [`InputParameterSet`] are plain JSON values;
/// see [`ParameterDescriptor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputParameter {
    descriptor: Map<String, Value>,
}

impl InputParameter {
    pub fn new(name: impl Into<String>, r#type: impl Into<String>, scope: impl Into<String>, value: Value) -> Self {
        let mut descriptor = Map::new();
        descriptor.insert("name".into(), Value::String(name.into()));
        descriptor.insert("type".into(), Value::String(r#type.into()));
        descriptor.insert("scope".into(), Value::String(scope.into()));
        descriptor.insert("value".into(), value);
        Self { descriptor }
    }
}

impl From<InputParameter> for Value {
    fn from(parameter: InputParameter) -> Self {
        Value::Object(parameter.descriptor)
    }
}

/// Read-only view of one entry of the `parameters` list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterDescriptor<'a> {
    descriptor: &'a Value,
}

impl<'a> ParameterDescriptor<'a> {
    pub fn as_value(&self) -> &'a Value {
        self.descriptor
    }

    pub fn name(&self) -> Option<&'a str> {
        self.descriptor.get("name").and_then(Value::as_str)
    }

    pub fn r#type(&self) -> Option<&'a str> {
        self.descriptor.get("type").and_then(Value::as_str)
    }

    pub fn scope(&self) -> Option<&'a str> {
        self.descriptor.get("scope").and_then(Value::as_str)
    }

    pub fn value(&self) -> Option<&'a Value> {
        self.descriptor.get("value")
    }
}

/// Parameter document posted as the body of an execution request.
///
/// Serializes exactly as it was deserialized: top-level keys besides
/// `parameters` and malformed descriptors go through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputParameterSet {
    document: Map<String, Value>,
}

impl InputParameterSet {
    pub fn new(parameters: Vec<InputParameter>) -> Self {
        let mut document = Map::new();
        document.insert(
            "parameters".into(),
            Value::Array(parameters.into_iter().map(Value::from).collect()),
        );
        Self { document }
    }

    pub fn from_document(document: Map<String, Value>) -> Self {
        Self { document }
    }

    pub fn document(&self) -> &Map<String, Value> {
        &self.document
    }

    /// Entries of the `parameters` list; empty when the key is missing or not a list.
    pub fn parameters(&self) -> impl Iterator<Item = ParameterDescriptor<'_>> {
        self.parameter_list()
            .iter()
            .map(|descriptor| ParameterDescriptor { descriptor })
    }

    pub fn is_empty(&self) -> bool {
        self.parameter_list().is_empty()
    }

    pub fn len(&self) -> usize {
        self.parameter_list().len()
    }

    fn parameter_list(&self) -> &[Value] {
        self.document
            .get("parameters")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
