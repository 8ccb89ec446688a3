//! Loading workflow inputs from YAML or JSON files.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde_json::Value;
use vro_types::InputParameterSet;

/// Key under which generated vars files nest the parameter set.
const VARS_DOCUMENT_KEY: &str = "workflow_parameters";

/// Read an input parameter set.
///
/// Accepts a bare `{parameters: [...]}` document or a generated vars file
/// (`{workflow_parameters: {parameters: [...]}}`). JSON is valid YAML, so
/// both formats go through the YAML parser. Only the shape of the document is
/// checked; its content reaches the server as written.
pub fn load_inputs(path: &Path) -> Result<InputParameterSet> {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read inputs file {}", path.display()))?;
    parse_inputs(&text).with_context(|| format!("invalid inputs file {}", path.display()))
}

fn parse_inputs(text: &str) -> Result<InputParameterSet> {
    let mut document: Value = serde_yaml::from_str(text).context("not valid YAML or JSON")?;
    if let Some(nested) = document.get_mut(VARS_DOCUMENT_KEY) {
        document = nested.take();
    }
    let Value::Object(document) = document else {
        bail!("expected a mapping with a 'parameters' list");
    };
    if !document.get("parameters").is_some_and(Value::is_array) {
        bail!("expected a 'parameters' list");
    }
    Ok(InputParameterSet::from_document(document))
}
