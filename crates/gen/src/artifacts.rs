//! Vars and playbook documents derived from a recorded execution.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Value, json};
use tracing::info;
use vro_types::ExecutionRecord;

use crate::GeneratorError;
use crate::render::{TemplateContext, TemplateSyntax, render_template};

pub const VARS_FILE_NAME: &str = "vro-vars.yml";
pub const PLAYBOOK_FILE_NAME: &str = "vro-playbook.yml";

/// Playbook template shipped with the generator.
pub const DEFAULT_PLAYBOOK_TEMPLATE: &str = include_str!("../templates/playbook.yml.tmpl");

/// Connection details rendered into the playbook.
///
/// There is deliberately no password field; the playbook prompts for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybookSettings {
    pub server: String,
    pub port: u16,
    pub workflow_id: String,
    pub execution_id: String,
    pub username: String,
    pub validate_certs: bool,
}

impl PlaybookSettings {
    pub fn template_context(&self, generated_at: DateTime<Utc>) -> TemplateContext {
        let mut context = TemplateContext::new();
        context.insert("server".into(), self.server.clone());
        context.insert("port".into(), self.port.to_string());
        context.insert("workflow_id".into(), self.workflow_id.clone());
        context.insert("execution_id".into(), self.execution_id.clone());
        context.insert("username".into(), self.username.clone());
        context.insert("validate_certs".into(), self.validate_certs.to_string());
        context.insert("vars_file".into(), VARS_FILE_NAME.into());
        context.insert("generated_at".into(), generated_at.to_rfc3339_opts(SecondsFormat::Secs, true));
        context
    }
}

/// `{workflow_parameters: {parameters: <input-parameters>}}` from the record.
pub fn vars_document(record: &ExecutionRecord) -> Result<Value, GeneratorError> {
    let parameters = record.input_parameters().ok_or(GeneratorError::MissingInputParameters)?;
    Ok(json!({ "workflow_parameters": { "parameters": parameters } }))
}

pub fn render_vars(record: &ExecutionRecord) -> Result<String, GeneratorError> {
    Ok(serde_yaml::to_string(&vars_document(record)?)?)
}

pub fn render_playbook(
    settings: &PlaybookSettings,
    template: &str,
    syntax: &TemplateSyntax,
    generated_at: DateTime<Utc>,
) -> Result<String, GeneratorError> {
    render_template(template, &settings.template_context(generated_at), syntax)
}

/// Paths written by [`write_artifacts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifacts {
    pub vars_path: PathBuf,
    pub playbook_path: PathBuf,
}

/// Render both documents and write them into `output_dir`.
///
/// Both are rendered before either file is written, so a template error
/// leaves the directory untouched.
pub fn write_artifacts(
    output_dir: &Path,
    record: &ExecutionRecord,
    settings: &PlaybookSettings,
    template: &str,
    syntax: &TemplateSyntax,
) -> Result<GeneratedArtifacts, GeneratorError> {
    let vars = render_vars(record)?;
    let playbook = render_playbook(settings, template, syntax, Utc::now())?;

    let vars_path = output_dir.join(VARS_FILE_NAME);
    let playbook_path = output_dir.join(PLAYBOOK_FILE_NAME);
    write_file(&vars_path, &vars)?;
    write_file(&playbook_path, &playbook)?;

    info!(
        execution_id = %settings.execution_id,
        vars = %vars_path.display(),
        playbook = %playbook_path.display(),
        "ansible artifacts written"
    );
    Ok(GeneratedArtifacts { vars_path, playbook_path })
}

fn write_file(path: &Path, contents: &str) -> Result<(), GeneratorError> {
    fs::write(path, contents).map_err(|source| GeneratorError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn record() -> ExecutionRecord {
        ExecutionRecord::new(json!({
            "id": "exec-9",
            "state": "completed",
            "input-parameters": [
                { "name": "attrSleep", "type": "number", "scope": "local", "value": { "number": { "value": 1000 } } },
                { "name": "inValue", "type": "string", "scope": "local", "value": { "string": { "value": "Executed by Ansible" } } }
            ]
        }))
    }

    fn settings() -> PlaybookSettings {
        PlaybookSettings {
            server: "vro.domain.local".into(),
            port: 8281,
            workflow_id: "a7a1d06a-9018-40c4-9199-1ce95932311c".into(),
            execution_id: "exec-9".into(),
            username: "vcoadmin@vsphere.local".into(),
            validate_certs: false,
        }
    }

    #[test]
    fn vars_wrap_input_parameters_in_order() {
        let yaml = render_vars(&record()).unwrap();
        let parsed: Value = serde_yaml::from_str(&yaml).unwrap();

        assert_eq!(
            parsed["workflow_parameters"]["parameters"],
            record().input_parameters().cloned().unwrap()
        );
        assert!(yaml.find("attrSleep").unwrap() < yaml.find("inValue").unwrap());
    }

    #[test]
    fn record_without_inputs_is_an_error() {
        let record = ExecutionRecord::new(json!({ "id": "exec-9" }));

        assert!(matches!(render_vars(&record), Err(GeneratorError::MissingInputParameters)));
    }

    #[test]
    fn default_template_renders_valid_yaml() {
        let generated_at = Utc.with_ymd_and_hms(2018, 6, 1, 10, 0, 0).unwrap();

        let playbook = render_playbook(&settings(), DEFAULT_PLAYBOOK_TEMPLATE, &TemplateSyntax::default(), generated_at).unwrap();

        assert!(playbook.contains("# Generated by vro generate at 2018-06-01T10:00:00Z"));
        assert!(!playbook.contains("[%"));
        let plays: Value = serde_yaml::from_str(&playbook).unwrap();
        let play = &plays[0];
        assert_eq!(play["vars"]["vro_server"], json!("vro.domain.local"));
        assert_eq!(play["vars"]["vro_port"], json!(8281));
        assert_eq!(play["vars"]["workflow_uuid"], json!("a7a1d06a-9018-40c4-9199-1ce95932311c"));
        assert_eq!(play["vars"]["validate_certs"], json!(false));
        assert_eq!(play["vars_files"][0], json!(VARS_FILE_NAME));
        assert_eq!(play["vars_prompt"][0]["default"], json!("vcoadmin@vsphere.local"));
        assert_eq!(play["tasks"][1]["vmware_vro_workflow"]["password"], json!("{{ password }}"));
    }

    #[test]
    fn writes_both_files() {
        let dir = tempfile::tempdir().unwrap();

        let artifacts = write_artifacts(dir.path(), &record(), &settings(), DEFAULT_PLAYBOOK_TEMPLATE, &TemplateSyntax::default()).unwrap();

        assert_eq!(artifacts.vars_path, dir.path().join("vro-vars.yml"));
        assert!(fs::read_to_string(&artifacts.vars_path).unwrap().contains("workflow_parameters:"));
        assert!(fs::read_to_string(&artifacts.playbook_path).unwrap().contains("vmware_vro_workflow:"));
    }

    #[test]
    fn template_error_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();

        let error = write_artifacts(dir.path(), &record(), &settings(), "pw: \"[% password %]\"", &TemplateSyntax::default()).unwrap_err();

        assert!(matches!(error, GeneratorError::UnknownVariable { .. }));
        assert!(!dir.path().join(VARS_FILE_NAME).exists());
        assert!(!dir.path().join(PLAYBOOK_FILE_NAME).exists());
    }

    #[test]
    fn missing_output_dir_is_a_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent");

        let error = write_artifacts(&missing, &record(), &settings(), DEFAULT_PLAYBOOK_TEMPLATE, &TemplateSyntax::default()).unwrap_err();

        assert!(matches!(error, GeneratorError::Write { .. }));
    }
}
