//! Ansible artifact generation for vRO workflows.
//!
//! Given the record of an execution that already ran, produce a vars file
//! holding its input parameters and a playbook that runs the same workflow
//! again with those inputs. The playbook comes from a text template rendered
//! with explicit [`TemplateSyntax`] settings.

use std::path::PathBuf;

use thiserror::Error;

pub mod artifacts;
pub mod render;

pub use artifacts::{
    DEFAULT_PLAYBOOK_TEMPLATE, GeneratedArtifacts, PLAYBOOK_FILE_NAME, PlaybookSettings, VARS_FILE_NAME, render_playbook, render_vars,
    vars_document, write_artifacts,
};
pub use render::{TemplateContext, TemplateSyntax, render_template};

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("execution record has no input-parameters")]
    MissingInputParameters,

    #[error("template references unknown variable '{name}'")]
    UnknownVariable { name: String },

    #[error("unterminated template placeholder at byte {offset}")]
    UnterminatedPlaceholder { offset: usize },

    #[error("failed to serialize vars document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
