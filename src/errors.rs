//! Error types for the equation animation pipeline.
//!
//! Only resource absence at setup time is fatal for a run. Per-document and
//! per-block problems are logged where they happen and never surface here.

use std::path::PathBuf;
use thiserror::Error;

/// Run-aborting failures
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Directory '{0}' does not exist")]
    DirectoryNotFound(PathBuf),

    #[error("'{0}' is not a directory")]
    NotADirectory(PathBuf),

    #[error("No .{extension} documents found in '{dir}'")]
    NoDocuments { dir: PathBuf, extension: String },

    #[error("Scene template not found: {0}")]
    TemplateMissing(PathBuf),

    #[error("Invalid scene template: {0}")]
    Template(#[from] TemplateError),

    #[error("Renderer unavailable: {0}")]
    RendererUnavailable(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Violations of the scene template contract
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("missing data file placeholder '{0}'")]
    MissingDataPlaceholder(&'static str),

    #[error("missing block begin marker '{0}'")]
    MissingBeginMarker(&'static str),

    #[error("missing block end marker '{0}'")]
    MissingEndMarker(&'static str),

    #[error("block end marker appears before the begin marker")]
    MarkersOutOfOrder,

    #[error("no scene class named '{0}'")]
    MissingSceneClass(String),
}

/// Failures invoking the external renderer
#[derive(Error, Debug)]
pub enum RenderError {
    /// The renderer executable could not be found; fatal for the run
    #[error("renderer executable '{0}' not found")]
    ExecutableNotFound(String),

    /// Any other spawn or wait failure; fatal for one artifact only
    #[error("failed to run renderer: {0}")]
    Spawn(#[from] std::io::Error),
}
