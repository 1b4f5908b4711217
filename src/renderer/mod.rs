pub mod manim;

pub use manim::ManimRenderer;

use crate::errors::RenderError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Render quality preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    #[default]
    Low,
    Medium,
    High,
    Production,
    Fourk,
}

impl Quality {
    pub fn flag(&self) -> &'static str {
        match self {
            Quality::Low => "-ql",
            Quality::Medium => "-qm",
            Quality::High => "-qh",
            Quality::Production => "-qp",
            Quality::Fourk => "-qk",
        }
    }
}

/// Renderer flags shared by every scene of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub quality: Quality,
    pub disable_caching: bool,
    pub verbosity: String,
}

/// One scene to render
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub artifact_path: PathBuf,
    pub scene_name: String,
    pub output_dir: PathBuf,
    /// Output video name, without extension
    pub output_name: String,
    pub options: RenderOptions,
}

/// Captured outcome of one render
#[derive(Debug, Clone, Default)]
pub struct RenderResult {
    /// `None` when the process was killed by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl RenderResult {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// The external renderer.
///
/// Calls block until the render finishes. There is no timeout: a renderer
/// that hangs hangs the run.
pub trait SceneRenderer {
    /// `Err` means the renderer could not be run at all. A render that ran
    /// and failed is an `Ok` with a non-zero exit code.
    fn render(&self, request: &RenderRequest) -> Result<RenderResult, RenderError>;
}

impl<R: SceneRenderer + ?Sized> SceneRenderer for &R {
    fn render(&self, request: &RenderRequest) -> Result<RenderResult, RenderError> {
        (**self).render(request)
    }
}
