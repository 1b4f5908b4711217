use super::{RenderRequest, RenderResult, SceneRenderer};
use crate::errors::RenderError;
use log::debug;
use std::io::ErrorKind;
use std::process::Command;

/// Renders scenes by running the Manim command line
#[derive(Debug, Clone)]
pub struct ManimRenderer {
    program: String,
    args: Vec<String>,
}

impl ManimRenderer {
    /// `program` is run with `args` in front of the scene arguments, e.g.
    /// `python3` with `["-m", "manim"]`.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Check that the renderer starts and reports a version
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .args(&self.args)
            .arg("--version")
            .output()
            .map(|out| out.status.success())
            .unwrap_or(false)
    }

    fn command(&self, request: &RenderRequest) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(&request.artifact_path)
            .arg(&request.scene_name)
            .arg("--media_dir")
            .arg(&request.output_dir)
            .arg("-o")
            .arg(&request.output_name)
            .arg(request.options.quality.flag());

        if request.options.disable_caching {
            cmd.arg("--disable_caching");
        }
        cmd.arg("-v").arg(&request.options.verbosity);
        cmd
    }
}

impl SceneRenderer for ManimRenderer {
    fn render(&self, request: &RenderRequest) -> Result<RenderResult, RenderError> {
        let mut cmd = self.command(request);
        debug!("Running {:?}", cmd);

        let output = cmd.output().map_err(|e| match e.kind() {
            ErrorKind::NotFound => RenderError::ExecutableNotFound(self.program.clone()),
            _ => RenderError::Spawn(e),
        })?;

        Ok(RenderResult {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
