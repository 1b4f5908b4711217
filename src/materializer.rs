use crate::equation::EquationSet;
use crate::errors::PipelineError;
use crate::setup::SetupMap;
use crate::templates::{SceneContext, SceneTemplate};
use chrono::Local;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// A generated scene file for one block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneArtifact {
    pub block_id: String,
    pub path: PathBuf,
}

/// Turns the scene template into one populated scene file per block
pub struct SceneMaterializer {
    template: SceneTemplate,
    work_dir: PathBuf,
    sequence: usize,
}

impl SceneMaterializer {
    pub fn new(template: SceneTemplate, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            template,
            work_dir: work_dir.into(),
            sequence: 0,
        }
    }

    pub fn template(&self) -> &SceneTemplate {
        &self.template
    }

    /// Copy the template once per block id into the work directory.
    ///
    /// A template that has gone missing aborts before any copy. A copy that
    /// fails only drops that block.
    pub fn instantiate(&mut self, block_ids: &[String]) -> Result<Vec<SceneArtifact>, PipelineError> {
        if !self.template.path().is_file() {
            return Err(PipelineError::TemplateMissing(
                self.template.path().to_path_buf(),
            ));
        }

        let mut artifacts = Vec::with_capacity(block_ids.len());
        for block_id in block_ids {
            let name = self.artifact_name(block_id);
            let path = self.work_dir.join(name);
            match fs::copy(self.template.path(), &path) {
                Ok(_) => {
                    debug!("Instantiated {} -> {}", block_id, path.display());
                    artifacts.push(SceneArtifact {
                        block_id: block_id.clone(),
                        path,
                    });
                }
                Err(e) => warn!(
                    "Failed to copy template for {}: {}",
                    block_id, e
                ),
            }
        }
        Ok(artifacts)
    }

    /// Fill an instantiated scene for `block_id`.
    ///
    /// On any failure the artifact file is deleted and `false` is returned,
    /// so an unpopulated scene can never reach the renderer.
    pub fn populate(
        &self,
        artifact_path: &Path,
        block_id: &str,
        blocks: &EquationSet,
        setups: &SetupMap,
        exchange_file: &Path,
    ) -> bool {
        let data_file_name = exchange_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let setup = match (blocks.get(block_id), setups.get(block_id)) {
            (Some(_), Some(setup)) => Some(setup),
            _ => {
                warn!("Block {} missing from exchange data", block_id);
                None
            }
        };

        let ctx = SceneContext {
            block_id,
            setup,
            data_file_name: &data_file_name,
        };

        let result = fs::read_to_string(artifact_path)
            .map_err(|e| e.to_string())
            .and_then(|text| self.template.render(&text, &ctx).map_err(|e| e.to_string()))
            .and_then(|scene| fs::write(artifact_path, scene).map_err(|e| e.to_string()));

        match result {
            Ok(()) => true,
            Err(reason) => {
                warn!(
                    "Failed to populate {} for {}: {}",
                    artifact_path.display(),
                    block_id,
                    reason
                );
                discard(artifact_path);
                false
            }
        }
    }

    fn artifact_name(&mut self, block_id: &str) -> String {
        let name = format!(
            "scene_{}_{}_{}.py",
            sanitize_id(block_id),
            Local::now().format("%Y%m%d_%H%M%S_%6f"),
            self.sequence
        );
        self.sequence += 1;
        name
    }
}

/// Block id reduced to `[A-Za-z0-9_]`, usable as a file or module name
pub fn sanitize_id(block_id: &str) -> String {
    block_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Delete an artifact, ignoring one that is already gone
pub fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove {}: {}", path.display(), e);
        }
    }
}
