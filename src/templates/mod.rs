pub mod logic;

use crate::errors::{PipelineError, TemplateError};
use crate::setup::AnimationSetup;
use std::path::{Path, PathBuf};

/// Token replaced by the quoted exchange file name
pub const DATA_FILE_PLACEHOLDER: &str = "__EQANIM_DATA_FILE__";
/// Comment opening the block injection zone
pub const BLOCK_BEGIN_MARKER: &str = "# --- BEGIN EQUATION BLOCK ---";
/// Comment closing the block injection zone
pub const BLOCK_END_MARKER: &str = "# --- END EQUATION BLOCK ---";
/// Scene class the renderer is told to run
pub const DEFAULT_SCENE_NAME: &str = "GeneratedScene";

const BUILTIN_TEMPLATE: &str = include_str!("../../templates/scene_template.py");

/// What a scene template must contain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateContract {
    scene_name: String,
}

impl TemplateContract {
    pub fn new(scene_name: impl Into<String>) -> Self {
        Self {
            scene_name: scene_name.into(),
        }
    }

    pub fn scene_name(&self) -> &str {
        &self.scene_name
    }

    pub fn check(&self, text: &str) -> Result<(), TemplateError> {
        if !text.contains(DATA_FILE_PLACEHOLDER) {
            return Err(TemplateError::MissingDataPlaceholder(DATA_FILE_PLACEHOLDER));
        }
        self.zone(text)?;
        if !text.contains(&format!("class {}(", self.scene_name)) {
            return Err(TemplateError::MissingSceneClass(self.scene_name.clone()));
        }
        Ok(())
    }

    /// Byte range replaced by block logic: from the end of the begin marker
    /// line to the start of the end marker line. Also returns the begin
    /// marker's indentation.
    fn zone<'t>(&self, text: &'t str) -> Result<(usize, usize, &'t str), TemplateError> {
        let begin = text
            .find(BLOCK_BEGIN_MARKER)
            .ok_or(TemplateError::MissingBeginMarker(BLOCK_BEGIN_MARKER))?;
        let end = text
            .find(BLOCK_END_MARKER)
            .ok_or(TemplateError::MissingEndMarker(BLOCK_END_MARKER))?;
        if end < begin {
            return Err(TemplateError::MarkersOutOfOrder);
        }

        let begin_line_start = text[..begin].rfind('\n').map_or(0, |i| i + 1);
        let indent = &text[begin_line_start..begin];
        let zone_start = text[begin..]
            .find('\n')
            .map_or(text.len(), |i| begin + i + 1);
        let zone_end = text[..end].rfind('\n').map_or(0, |i| i + 1);
        if zone_end < zone_start {
            // Both markers on one line
            return Err(TemplateError::MarkersOutOfOrder);
        }
        Ok((zone_start, zone_end, indent))
    }
}

/// Everything a scene needs about its block
#[derive(Debug, Clone)]
pub struct SceneContext<'a> {
    pub block_id: &'a str,
    pub setup: Option<&'a AnimationSetup>,
    pub data_file_name: &'a str,
}

/// A scene template whose contract was checked when it was loaded
#[derive(Debug, Clone)]
pub struct SceneTemplate {
    path: PathBuf,
    contract: TemplateContract,
}

impl SceneTemplate {
    /// Load and validate the template at `path`
    pub fn load(path: &Path, scene_name: &str) -> Result<Self, PipelineError> {
        if !path.is_file() {
            return Err(PipelineError::TemplateMissing(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::io(format!("Failed to read template {}", path.display()), e)
        })?;

        let contract = TemplateContract::new(scene_name);
        contract.check(&text)?;

        Ok(Self {
            path: path.to_path_buf(),
            contract,
        })
    }

    /// The template shipped with eqanim
    pub fn builtin_text() -> &'static str {
        BUILTIN_TEMPLATE
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contract(&self) -> &TemplateContract {
        &self.contract
    }

    pub fn scene_name(&self) -> &str {
        self.contract.scene_name()
    }

    /// Fill the placeholders of an instantiated copy of this template
    pub fn render(&self, text: &str, ctx: &SceneContext<'_>) -> Result<String, TemplateError> {
        render_scene(&self.contract, text, ctx)
    }
}

/// Substitute both placeholders in `text`. The text is re-checked since a
/// copy on disk may differ from the template that was validated.
pub fn render_scene(
    contract: &TemplateContract,
    text: &str,
    ctx: &SceneContext<'_>,
) -> Result<String, TemplateError> {
    contract.check(text)?;
    let (zone_start, zone_end, indent) = contract.zone(text)?;

    let mut out = String::with_capacity(text.len() + 2048);
    out.push_str(&text[..zone_start]);
    for line in logic::block_logic(ctx.block_id, ctx.setup) {
        out.push_str(indent);
        out.push_str(&line);
        out.push('\n');
    }
    out.push_str(&text[zone_end..]);

    let quoted = serde_json::Value::String(ctx.data_file_name.to_string()).to_string();
    Ok(out.replace(DATA_FILE_PLACEHOLDER, &quoted))
}
