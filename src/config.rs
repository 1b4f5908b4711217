use crate::renderer::{Quality, RenderOptions};
use crate::templates::DEFAULT_SCENE_NAME;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub documents: DocumentsConfig,
    pub paths: PathsConfig,
    pub renderer: RendererConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DocumentsConfig {
    pub dir: PathBuf,
    pub extension: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PathsConfig {
    pub template: PathBuf,
    pub output_dir: PathBuf,
    pub work_dir: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RendererConfig {
    pub program: String, // "manim", or a python interpreter with args = ["-m", "manim"]
    #[serde(default)]
    pub args: Vec<String>,
    pub scene_name: String,
    pub quality: Quality,
    pub disable_caching: bool,
    pub verbosity: String,
}

impl RendererConfig {
    pub fn options(&self) -> RenderOptions {
        RenderOptions {
            quality: self.quality,
            disable_caching: self.disable_caching,
            verbosity: self.verbosity.clone(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            documents: DocumentsConfig {
                dir: PathBuf::from("."),
                extension: "tex".to_string(),
            },
            paths: PathsConfig {
                template: PathBuf::from("templates/scene_template.py"),
                output_dir: PathBuf::from("media"),
                work_dir: std::env::temp_dir(),
            },
            renderer: RendererConfig {
                program: "manim".to_string(),
                args: Vec::new(),
                scene_name: DEFAULT_SCENE_NAME.to_string(),
                quality: Quality::Low,
                disable_caching: true,
                verbosity: "WARNING".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Load from `eqanim.*` in the working directory if present
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(None)
    }

    /// Load with an explicit config file, which must then exist
    pub fn load_from(file: Option<&Path>) -> Result<Self, config::ConfigError> {
        let work_dir = std::env::temp_dir().to_string_lossy().into_owned();

        let mut builder = config::Config::builder()
            .set_default("documents.dir", ".")?
            .set_default("documents.extension", "tex")?
            .set_default("paths.template", "templates/scene_template.py")?
            .set_default("paths.output_dir", "media")?
            .set_default("paths.work_dir", work_dir)?
            .set_default("renderer.program", "manim")?
            .set_default("renderer.scene_name", DEFAULT_SCENE_NAME)?
            .set_default("renderer.quality", "low")?
            .set_default("renderer.disable_caching", true)?
            .set_default("renderer.verbosity", "WARNING")?;

        builder = match file {
            Some(path) => builder.add_source(config::File::from(path).required(true)),
            None => builder.add_source(config::File::with_name("eqanim").required(false)),
        };

        // Allow env var overrides (e.g. EQANIM_RENDERER__PROGRAM=manimce)
        builder = builder.add_source(config::Environment::with_prefix("EQANIM").separator("__"));

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_load() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("empty.toml");
        fs::write(&file, "").unwrap();

        let loaded = AppConfig::load_from(Some(&file)).unwrap();
        let default = AppConfig::default();
        assert_eq!(loaded.documents.extension, default.documents.extension);
        assert_eq!(loaded.paths.template, default.paths.template);
        assert_eq!(loaded.renderer.program, default.renderer.program);
        assert_eq!(loaded.renderer.quality, Quality::Low);
        assert!(loaded.renderer.args.is_empty());
    }

    #[test]
    fn test_file_overrides() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("eqanim.toml");
        fs::write(
            &file,
            r#"
[documents]
extension = "ltx"

[renderer]
program = "python3"
args = ["-m", "manim"]
quality = "high"
disable_caching = false
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(Some(&file)).unwrap();
        assert_eq!(config.documents.extension, "ltx");
        assert_eq!(config.renderer.args, vec!["-m", "manim"]);
        assert_eq!(config.renderer.options().quality, Quality::High);
        assert!(!config.renderer.options().disable_caching);
        assert_eq!(config.renderer.scene_name, "GeneratedScene");
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let result = AppConfig::load_from(Some(Path::new("/nonexistent/eqanim.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_serializes_to_toml() {
        let text = toml::to_string_pretty(&AppConfig::default()).unwrap();
        assert!(text.contains("[renderer]"));
        assert!(text.contains("quality = \"low\""));
    }
}
