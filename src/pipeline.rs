use crate::equation::EquationSet;
use crate::errors::{PipelineError, RenderError};
use crate::exchange::{ExchangeData, ExchangeFile};
use crate::materializer::{discard, sanitize_id, SceneArtifact, SceneMaterializer};
use crate::renderer::{RenderOptions, RenderRequest, SceneRenderer};
use crate::setup::SetupMap;
use crate::templates::SceneTemplate;
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Files owned by one run of the pipeline.
///
/// Everything the run creates lives in its own directory and is registered
/// here; [`cleanup`](Self::cleanup) removes it exactly once, and dropping the
/// context cleans up if that has not happened yet.
pub struct RunContext {
    work_dir: TempDir,
    exchange: Option<ExchangeFile>,
    artifacts: Vec<PathBuf>,
    cleaned: bool,
}

impl RunContext {
    pub fn create(work_root: &Path) -> Result<Self, PipelineError> {
        std::fs::create_dir_all(work_root).map_err(|e| {
            PipelineError::io(format!("Failed to create {}", work_root.display()), e)
        })?;
        let work_dir = tempfile::Builder::new()
            .prefix("eqanim-run-")
            .tempdir_in(work_root)
            .map_err(|e| PipelineError::io("Failed to create run directory", e))?;
        debug!("Run directory: {}", work_dir.path().display());

        Ok(Self {
            work_dir,
            exchange: None,
            artifacts: Vec::new(),
            cleaned: false,
        })
    }

    pub fn work_dir(&self) -> &Path {
        self.work_dir.path()
    }

    pub fn exchange(&self) -> Option<&ExchangeFile> {
        self.exchange.as_ref()
    }

    pub fn live_artifacts(&self) -> &[PathBuf] {
        &self.artifacts
    }

    pub fn is_cleaned(&self) -> bool {
        self.cleaned
    }

    fn set_exchange(&mut self, exchange: ExchangeFile) {
        self.exchange = Some(exchange);
    }

    fn track(&mut self, path: &Path) {
        self.artifacts.push(path.to_path_buf());
    }

    /// Delete one artifact now and stop tracking it
    fn release(&mut self, path: &Path) {
        discard(path);
        self.artifacts.retain(|p| p != path);
    }

    /// Remove leftover artifacts and the exchange file. Runs once.
    pub fn cleanup(&mut self) {
        if self.cleaned {
            return;
        }
        self.cleaned = true;

        for path in self.artifacts.drain(..) {
            discard(&path);
        }
        if let Some(exchange) = self.exchange.as_mut() {
            exchange.remove();
        }
        debug!("Run directory cleaned: {}", self.work_dir.path().display());
    }
}

impl Drop for RunContext {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// A render that ran but did not succeed
#[derive(Debug, Clone)]
pub struct RenderFailure {
    pub block_id: String,
    pub exit_code: Option<i32>,
    pub message: String,
}

/// What happened to each block of a run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub rendered: Vec<String>,
    pub failed: Vec<RenderFailure>,
    /// Blocks that never reached the renderer
    pub skipped: Vec<String>,
}

impl RunSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }

    pub fn total(&self) -> usize {
        self.rendered.len() + self.failed.len() + self.skipped.len()
    }
}

/// Where and how a run renders
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub work_root: PathBuf,
    pub output_dir: PathBuf,
    pub options: RenderOptions,
}

/// Materializes and renders every block, one at a time
pub struct RenderPipeline<R> {
    renderer: R,
    template: SceneTemplate,
    settings: PipelineSettings,
}

impl<R: SceneRenderer> RenderPipeline<R> {
    pub fn new(renderer: R, template: SceneTemplate, settings: PipelineSettings) -> Self {
        Self {
            renderer,
            template,
            settings,
        }
    }

    /// Render one video per block.
    ///
    /// Per-block failures end up in the summary. Only a missing resource
    /// (template, renderer, work directory) is an `Err`. Run files are
    /// cleaned up on every path out of this function.
    pub fn generate_all(
        &self,
        blocks: &EquationSet,
        setups: &SetupMap,
    ) -> Result<RunSummary, PipelineError> {
        let mut run = RunContext::create(&self.settings.work_root)?;
        let outcome = self.run_stages(&mut run, blocks, setups);
        run.cleanup();
        outcome
    }

    fn run_stages(
        &self,
        run: &mut RunContext,
        blocks: &EquationSet,
        setups: &SetupMap,
    ) -> Result<RunSummary, PipelineError> {
        let mut summary = RunSummary::default();

        std::fs::create_dir_all(&self.settings.output_dir).map_err(|e| {
            PipelineError::io(
                format!("Failed to create {}", self.settings.output_dir.display()),
                e,
            )
        })?;

        let exchange = ExchangeFile::write(run.work_dir(), &ExchangeData::new(blocks, setups))?;
        let exchange_path = exchange.path().to_path_buf();
        run.set_exchange(exchange);

        // Instantiate
        let ids = blocks.ids();
        let mut materializer = SceneMaterializer::new(self.template.clone(), run.work_dir());
        let artifacts = materializer.instantiate(&ids)?;
        for artifact in &artifacts {
            run.track(&artifact.path);
        }
        for id in &ids {
            if !artifacts.iter().any(|a| &a.block_id == id) {
                summary.skipped.push(id.clone());
            }
        }

        // Populate
        let mut queue: Vec<SceneArtifact> = Vec::with_capacity(artifacts.len());
        for artifact in artifacts {
            if materializer.populate(
                &artifact.path,
                &artifact.block_id,
                blocks,
                setups,
                &exchange_path,
            ) {
                queue.push(artifact);
            } else {
                run.release(&artifact.path);
                summary.skipped.push(artifact.block_id);
            }
        }

        // Render
        info!("Rendering {} scenes", queue.len());
        for artifact in queue {
            let request = RenderRequest {
                artifact_path: artifact.path.clone(),
                scene_name: self.template.scene_name().to_string(),
                output_dir: self.settings.output_dir.clone(),
                output_name: sanitize_id(&artifact.block_id),
                options: self.settings.options.clone(),
            };

            let result = self.renderer.render(&request);
            run.release(&artifact.path);

            match result {
                Ok(result) if result.success() => {
                    info!("Rendered {}", artifact.block_id);
                    summary.rendered.push(artifact.block_id);
                }
                Ok(result) => {
                    warn!(
                        "Render failed for {} (exit code {:?})\nstdout:\n{}\nstderr:\n{}",
                        artifact.block_id, result.exit_code, result.stdout, result.stderr
                    );
                    summary.failed.push(RenderFailure {
                        block_id: artifact.block_id,
                        exit_code: result.exit_code,
                        message: last_line(&result.stderr),
                    });
                }
                Err(RenderError::ExecutableNotFound(program)) => {
                    error!("Renderer '{}' not found, aborting run", program);
                    return Err(PipelineError::RendererUnavailable(format!(
                        "'{}' not found",
                        program
                    )));
                }
                Err(e) => {
                    warn!("Render failed for {}: {}", artifact.block_id, e);
                    summary.failed.push(RenderFailure {
                        block_id: artifact.block_id,
                        exit_code: None,
                        message: e.to_string(),
                    });
                }
            }
        }

        Ok(summary)
    }
}

fn last_line(text: &str) -> String {
    text.lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::Document;
    use crate::equation::EquationBlock;
    use crate::extractor::EquationExtractor;
    use crate::renderer::{Quality, RenderResult};
    use crate::setup::assign_defaults;
    use crate::templates::{DATA_FILE_PLACEHOLDER, DEFAULT_SCENE_NAME};
    use std::cell::RefCell;
    use std::fs;

    /// Stands in for Manim and checks what it is handed
    #[derive(Default)]
    struct FakeRenderer {
        fail: Vec<String>,
        missing: bool,
        calls: RefCell<Vec<RenderRequest>>,
    }

    impl SceneRenderer for FakeRenderer {
        fn render(&self, request: &RenderRequest) -> Result<RenderResult, RenderError> {
            self.calls.borrow_mut().push(request.clone());
            if self.missing {
                return Err(RenderError::ExecutableNotFound("manim".into()));
            }

            let scene = fs::read_to_string(&request.artifact_path).unwrap();
            assert!(!scene.contains(DATA_FILE_PLACEHOLDER));
            let dir = request.artifact_path.parent().unwrap();
            let exchange_present = fs::read_dir(dir).unwrap().any(|e| {
                e.unwrap()
                    .file_name()
                    .to_string_lossy()
                    .starts_with("equations_data_")
            });
            assert!(exchange_present);

            let code = if self.fail.contains(&request.output_name) { 1 } else { 0 };
            Ok(RenderResult {
                exit_code: Some(code),
                stdout: String::new(),
                stderr: "Traceback\nLaTeX error\n".into(),
            })
        }
    }

    struct Setup {
        root: TempDir,
        template: SceneTemplate,
        blocks: EquationSet,
        setups: SetupMap,
    }

    fn setup() -> Setup {
        let root = TempDir::new().unwrap();
        let template_path = root.path().join("scene_template.py");
        fs::write(&template_path, SceneTemplate::builtin_text()).unwrap();
        let template = SceneTemplate::load(&template_path, DEFAULT_SCENE_NAME).unwrap();

        let mut extractor = EquationExtractor::new().unwrap();
        let blocks = extractor.extract_documents(&[Document::new(
            "a.tex",
            r"\begin{equation}x=1\end{equation}\begin{align}y=2\\z=3\end{align}",
        )]);
        let setups = assign_defaults(&blocks);

        Setup {
            root,
            template,
            blocks,
            setups,
        }
    }

    fn settings(root: &Path) -> PipelineSettings {
        PipelineSettings {
            work_root: root.join("work"),
            output_dir: root.join("media"),
            options: RenderOptions {
                quality: Quality::Low,
                disable_caching: true,
                verbosity: "WARNING".into(),
            },
        }
    }

    fn residue(root: &Path) -> usize {
        fs::read_dir(root.join("work")).unwrap().count()
    }

    #[test]
    fn test_generate_all_renders_every_block() {
        let s = setup();
        let renderer = FakeRenderer::default();
        let pipeline = RenderPipeline::new(&renderer, s.template.clone(), settings(s.root.path()));

        let summary = pipeline.generate_all(&s.blocks, &s.setups).unwrap();
        assert_eq!(summary.rendered, vec!["a.tex_block_0", "a.tex_block_1"]);
        assert!(summary.all_succeeded());

        let calls = renderer.calls.borrow();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].scene_name, "GeneratedScene");
        assert_eq!(calls[0].output_name, "a_tex_block_0");
        assert!(calls.iter().all(|c| !c.artifact_path.exists()));
        assert_eq!(residue(s.root.path()), 0);
    }

    #[test]
    fn test_failed_render_is_recorded_and_cleaned() {
        let s = setup();
        let renderer = FakeRenderer {
            fail: vec!["a_tex_block_1".into()],
            ..Default::default()
        };
        let pipeline = RenderPipeline::new(&renderer, s.template.clone(), settings(s.root.path()));

        let summary = pipeline.generate_all(&s.blocks, &s.setups).unwrap();
        assert_eq!(summary.rendered, vec!["a.tex_block_0"]);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].block_id, "a.tex_block_1");
        assert_eq!(summary.failed[0].exit_code, Some(1));
        assert_eq!(summary.failed[0].message, "LaTeX error");
        assert!(!summary.all_succeeded());
        assert_eq!(residue(s.root.path()), 0);
    }

    #[test]
    fn test_missing_renderer_aborts_and_cleans() {
        let s = setup();
        let renderer = FakeRenderer {
            missing: true,
            ..Default::default()
        };
        let pipeline = RenderPipeline::new(&renderer, s.template.clone(), settings(s.root.path()));

        let result = pipeline.generate_all(&s.blocks, &s.setups);
        assert!(matches!(result, Err(PipelineError::RendererUnavailable(_))));
        assert_eq!(renderer.calls.borrow().len(), 1);
        assert_eq!(residue(s.root.path()), 0);
    }

    #[test]
    fn test_broken_artifacts_never_rendered() {
        let s = setup();
        // Template passes the load check, then loses its placeholder on disk
        fs::write(
            s.template.path(),
            SceneTemplate::builtin_text().replace(DATA_FILE_PLACEHOLDER, "None"),
        )
        .unwrap();
        let renderer = FakeRenderer::default();
        let pipeline = RenderPipeline::new(&renderer, s.template.clone(), settings(s.root.path()));

        let summary = pipeline.generate_all(&s.blocks, &s.setups).unwrap();
        assert!(renderer.calls.borrow().is_empty());
        assert_eq!(summary.skipped, vec!["a.tex_block_0", "a.tex_block_1"]);
        assert_eq!(residue(s.root.path()), 0);
    }

    #[test]
    fn test_uncopyable_block_is_skipped_others_render() {
        let mut s = setup();
        let unwritable = "x".repeat(300);
        assert!(s.blocks.insert(EquationBlock {
            id: unwritable.clone(),
            lines: vec!["w=4".into()],
        }));
        s.setups = assign_defaults(&s.blocks);
        let renderer = FakeRenderer::default();
        let pipeline = RenderPipeline::new(&renderer, s.template.clone(), settings(s.root.path()));

        let summary = pipeline.generate_all(&s.blocks, &s.setups).unwrap();
        assert_eq!(summary.rendered, vec!["a.tex_block_0", "a.tex_block_1"]);
        assert_eq!(summary.skipped, vec![unwritable]);
        assert!(summary.failed.is_empty());
        assert!(!summary.all_succeeded());
        assert_eq!(summary.total(), 3);
        assert_eq!(renderer.calls.borrow().len(), 2);
        assert_eq!(residue(s.root.path()), 0);
    }

    #[test]
    fn test_template_removed_before_run_is_fatal() {
        let s = setup();
        fs::remove_file(s.template.path()).unwrap();
        let renderer = FakeRenderer::default();
        let pipeline = RenderPipeline::new(&renderer, s.template.clone(), settings(s.root.path()));

        let result = pipeline.generate_all(&s.blocks, &s.setups);
        assert!(matches!(result, Err(PipelineError::TemplateMissing(_))));
        assert_eq!(residue(s.root.path()), 0);
    }

    #[test]
    fn test_run_context_cleanup_runs_once() {
        let root = TempDir::new().unwrap();
        let mut run = RunContext::create(root.path()).unwrap();
        let artifact = run.work_dir().join("scene_x.py");
        fs::write(&artifact, "x").unwrap();
        run.track(&artifact);
        assert_eq!(run.live_artifacts().len(), 1);

        run.cleanup();
        assert!(run.is_cleaned());
        assert!(!artifact.exists());
        assert!(run.live_artifacts().is_empty());
        run.cleanup();
    }

    #[test]
    fn test_last_line() {
        assert_eq!(last_line("a\nb\n\n"), "b");
        assert_eq!(last_line(""), "");
    }
}
