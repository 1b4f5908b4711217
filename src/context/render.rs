use crate::config::AppConfig;
use crate::equation::EquationSet;
use crate::errors::PipelineError;
use crate::pipeline::{PipelineSettings, RenderPipeline, RunSummary};
use crate::renderer::ManimRenderer;
use crate::setup::SetupMap;
use crate::templates::SceneTemplate;
use anyhow::Result;

pub struct RenderContext;

impl RenderContext {
    /// Render every block with the configured Manim command
    pub fn run(config: &AppConfig, blocks: &EquationSet, setups: &SetupMap) -> Result<RunSummary> {
        let template = SceneTemplate::load(&config.paths.template, &config.renderer.scene_name)?;
        println!("\n📄 Scene template: {}", template.path().display());

        let renderer = ManimRenderer::new(&config.renderer.program, config.renderer.args.clone());
        if !renderer.is_available() {
            println!("⚠️  Renderer '{}' did not respond to --version.", renderer.program());
            println!("   Install Manim (pip install manim) or set renderer.program in eqanim.toml");
            return Err(PipelineError::RendererUnavailable(renderer.program().to_string()).into());
        }

        println!("🎬 Rendering {} scenes with {}...", blocks.len(), renderer.program());
        let pipeline = RenderPipeline::new(
            renderer,
            template,
            PipelineSettings {
                work_root: config.paths.work_dir.clone(),
                output_dir: config.paths.output_dir.clone(),
                options: config.renderer.options(),
            },
        );
        let summary = pipeline.generate_all(blocks, setups)?;

        Self::report(&summary);
        println!("   Videos are in: {}", config.paths.output_dir.display());
        Ok(summary)
    }

    pub fn report(summary: &RunSummary) {
        println!("\n📊 Render Summary:");
        for id in &summary.rendered {
            println!("  ✓ {}", id);
        }
        for failure in &summary.failed {
            println!(
                "  ✗ {} (exit {}) {}",
                failure.block_id,
                failure
                    .exit_code
                    .map_or_else(|| "-".to_string(), |c| c.to_string()),
                failure.message
            );
        }
        for id in &summary.skipped {
            println!("  ⚠️  {} skipped", id);
        }
        println!(
            "   {}/{} rendered",
            summary.rendered.len(),
            summary.total()
        );
    }
}
