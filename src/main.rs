use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use eqanim::context::{ExtractionContext, RenderContext};
use eqanim::renderer::Quality;
use eqanim::{assign_defaults, AppConfig, DocumentSource, EquationExtractor, ExchangeData, SceneTemplate};
use std::path::PathBuf;

/// Exit code for `--strict` runs where some equation did not render
const EXIT_INCOMPLETE: i32 = 2;

#[derive(Parser)]
#[command(name = "eqanim")]
#[command(about = "Equation Animator - one Manim video per LaTeX equation", long_about = None)]
struct Cli {
    /// Directory containing the LaTeX documents
    #[arg(value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Config file (default: eqanim.toml in the working directory, if any)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Scene template to instantiate per equation
    #[arg(long)]
    template: Option<PathBuf>,

    /// Directory the renderer writes videos to
    #[arg(long)]
    output: Option<PathBuf>,

    /// Render quality
    #[arg(long, value_enum)]
    quality: Option<Quality>,

    /// Exit with code 2 unless every equation rendered
    #[arg(long)]
    strict: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract equations and print them with their default setups as JSON
    Extract {
        /// Directory containing the LaTeX documents
        #[arg(value_name = "DIR")]
        dir: Option<PathBuf>,
    },
    /// Print the built-in scene template
    Template {
        /// Write the template to this file instead of printing it
        #[arg(long)]
        write: Option<PathBuf>,
    },
    /// Print the effective configuration as TOML
    Config,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn init_logging(verbose: u8) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if let Some(level) = log_level(verbose) {
        builder.filter_level(level);
    }
    builder.format_timestamp(None).init();
}

/// Level forced by `-v` flags; `None` leaves `RUST_LOG` or the `warn` default
fn log_level(verbose: u8) -> Option<log::LevelFilter> {
    match verbose {
        0 => None,
        1 => Some(log::LevelFilter::Info),
        _ => Some(log::LevelFilter::Debug),
    }
}

fn run(cli: Cli) -> Result<i32> {
    let mut config =
        AppConfig::load_from(cli.config.as_deref()).context("Failed to load configuration")?;

    // Handle subcommands
    match cli.command {
        Some(Commands::Extract { dir }) => {
            let dir = dir.unwrap_or(config.documents.dir);
            let paths = DocumentSource::discover(&dir, &config.documents.extension)?;
            let mut extractor = EquationExtractor::new()?;
            let blocks = extractor.extract(&paths);
            let setups = assign_defaults(&blocks);
            println!("{}", ExchangeData::new(&blocks, &setups).to_json()?);
            return Ok(0);
        }
        Some(Commands::Template { write }) => {
            match write {
                Some(path) => {
                    std::fs::write(&path, SceneTemplate::builtin_text())
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("📄 Scene template written to: {}", path.display());
                }
                None => print!("{}", SceneTemplate::builtin_text()),
            }
            return Ok(0);
        }
        Some(Commands::Config) => {
            print!("{}", toml::to_string_pretty(&config)?);
            return Ok(0);
        }
        None => {}
    }

    if let Some(template) = cli.template {
        config.paths.template = template;
    }
    if let Some(output) = cli.output {
        config.paths.output_dir = output;
    }
    if let Some(quality) = cli.quality {
        config.renderer.quality = quality;
    }
    let dir = cli.dir.unwrap_or_else(|| config.documents.dir.clone());

    println!("🎞️  Equation Animator\n");
    let (blocks, setups) = ExtractionContext::run(&dir, &config.documents.extension)?;
    if blocks.is_empty() {
        return Ok(0);
    }

    let summary = RenderContext::run(&config, &blocks, &setups)?;
    if cli.strict && !summary.all_succeeded() {
        eprintln!(
            "\n❌ {} of {} equations did not render",
            summary.failed.len() + summary.skipped.len(),
            summary.total()
        );
        return Ok(EXIT_INCOMPLETE);
    }

    Ok(0)
}
