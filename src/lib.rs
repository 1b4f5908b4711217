pub mod config;
pub mod context;
pub mod documents;
pub mod environment;
pub mod equation;
pub mod errors;
pub mod exchange;
pub mod extractor;
pub mod materializer;
pub mod pipeline;
pub mod renderer;
pub mod setup;
pub mod templates;

pub use config::AppConfig;
pub use documents::{Document, DocumentSource};
pub use environment::{match_spans, DelimiterEnvironment, EnvironmentMatcher, ENVIRONMENTS};
pub use equation::{EquationBlock, EquationSet};
pub use errors::{PipelineError, RenderError, TemplateError};
pub use exchange::{ExchangeData, ExchangeFile};
pub use extractor::EquationExtractor;
pub use materializer::{SceneArtifact, SceneMaterializer};
pub use pipeline::{PipelineSettings, RenderPipeline, RunContext, RunSummary};
pub use renderer::{ManimRenderer, RenderRequest, RenderResult, SceneRenderer};
pub use setup::{assign_defaults, AnimationSetup, AnimationType, SetupMap};
pub use templates::{SceneContext, SceneTemplate, TemplateContract};
