pub mod extraction;
pub mod render;

pub use extraction::ExtractionContext;
pub use render::RenderContext;
