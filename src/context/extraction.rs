use crate::documents::DocumentSource;
use crate::equation::EquationSet;
use crate::extractor::EquationExtractor;
use crate::setup::{assign_defaults, SetupMap};
use anyhow::{Context, Result};
use std::path::Path;

pub struct ExtractionContext;

impl ExtractionContext {
    /// Find documents in `dir`, extract their equations and assign defaults
    pub fn run(dir: &Path, extension: &str) -> Result<(EquationSet, SetupMap)> {
        println!("📂 Reading .{} documents in {}", extension, dir.display());
        let paths = DocumentSource::discover(dir, extension)?;
        println!("   Found {} documents", paths.len());

        let mut extractor =
            EquationExtractor::new().context("Failed to build delimiter matchers")?;
        let blocks = extractor.extract(&paths);

        for skipped in extractor.skipped() {
            println!("  ✗ Skipped {}: {}", skipped.path.display(), skipped.reason);
        }

        println!("\n🧮 Extracted {} equation blocks:", blocks.len());
        for block in &blocks {
            println!("  ✓ {} ({} lines)", block.id, block.line_count());
        }

        let setups = assign_defaults(&blocks);
        if setups.is_empty() {
            println!("⚠️  No equations found, nothing to animate");
        }

        Ok((blocks, setups))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_run_on_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("a.tex"),
            r"\begin{equation}x=1\end{equation}\begin{align}y=2\\z=3\end{align}",
        )
        .unwrap();

        let (blocks, setups) = ExtractionContext::run(dir.path(), "tex").unwrap();
        assert_eq!(blocks.ids(), vec!["a.tex_block_0", "a.tex_block_1"]);
        assert_eq!(setups["a.tex_block_1"].duration_seconds, 3.0);
    }

    #[test]
    fn test_missing_directory() {
        let err = ExtractionContext::run(Path::new("/nonexistent/eqanim"), "tex").unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
