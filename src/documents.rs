use crate::errors::PipelineError;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A source document and its raw text
#[derive(Debug, Clone)]
pub struct Document {
    path: PathBuf,
    text: String,
}

impl Document {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    /// Read a document as UTF-8 text
    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read document: {}", path.display()))?;
        Ok(Self::new(path, text))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Base file name, used as the block id prefix
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }
}

/// Locates input documents in a directory
pub struct DocumentSource;

impl DocumentSource {
    /// Check that `dir` exists and is a directory
    pub fn verify_dir(dir: &Path) -> Result<(), PipelineError> {
        if !dir.exists() {
            return Err(PipelineError::DirectoryNotFound(dir.to_path_buf()));
        }
        if !dir.is_dir() {
            return Err(PipelineError::NotADirectory(dir.to_path_buf()));
        }
        Ok(())
    }

    /// Files directly inside `dir` whose extension matches (case-insensitive),
    /// sorted by file name. Finding none is an error.
    pub fn discover(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, PipelineError> {
        Self::verify_dir(dir)?;
        let extension = extension.trim_start_matches('.');

        let mut found = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| {
                PipelineError::io(
                    format!("Failed to list directory {}", dir.display()),
                    e.into(),
                )
            })?;
            let path = entry.path();
            // Follows symlinks; dangling links are not files
            if !path.is_file() {
                continue;
            }
            let matches = path
                .extension()
                .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension))
                .unwrap_or(false);
            if matches {
                found.push(path.to_path_buf());
            }
        }

        if found.is_empty() {
            return Err(PipelineError::NoDocuments {
                dir: dir.to_path_buf(),
                extension: extension.to_string(),
            });
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_verify_missing_dir() {
        let result = DocumentSource::verify_dir(Path::new("/nonexistent/eqanim/dir"));
        assert!(matches!(result, Err(PipelineError::DirectoryNotFound(_))));
    }

    #[test]
    fn test_verify_file_is_not_dir() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.tex");
        fs::write(&file, "x").unwrap();
        let result = DocumentSource::verify_dir(&file);
        assert!(matches!(result, Err(PipelineError::NotADirectory(_))));
    }

    #[test]
    fn test_discover_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.tex"), "").unwrap();
        fs::write(dir.path().join("a.TEX"), "").unwrap();
        fs::write(dir.path().join("notes.md"), "").unwrap();
        fs::create_dir(dir.path().join("sub.tex")).unwrap();
        fs::write(dir.path().join("sub.tex").join("c.tex"), "").unwrap();

        let found = DocumentSource::discover(dir.path(), ".tex").unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.TEX", "b.tex"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_discover_follows_symlinked_documents() {
        let dir = TempDir::new().unwrap();
        let elsewhere = TempDir::new().unwrap();
        let target = elsewhere.path().join("chapter.tex");
        fs::write(&target, r"\begin{equation}x=1\end{equation}").unwrap();
        std::os::unix::fs::symlink(&target, dir.path().join("linked.tex")).unwrap();
        std::os::unix::fs::symlink(elsewhere.path().join("gone.tex"), dir.path().join("dangling.tex"))
            .unwrap();

        let found = DocumentSource::discover(dir.path(), "tex").unwrap();
        assert_eq!(found, vec![dir.path().join("linked.tex")]);
        assert_eq!(Document::read(&found[0]).unwrap().name(), "linked.tex");
    }

    #[test]
    fn test_discover_empty_dir() {
        let dir = TempDir::new().unwrap();
        let result = DocumentSource::discover(dir.path(), "tex");
        assert!(matches!(result, Err(PipelineError::NoDocuments { .. })));
    }

    #[test]
    fn test_document_name_and_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("calc.tex");
        fs::write(&path, "content").unwrap();

        let doc = Document::read(&path).unwrap();
        assert_eq!(doc.name(), "calc.tex");
        assert_eq!(doc.text(), "content");

        let err = Document::read(&dir.path().join("missing.tex")).unwrap_err();
        assert!(err.to_string().contains("Failed to read document"));
    }
}
