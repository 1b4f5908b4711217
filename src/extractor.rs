use crate::documents::Document;
use crate::environment::{DelimiterEnvironment, EnvironmentMatcher, ENVIRONMENTS};
use crate::equation::{EquationBlock, EquationSet};
use log::{debug, info, warn};
use regex::Regex;
use std::path::{Path, PathBuf};

/// A document that could not be read
#[derive(Debug, Clone)]
pub struct SkippedDocument {
    pub path: PathBuf,
    pub reason: String,
}

/// Pulls equation blocks out of LaTeX documents.
///
/// One extractor is one run: the block counter is shared by every document it
/// sees, so ids stay unique even when documents share a name.
pub struct EquationExtractor {
    matchers: Vec<EnvironmentMatcher>,
    line_break: Regex,
    counter: usize,
    skipped: Vec<SkippedDocument>,
}

impl EquationExtractor {
    pub fn new() -> Result<Self, regex::Error> {
        let matchers = ENVIRONMENTS
            .iter()
            .map(|env| EnvironmentMatcher::new(*env))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            matchers,
            line_break: Regex::new(r"\\\\\s*")?,
            counter: 0,
            skipped: Vec::new(),
        })
    }

    /// Read and extract every document. Unreadable documents are skipped with
    /// a warning and recorded in [`skipped`](Self::skipped).
    pub fn extract(&mut self, paths: &[PathBuf]) -> EquationSet {
        let mut blocks = EquationSet::new();
        let mut read = 0;
        for path in paths {
            match Document::read(path) {
                Ok(doc) => {
                    read += 1;
                    self.extract_into(&doc, &mut blocks);
                }
                Err(e) => self.skip(path, format!("{:#}", e)),
            }
        }
        info!(
            "Extracted {} equation blocks from {} documents",
            blocks.len(),
            read
        );
        blocks
    }

    /// Extract from documents already in memory
    pub fn extract_documents(&mut self, documents: &[Document]) -> EquationSet {
        let mut blocks = EquationSet::new();
        for doc in documents {
            self.extract_into(doc, &mut blocks);
        }
        blocks
    }

    pub fn skipped(&self) -> &[SkippedDocument] {
        &self.skipped
    }

    fn skip(&mut self, path: &Path, reason: String) {
        warn!("Skipping document {}: {}", path.display(), reason);
        self.skipped.push(SkippedDocument {
            path: path.to_path_buf(),
            reason,
        });
    }

    fn extract_into(&mut self, doc: &Document, blocks: &mut EquationSet) {
        let prefix = doc.name();
        let mut found = 0;

        for matcher in &self.matchers {
            let env = matcher.environment();
            for span in matcher.find_spans(doc.text()) {
                let lines = split_lines(span, env, &self.line_break);
                if lines.is_empty() {
                    debug!("Ignoring empty {} span in {}", env.name, prefix);
                    continue;
                }

                let id = format!("{}_block_{}", prefix, self.counter);
                self.counter += 1;
                debug!("{} -> {} ({} lines)", id, env.name, lines.len());
                if blocks.insert(EquationBlock { id, lines }) {
                    found += 1;
                }
            }
        }

        debug!("{}: {} blocks", doc.path().display(), found);
    }
}

/// Turn a raw span into trimmed, non-empty logical lines
fn split_lines(span: &str, env: &DelimiterEnvironment, line_break: &Regex) -> Vec<String> {
    if env.is_multiline {
        line_break
            .split(span)
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    } else {
        let line = span.trim();
        if line.is_empty() {
            Vec::new()
        } else {
            vec![line.to_string()]
        }
    }
}
