use crate::equation::EquationSet;
use crate::errors::PipelineError;
use crate::setup::SetupMap;
use log::{debug, warn};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Payload shared by every generated scene of a run
#[derive(Debug, Serialize)]
pub struct ExchangeData<'a> {
    pub blocks: &'a EquationSet,
    pub setups: &'a SetupMap,
}

impl<'a> ExchangeData<'a> {
    pub fn new(blocks: &'a EquationSet, setups: &'a SetupMap) -> Self {
        Self { blocks, setups }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// The exchange file on disk. Written once, read-only afterwards.
#[derive(Debug)]
pub struct ExchangeFile {
    path: PathBuf,
    removed: bool,
}

impl ExchangeFile {
    /// Serialize `data` into `dir`. The file is flushed and synced before
    /// this returns, so any renderer started afterwards sees all of it.
    pub fn write(dir: &Path, data: &ExchangeData<'_>) -> Result<Self, PipelineError> {
        let json = data.to_json().map_err(|e| {
            PipelineError::io("Failed to serialize exchange data", e.into())
        })?;
        let path = dir.join(format!("equations_data_{}.json", fingerprint(&json)));

        let mut file = File::create(&path).map_err(|e| {
            PipelineError::io(format!("Failed to create {}", path.display()), e)
        })?;
        file.write_all(json.as_bytes())
            .and_then(|_| file.sync_all())
            .map_err(|e| PipelineError::io(format!("Failed to write {}", path.display()), e))?;

        debug!("Exchange file written: {}", path.display());
        Ok(Self {
            path,
            removed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Base name, as referenced from generated scenes
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Delete the file. Safe to call more than once.
    pub fn remove(&mut self) {
        if self.removed {
            return;
        }
        self.removed = true;
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove {}: {}", self.path.display(), e);
            }
        }
    }
}

/// First 12 hex digits of the SHA-256 of `content`
fn fingerprint(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let digest = format!("{:x}", hasher.finalize());
    digest[..12].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equation::EquationBlock;
    use crate::setup::assign_defaults;
    use tempfile::TempDir;

    fn sample() -> EquationSet {
        let mut blocks = EquationSet::new();
        blocks.insert(EquationBlock {
            id: "a.tex_block_0".into(),
            lines: vec!["x=1".into()],
        });
        blocks.insert(EquationBlock {
            id: "a.tex_block_1".into(),
            lines: vec!["y=2".into(), "z=3".into()],
        });
        blocks
    }

    #[test]
    fn test_write_layout() {
        let dir = TempDir::new().unwrap();
        let blocks = sample();
        let setups = assign_defaults(&blocks);

        let file = ExchangeFile::write(dir.path(), &ExchangeData::new(&blocks, &setups)).unwrap();
        assert!(file.file_name().starts_with("equations_data_"));
        assert!(file.file_name().ends_with(".json"));

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(file.path()).unwrap()).unwrap();
        assert_eq!(value["blocks"]["a.tex_block_1"], serde_json::json!(["y=2", "z=3"]));
        assert_eq!(value["setups"]["a.tex_block_1"]["duration_seconds"], 3.0);
        assert_eq!(value["setups"]["a.tex_block_0"]["animation_type"], "Write");
    }

    #[test]
    fn test_name_follows_content() {
        let dir = TempDir::new().unwrap();
        let blocks = sample();
        let setups = assign_defaults(&blocks);
        let data = ExchangeData::new(&blocks, &setups);

        let first = ExchangeFile::write(dir.path(), &data).unwrap();
        let second = ExchangeFile::write(dir.path(), &data).unwrap();
        assert_eq!(first.file_name(), second.file_name());

        let empty = EquationSet::new();
        let other = ExchangeFile::write(dir.path(), &ExchangeData::new(&empty, &setups)).unwrap();
        assert_ne!(first.file_name(), other.file_name());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let blocks = sample();
        let setups = assign_defaults(&blocks);
        let mut file = ExchangeFile::write(dir.path(), &ExchangeData::new(&blocks, &setups)).unwrap();

        file.remove();
        assert!(!file.path().exists());
        file.remove();
        assert!(!file.path().exists());
    }
}
