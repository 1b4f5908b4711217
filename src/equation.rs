use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;
use std::collections::HashMap;

/// One extracted equation and its logical lines
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, Deserialize)]
pub struct EquationBlock {
    pub id: String,
    pub lines: Vec<String>,
}

impl EquationBlock {
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

/// Blocks of a run keyed by id, in extraction order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EquationSet {
    blocks: Vec<EquationBlock>,
    index: HashMap<String, usize>,
}

impl EquationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a block. Returns false and leaves the set untouched when the id is
    /// already present or the block has no lines.
    pub fn insert(&mut self, block: EquationBlock) -> bool {
        if block.lines.is_empty() || self.contains(&block.id) {
            return false;
        }
        self.index.insert(block.id.clone(), self.blocks.len());
        self.blocks.push(block);
        true
    }

    pub fn get(&self, id: &str) -> Option<&EquationBlock> {
        self.index.get(id).map(|&i| &self.blocks[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EquationBlock> {
        self.blocks.iter()
    }

    pub fn ids(&self) -> Vec<String> {
        self.blocks.iter().map(|b| b.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn total_lines(&self) -> usize {
        self.blocks.iter().map(EquationBlock::line_count).sum()
    }
}

impl<'a> IntoIterator for &'a EquationSet {
    type Item = &'a EquationBlock;
    type IntoIter = std::slice::Iter<'a, EquationBlock>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}

/// Serialized as `{id: [lines]}`
impl Serialize for EquationSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.blocks.len()))?;
        for block in &self.blocks {
            map.serialize_entry(&block.id, &block.lines)?;
        }
        map.end()
    }
}
