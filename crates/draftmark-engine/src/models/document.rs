use std::collections::{BTreeMap, HashMap};
use std::ops::Range;

use serde::Serialize;
use thiserror::Error;

use crate::models::block::{Block, BlockKey, BlockType};
use crate::models::style::{Entity, EntityKey, StyleSet};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("Document must contain at least one block")]
    Empty,
    #[error("Duplicate block key: {0}")]
    DuplicateKey(BlockKey),
    #[error("Block {key} references unknown entity {entity:?}")]
    UnknownEntity { key: BlockKey, entity: EntityKey },
    #[error("Selection references unknown block: {0}")]
    UnknownBlock(BlockKey),
    #[error("Offset {offset} is outside block {key} of length {len}")]
    OffsetOutOfRange {
        key: BlockKey,
        offset: usize,
        len: usize,
    },
    #[error("Selection direction disagrees with document order (is_backward = {is_backward})")]
    DirectionMismatch { is_backward: bool },
}

/// Ordered, never-empty sequence of blocks plus the entities they reference.
///
/// A `Document` is a value: every edit builds a new one, and the key index is
/// rebuilt alongside the block vector so lookups stay O(1).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    blocks: Vec<Block>,
    #[serde(skip)]
    index: HashMap<BlockKey, usize>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    entities: BTreeMap<EntityKey, Entity>,
}

impl Document {
    pub fn new(blocks: Vec<Block>) -> Result<Self, DocumentError> {
        Self::with_entities(blocks, BTreeMap::new())
    }

    pub fn with_entities(
        blocks: Vec<Block>,
        entities: BTreeMap<EntityKey, Entity>,
    ) -> Result<Self, DocumentError> {
        if blocks.is_empty() {
            return Err(DocumentError::Empty);
        }

        let mut index = HashMap::with_capacity(blocks.len());
        for (position, block) in blocks.iter().enumerate() {
            if index.insert(block.key().clone(), position).is_some() {
                return Err(DocumentError::DuplicateKey(block.key().clone()));
            }
            for (_, meta) in block.style().ranges() {
                if let Some(entity) = meta.entity
                    && !entities.contains_key(&entity)
                {
                    return Err(DocumentError::UnknownEntity {
                        key: block.key().clone(),
                        entity,
                    });
                }
            }
        }

        Ok(Self {
            blocks,
            index,
            entities,
        })
    }

    /// Single empty unstyled block
    pub fn empty() -> Self {
        Self::from_parts(
            vec![Block::empty(BlockKey::generate(), BlockType::Unstyled)],
            BTreeMap::new(),
        )
    }

    /// One unstyled block per line of `text`
    pub fn from_plain_text(text: &str) -> Self {
        let blocks = text
            .split('\n')
            .map(|line| Block::new(BlockKey::generate(), BlockType::Unstyled, line))
            .collect();
        Self::from_parts(blocks, BTreeMap::new())
    }

    /// Build from blocks produced by an edit.
    ///
    /// Panics on an empty block list or a key collision: both mean an edit
    /// broke the document invariants.
    pub(crate) fn from_parts(blocks: Vec<Block>, entities: BTreeMap<EntityKey, Entity>) -> Self {
        assert!(!blocks.is_empty(), "document must keep at least one block");
        let mut index = HashMap::with_capacity(blocks.len());
        for (position, block) in blocks.iter().enumerate() {
            if index.insert(block.key().clone(), position).is_some() {
                panic!("block key collision: {}", block.key());
            }
        }
        Self {
            blocks,
            index,
            entities,
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn first_block(&self) -> &Block {
        &self.blocks[0]
    }

    pub fn last_block(&self) -> &Block {
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn index_of(&self, key: &BlockKey) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn block(&self, key: &BlockKey) -> Option<&Block> {
        self.index_of(key).map(|position| &self.blocks[position])
    }

    /// Block for a key the caller knows to be present.
    ///
    /// Panics otherwise: a dangling key is a broken selection invariant.
    pub fn block_for_key(&self, key: &BlockKey) -> &Block {
        match self.block(key) {
            Some(block) => block,
            None => panic!("no block with key {key} in document"),
        }
    }

    pub fn block_before(&self, key: &BlockKey) -> Option<&Block> {
        let position = self.index_of(key)?;
        position.checked_sub(1).map(|before| &self.blocks[before])
    }

    pub fn block_after(&self, key: &BlockKey) -> Option<&Block> {
        let position = self.index_of(key)?;
        self.blocks.get(position + 1)
    }

    pub fn entity(&self, key: EntityKey) -> Option<&Entity> {
        self.entities.get(&key)
    }

    pub fn entities(&self) -> &BTreeMap<EntityKey, Entity> {
        &self.entities
    }

    /// A block key not used by any block of this document
    pub fn generate_key(&self) -> BlockKey {
        loop {
            let key = BlockKey::generate();
            if !self.index.contains_key(&key) {
                return key;
            }
        }
    }

    /// Copy of the document with `block` replacing the block of the same key
    pub(crate) fn replace_block(&self, block: Block) -> Self {
        let position = self
            .index_of(block.key())
            .unwrap_or_else(|| panic!("no block with key {} in document", block.key()));
        let mut blocks = self.blocks.clone();
        blocks[position] = block;
        Self {
            blocks,
            index: self.index.clone(),
            entities: self.entities.clone(),
        }
    }

    /// Copy of the document with the blocks at `range` replaced by `replacement`
    pub(crate) fn splice_blocks(
        &self,
        range: Range<usize>,
        replacement: impl IntoIterator<Item = Block>,
    ) -> Self {
        let mut blocks = Vec::with_capacity(self.blocks.len() + 1);
        blocks.extend_from_slice(&self.blocks[..range.start]);
        blocks.extend(replacement);
        blocks.extend_from_slice(&self.blocks[range.end..]);
        Self::from_parts(blocks, self.entities.clone())
    }

    /// Key-free projection of the document, for comparing documents whose keys differ
    pub fn outline(&self) -> Vec<BlockShape> {
        self.blocks
            .iter()
            .map(|block| BlockShape::of(self, block))
            .collect()
    }
}

/// Structure of one block with keys dropped and entity references resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockShape {
    pub block_type: BlockType,
    pub depth: usize,
    pub text: String,
    pub language: Option<String>,
    pub runs: Vec<ShapeRun>,
}

/// A styled or linked stretch of a [`BlockShape`]; plain text runs are omitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeRun {
    pub range: Range<usize>,
    pub style: StyleSet,
    pub link: Option<String>,
}

impl BlockShape {
    fn of(document: &Document, block: &Block) -> Self {
        let runs = block
            .style()
            .ranges()
            .filter(|(_, meta)| !meta.style.is_empty() || meta.entity.is_some())
            .map(|(range, meta)| ShapeRun {
                range,
                style: meta.style.clone(),
                link: meta
                    .entity
                    .and_then(|key| document.entity(key))
                    .map(|Entity::Link { url }| url.clone()),
            })
            .collect();

        Self {
            block_type: block.block_type(),
            depth: block.depth(),
            text: block.text().to_string(),
            language: block.language().map(str::to_string),
            runs,
        }
    }
}
