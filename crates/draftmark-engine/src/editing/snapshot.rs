use serde::Serialize;

use crate::models::{Block, Document, DocumentError, Selection};

/// What kind of edit produced a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeTag {
    Unchanged,
    InsertFragment,
    InsertCharacters,
    ChangeBlockType,
    AdjustDepth,
    SplitBlock,
    RemoveRange,
    BackspaceCharacter,
}

/// Immutable pairing of a document, a selection inside it and the edit that produced them.
///
/// Snapshots are never modified: every mutator returns a new one, so a
/// snapshot still held by a renderer stays valid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    document: Document,
    selection: Selection,
    change: ChangeTag,
}

impl Snapshot {
    /// Validate `selection` against `document` and pair them
    pub fn new(document: Document, selection: Selection) -> Result<Self, DocumentError> {
        selection.validate(&document)?;
        Ok(Self {
            document,
            selection,
            change: ChangeTag::Unchanged,
        })
    }

    /// Cursor at the start of the first block
    pub fn from_document(document: Document) -> Self {
        let selection = Selection::collapsed(document.first_block().key().clone(), 0);
        Self {
            document,
            selection,
            change: ChangeTag::Unchanged,
        }
    }

    /// Successor snapshot produced by an edit.
    ///
    /// Checks the selection only in debug builds: mutators derive it from the
    /// document they just built.
    pub(crate) fn push(&self, document: Document, selection: Selection, change: ChangeTag) -> Self {
        debug_assert_eq!(selection.validate(&document), Ok(()));
        Self {
            document,
            selection,
            change,
        }
    }

    /// Same document and tag with a different selection, e.g. after cursor movement
    pub fn with_selection(&self, selection: Selection) -> Result<Self, DocumentError> {
        selection.validate(&self.document)?;
        Ok(Self {
            document: self.document.clone(),
            selection,
            change: self.change,
        })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn change(&self) -> ChangeTag {
        self.change
    }

    /// Block holding the start of the selection
    pub fn start_block(&self) -> &Block {
        self.document.block_for_key(self.selection.start_key())
    }

    /// Structured dump of blocks, entities, selection and change tag
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
