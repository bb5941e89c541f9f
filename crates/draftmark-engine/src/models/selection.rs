use serde::Serialize;

use crate::models::block::BlockKey;
use crate::models::document::{Document, DocumentError};

/// A cursor or a range over one or more blocks, with direction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub anchor_key: BlockKey,
    pub anchor_offset: usize,
    pub focus_key: BlockKey,
    pub focus_offset: usize,
    pub is_backward: bool,
}

impl Selection {
    /// Cursor at `offset` of block `key`
    pub fn collapsed(key: BlockKey, offset: usize) -> Self {
        Self {
            anchor_key: key.clone(),
            anchor_offset: offset,
            focus_key: key,
            focus_offset: offset,
            is_backward: false,
        }
    }

    /// Selection from anchor to focus, with the direction taken from document order
    pub fn spanning(
        document: &Document,
        anchor: (BlockKey, usize),
        focus: (BlockKey, usize),
    ) -> Result<Self, DocumentError> {
        let anchor_index = document
            .index_of(&anchor.0)
            .ok_or_else(|| DocumentError::UnknownBlock(anchor.0.clone()))?;
        let focus_index = document
            .index_of(&focus.0)
            .ok_or_else(|| DocumentError::UnknownBlock(focus.0.clone()))?;
        let is_backward = (focus_index, focus.1) < (anchor_index, anchor.1);

        let selection = Self {
            anchor_key: anchor.0,
            anchor_offset: anchor.1,
            focus_key: focus.0,
            focus_offset: focus.1,
            is_backward,
        };
        selection.validate(document)?;
        Ok(selection)
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor_key == self.focus_key && self.anchor_offset == self.focus_offset
    }

    pub fn start_key(&self) -> &BlockKey {
        if self.is_backward {
            &self.focus_key
        } else {
            &self.anchor_key
        }
    }

    pub fn start_offset(&self) -> usize {
        if self.is_backward {
            self.focus_offset
        } else {
            self.anchor_offset
        }
    }

    pub fn end_key(&self) -> &BlockKey {
        if self.is_backward {
            &self.anchor_key
        } else {
            &self.focus_key
        }
    }

    pub fn end_offset(&self) -> usize {
        if self.is_backward {
            self.anchor_offset
        } else {
            self.focus_offset
        }
    }

    /// Check both endpoints against `document` and `is_backward` against their order
    pub fn validate(&self, document: &Document) -> Result<(), DocumentError> {
        let anchor = locate(document, &self.anchor_key, self.anchor_offset)?;
        let focus = locate(document, &self.focus_key, self.focus_offset)?;
        if (focus < anchor) != self.is_backward {
            return Err(DocumentError::DirectionMismatch {
                is_backward: self.is_backward,
            });
        }
        Ok(())
    }
}

/// `(block index, offset)` of a selection endpoint
fn locate(document: &Document, key: &BlockKey, offset: usize) -> Result<(usize, usize), DocumentError> {
    let index = document
        .index_of(key)
        .ok_or_else(|| DocumentError::UnknownBlock(key.clone()))?;
    let len = document.blocks()[index].len();
    if offset > len {
        return Err(DocumentError::OffsetOutOfRange {
            key: key.clone(),
            offset,
            len,
        });
    }
    Ok((index, offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::block::{Block, BlockType};
    use pretty_assertions::assert_eq;

    fn doc() -> Document {
        Document::new(vec![
            Block::new("a".into(), BlockType::Unstyled, "hello"),
            Block::new("b".into(), BlockType::Unstyled, "world"),
        ])
        .unwrap()
    }

    #[test]
    fn test_collapsed_selection() {
        let selection = Selection::collapsed("a".into(), 3);

        assert!(selection.is_collapsed());
        assert_eq!(selection.start_key().as_str(), "a");
        assert_eq!(selection.start_offset(), 3);
    }

    #[test]
    fn test_spanning_detects_backward_selection() {
        let selection = Selection::spanning(&doc(), ("b".into(), 2), ("a".into(), 1)).unwrap();

        assert!(selection.is_backward);
        assert_eq!(selection.start_key().as_str(), "a");
        assert_eq!(selection.start_offset(), 1);
        assert_eq!(selection.end_key().as_str(), "b");
        assert_eq!(selection.end_offset(), 2);
    }

    #[test]
    fn test_spanning_within_one_block() {
        let selection = Selection::spanning(&doc(), ("a".into(), 4), ("a".into(), 1)).unwrap();

        assert!(selection.is_backward);
        assert!(!selection.is_collapsed());
        assert_eq!((selection.start_offset(), selection.end_offset()), (1, 4));
    }

    #[test]
    fn test_validate_rejects_unknown_block() {
        let selection = Selection::collapsed("zz".into(), 0);

        assert_eq!(
            selection.validate(&doc()),
            Err(DocumentError::UnknownBlock("zz".into()))
        );
    }

    #[test]
    fn test_validate_rejects_direction_against_document_order() {
        let selection = Selection {
            anchor_key: "b".into(),
            anchor_offset: 2,
            focus_key: "a".into(),
            focus_offset: 1,
            is_backward: false,
        };

        assert_eq!(
            selection.validate(&doc()),
            Err(DocumentError::DirectionMismatch { is_backward: false })
        );
    }

    #[test]
    fn test_validate_rejects_backward_collapsed_cursor() {
        let selection = Selection {
            is_backward: true,
            ..Selection::collapsed("a".into(), 2)
        };

        assert!(matches!(
            selection.validate(&doc()),
            Err(DocumentError::DirectionMismatch { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_offset_past_end() {
        let result = Selection::spanning(&doc(), ("a".into(), 0), ("b".into(), 6));

        assert!(matches!(
            result,
            Err(DocumentError::OffsetOutOfRange { offset: 6, len: 5, .. })
        ));
    }
}
