//! Stateless block transformations.
//!
//! Every function takes the current [`Snapshot`] and returns a new one; the
//! input is never modified. Functions that can legitimately find nothing to do
//! return `Option<Snapshot>`.

use crate::editing::snapshot::{ChangeTag, Snapshot};
use crate::models::{
    Block, BlockKey, BlockType, CharMeta, Document, EntityKey, Selection, StyleRuns, StyleSet,
};

/// Direction of a list depth change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthChange {
    Indent,
    Outdent,
}

/// Insert a newline inside the current block instead of splitting it.
///
/// A range selection is deleted first; the newline then takes the style at
/// the resulting cursor and never carries an entity.
pub fn insert_soft_newline(snapshot: &Snapshot) -> Snapshot {
    let selection = snapshot.selection();

    let (document, style) = if selection.is_collapsed() {
        let style = current_style(snapshot.document(), selection);
        (snapshot.document().clone(), style)
    } else {
        let (cleared, _) = remove_range_in(snapshot.document(), selection);
        let style = cleared
            .block_for_key(selection.start_key())
            .style()
            .style_at(selection.start_offset());
        (cleared, style)
    };

    let (document, selection) = insert_text_in(
        &document,
        selection.start_key(),
        selection.start_offset(),
        "\n",
        CharMeta::styled(style),
    );
    snapshot.push(document, selection, ChangeTag::InsertFragment)
}

/// Leave a list from an empty list item: outdent one level, or turn the item
/// into an unstyled block at depth 0.
pub fn exit_list_item(snapshot: &Snapshot) -> Snapshot {
    let block = snapshot.start_block();
    debug_assert!(
        block.is_list_item() && block.is_empty(),
        "list exit requires an empty list item"
    );

    let key = block.key().clone();
    match block.depth() {
        0 => change_block_type(snapshot, &key, BlockType::Unstyled),
        depth => change_block_depth(snapshot, &key, depth - 1),
    }
}

/// Open an empty unstyled block after a header or code block whose end holds the cursor
pub fn split_after(snapshot: &Snapshot) -> Snapshot {
    let block = snapshot.start_block();
    debug_assert!(
        block.block_type().is_special() && snapshot.selection().start_offset() == block.len(),
        "split-after requires the cursor at the end of a special block"
    );

    let key = block.key().clone();
    insert_block_after(snapshot, &key, BlockType::Unstyled)
}

/// Insert an empty block of `block_type` right after block `key` and move the cursor into it
pub fn insert_block_after(snapshot: &Snapshot, key: &BlockKey, block_type: BlockType) -> Snapshot {
    let document = snapshot.document();
    let position = position_of(document, key);
    let new_key = document.generate_key();

    let document = document.splice_blocks(
        position + 1..position + 1,
        [Block::empty(new_key.clone(), block_type)],
    );
    snapshot.push(
        document,
        Selection::collapsed(new_key, 0),
        ChangeTag::SplitBlock,
    )
}

/// Set the type of block `key`; returns an unchanged copy if it already has that type
pub fn change_block_type(snapshot: &Snapshot, key: &BlockKey, block_type: BlockType) -> Snapshot {
    let block = snapshot.document().block_for_key(key);
    if block.block_type() == block_type {
        return snapshot.clone();
    }

    let document = snapshot
        .document()
        .replace_block(block.clone().with_type(block_type));
    snapshot.push(
        document,
        snapshot.selection().clone(),
        ChangeTag::ChangeBlockType,
    )
}

/// Set the depth of block `key`; returns an unchanged copy if it already has that depth
pub fn change_block_depth(snapshot: &Snapshot, key: &BlockKey, depth: usize) -> Snapshot {
    let block = snapshot.document().block_for_key(key);
    if block.depth() == depth {
        return snapshot.clone();
    }

    let document = snapshot
        .document()
        .replace_block(block.clone().with_depth(depth));
    snapshot.push(document, snapshot.selection().clone(), ChangeTag::AdjustDepth)
}

/// Indent or outdent the list item holding the selection, bounded by `0..=max_depth`.
///
/// Indent is `min(max_depth, depth + 1)`, so an item nested deeper than the
/// bound is pulled back to it. Returns `None` when the depth would not change.
pub fn adjust_depth(snapshot: &Snapshot, change: DepthChange, max_depth: usize) -> Option<Snapshot> {
    let block = snapshot.start_block();
    debug_assert!(block.is_list_item(), "depth changes apply to list items");

    let depth = block.depth();
    let new_depth = match change {
        DepthChange::Outdent => depth.saturating_sub(1),
        DepthChange::Indent => (depth + 1).min(max_depth),
    };
    if new_depth == depth {
        return None;
    }

    let key = block.key().clone();
    Some(change_block_depth(snapshot, &key, new_depth))
}

/// Delete the selected range, pulling text after it up to the start point
pub fn remove_range(snapshot: &Snapshot) -> Snapshot {
    if snapshot.selection().is_collapsed() {
        return snapshot.clone();
    }
    let (document, selection) = remove_range_in(snapshot.document(), snapshot.selection());
    snapshot.push(document, selection, ChangeTag::RemoveRange)
}

/// Replace the selection with typed `text`, inheriting the current inline style
pub fn insert_text(snapshot: &Snapshot, text: &str) -> Snapshot {
    let selection = snapshot.selection();
    let meta = CharMeta {
        style: current_style(snapshot.document(), selection),
        entity: current_entity(snapshot.document(), selection),
    };

    let (document, selection) = remove_range_in(snapshot.document(), selection);
    let (document, selection) = insert_text_in(
        &document,
        selection.start_key(),
        selection.start_offset(),
        text,
        meta,
    );
    snapshot.push(document, selection, ChangeTag::InsertCharacters)
}

/// Default Return: split the block at the cursor into two blocks of the same type.
///
/// The new block takes the text after the cursor and receives the cursor.
pub fn split_block(snapshot: &Snapshot) -> Snapshot {
    let (document, at) = remove_range_in(snapshot.document(), snapshot.selection());
    let offset = at.start_offset();
    let position = position_of(&document, at.start_key());
    let block = &document.blocks()[position];
    let len = block.len();

    let head = block.splice(offset..len, "", &StyleRuns::new());
    let new_key = document.generate_key();
    let tail = Block::empty(new_key.clone(), block.block_type())
        .with_depth(block.depth())
        .with_language(block.language().map(str::to_string))
        .with_content(block.text_slice(offset..len), block.style().slice(offset..len));

    let document = document.splice_blocks(position..position + 1, [head, tail]);
    snapshot.push(
        document,
        Selection::collapsed(new_key, 0),
        ChangeTag::SplitBlock,
    )
}

/// Default Backspace.
///
/// Removes a range selection, otherwise the character before the cursor; at
/// the start of a block merges it into the previous one. Returns `None` at the
/// very start of the document.
pub fn backspace(snapshot: &Snapshot) -> Option<Snapshot> {
    let selection = snapshot.selection();
    if !selection.is_collapsed() {
        return Some(remove_range(snapshot));
    }

    let key = selection.start_key().clone();
    let offset = selection.start_offset();
    let range = if offset > 0 {
        Selection {
            anchor_key: key.clone(),
            anchor_offset: offset - 1,
            focus_key: key,
            focus_offset: offset,
            is_backward: false,
        }
    } else {
        let previous = snapshot.document().block_before(&key)?;
        Selection {
            anchor_key: previous.key().clone(),
            anchor_offset: previous.len(),
            focus_key: key,
            focus_offset: 0,
            is_backward: false,
        }
    };

    let (document, selection) = remove_range_in(snapshot.document(), &range);
    Some(snapshot.push(document, selection, ChangeTag::BackspaceCharacter))
}

/// Toolbar block-type toggle.
///
/// Every block touched by the selection becomes `block_type` at depth 0, or
/// `unstyled` when the block holding the selection start already has that
/// type. A range ending at offset 0 of a later block leaves that block alone.
pub fn toggle_block_type(snapshot: &Snapshot, block_type: BlockType) -> Snapshot {
    let target = if snapshot.start_block().block_type() == block_type {
        BlockType::Unstyled
    } else {
        block_type
    };

    let document = snapshot.document();
    let selection = snapshot.selection();
    let start = position_of(document, selection.start_key());
    let mut end = position_of(document, selection.end_key());
    if end > start && selection.end_offset() == 0 {
        end -= 1;
    }
    let retyped: Vec<Block> = document.blocks()[start..=end]
        .iter()
        .map(|block| block.clone().with_type(target).with_depth(0))
        .collect();

    let document = document.splice_blocks(start..end + 1, retyped);
    snapshot.push(document, selection.clone(), ChangeTag::ChangeBlockType)
}

/// Inline style a character inserted at `selection` inherits.
///
/// Collapsed: the character before the cursor, else the first character of
/// the block, else the last character of the nearest non-empty block above.
/// Range: the first selected character, else the character before the start.
pub fn current_style(document: &Document, selection: &Selection) -> StyleSet {
    let key = selection.start_key();
    let offset = selection.start_offset();
    let block = document.block_for_key(key);

    if !selection.is_collapsed() && offset < block.len() {
        return block.style().style_at(offset);
    }
    if offset > 0 {
        return block.style().style_at(offset - 1);
    }
    if selection.is_collapsed() && !block.is_empty() {
        return block.style().style_at(0);
    }
    style_above(document, key)
}

fn style_above(document: &Document, key: &BlockKey) -> StyleSet {
    let position = position_of(document, key);
    document.blocks()[..position]
        .iter()
        .rev()
        .find(|block| !block.is_empty())
        .map(|block| block.style().style_at(block.len() - 1))
        .unwrap_or_default()
}

/// Entity typed text continues: only when the cursor sits strictly inside an entity
fn current_entity(document: &Document, selection: &Selection) -> Option<EntityKey> {
    let block = document.block_for_key(selection.start_key());
    let offset = selection.start_offset();
    if !selection.is_collapsed() {
        return block.style().entity_at(offset);
    }
    if offset == 0 {
        return None;
    }
    let before = block.style().entity_at(offset - 1);
    if before == block.style().entity_at(offset) {
        before
    } else {
        None
    }
}

fn position_of(document: &Document, key: &BlockKey) -> usize {
    document
        .index_of(key)
        .unwrap_or_else(|| panic!("no block with key {key} in document"))
}

/// Delete `selection` from `document`; returns the new document and the collapsed cursor
fn remove_range_in(document: &Document, selection: &Selection) -> (Document, Selection) {
    let start_offset = selection.start_offset();
    let cursor = Selection::collapsed(selection.start_key().clone(), start_offset);
    if selection.is_collapsed() {
        return (document.clone(), cursor);
    }

    let start_index = position_of(document, selection.start_key());
    let end_index = position_of(document, selection.end_key());
    let start = &document.blocks()[start_index];
    let end = &document.blocks()[end_index];
    let end_offset = selection.end_offset();

    let merged = start.splice(
        start_offset..start.len(),
        end.text_slice(end_offset..end.len()),
        &end.style().slice(end_offset..end.len()),
    );
    let document = document.splice_blocks(start_index..end_index + 1, [merged]);
    (document, cursor)
}

fn insert_text_in(
    document: &Document,
    key: &BlockKey,
    offset: usize,
    text: &str,
    meta: CharMeta,
) -> (Document, Selection) {
    let inserted_len = text.chars().count();
    let block = document.block_for_key(key);
    let updated = block.splice(offset..offset, text, &StyleRuns::uniform(inserted_len, meta));

    (
        document.replace_block(updated),
        Selection::collapsed(key.clone(), offset + inserted_len),
    )
}
