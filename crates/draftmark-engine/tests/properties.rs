use draftmark_engine::editing::{
    CommandResolver, EditKey, KeyIntent, Modifiers, Resolution, ResolverConfig, Snapshot,
};
use draftmark_engine::models::{Block, BlockKey, BlockType, Document, Selection};
use proptest::prelude::*;
use proptest::sample::Index;

const BLOCK_TYPES: [BlockType; 10] = [
    BlockType::Unstyled,
    BlockType::HeaderOne,
    BlockType::HeaderTwo,
    BlockType::HeaderThree,
    BlockType::HeaderFour,
    BlockType::HeaderFive,
    BlockType::HeaderSix,
    BlockType::UnorderedListItem,
    BlockType::OrderedListItem,
    BlockType::CodeBlock,
];

fn block_parts() -> impl Strategy<Value = (BlockType, usize, String)> {
    (
        prop::sample::select(BLOCK_TYPES.to_vec()),
        0usize..4,
        "[a-z é]{0,8}",
    )
}

fn build(parts: Vec<(BlockType, usize, String)>) -> Document {
    let blocks = parts
        .into_iter()
        .enumerate()
        .map(|(i, (block_type, depth, text))| {
            let depth = if block_type.is_list_item() { depth } else { 0 };
            Block::new(BlockKey::new(format!("b{i}")), block_type, text).with_depth(depth)
        })
        .collect();
    Document::new(blocks).unwrap()
}

/// A document of up to six blocks with a cursor somewhere inside it
fn cursor_snapshot() -> impl Strategy<Value = Snapshot> {
    (
        prop::collection::vec(block_parts(), 1..6),
        any::<Index>(),
        any::<Index>(),
    )
        .prop_map(|(parts, block_pick, offset_pick)| {
            let doc = build(parts);
            let block = &doc.blocks()[block_pick.index(doc.block_count())];
            let selection =
                Selection::collapsed(block.key().clone(), offset_pick.index(block.len() + 1));
            Snapshot::new(doc, selection).unwrap()
        })
}

fn key(key: EditKey, modifiers: Modifiers) -> KeyIntent {
    KeyIntent::new(key, modifiers)
}

proptest! {
    #[test]
    fn soft_newline_preserves_block_count(snapshot in cursor_snapshot()) {
        let result = CommandResolver::default()
            .resolve(key(EditKey::Return, Modifiers::SHIFT), &snapshot)
            .into_snapshot();

        let result = result.expect("soft newline always applies");
        prop_assert_eq!(result.document().block_count(), snapshot.document().block_count());
        prop_assert_eq!(
            result.start_block().len(),
            snapshot.start_block().len() + 1
        );
    }

    #[test]
    fn list_exit_outdents_or_unstyles(
        ordered in any::<bool>(),
        depth in 0usize..6,
    ) {
        let block_type = if ordered {
            BlockType::OrderedListItem
        } else {
            BlockType::UnorderedListItem
        };
        let doc = build(vec![(block_type, depth, String::new())]);
        let snapshot = Snapshot::from_document(doc);

        let result = CommandResolver::default()
            .resolve(key(EditKey::Return, Modifiers::NONE), &snapshot)
            .into_snapshot();

        let result = result.expect("empty list item always exits");
        let block = result.start_block();
        prop_assert_eq!(block.key().as_str(), "b0");
        prop_assert_eq!(block.text(), "");
        if depth == 0 {
            prop_assert_eq!(block.block_type(), BlockType::Unstyled);
            prop_assert_eq!(block.depth(), 0);
        } else {
            prop_assert_eq!(block.block_type(), block_type);
            prop_assert_eq!(block.depth(), depth - 1);
        }
    }

    #[test]
    fn split_after_grows_by_one(snapshot in cursor_snapshot()) {
        let block = snapshot.start_block();
        prop_assume!(block.block_type().is_special());
        let at_end = Selection::collapsed(block.key().clone(), block.len());
        let snapshot = snapshot.with_selection(at_end).unwrap();
        let position = snapshot.document().index_of(snapshot.selection().start_key()).unwrap();

        let result = CommandResolver::default()
            .resolve(key(EditKey::Return, Modifiers::NONE), &snapshot)
            .into_snapshot();

        let result = result.expect("special block at end always splits");
        let blocks = result.document().blocks();
        prop_assert_eq!(blocks.len(), snapshot.document().block_count() + 1);
        let inserted = &blocks[position + 1];
        prop_assert_eq!(inserted.block_type(), BlockType::Unstyled);
        prop_assert!(inserted.is_empty());
        prop_assert_eq!(result.selection(), &Selection::collapsed(inserted.key().clone(), 0));
        prop_assert_eq!(&blocks[position], snapshot.start_block());
    }

    #[test]
    fn tab_ignores_non_list_blocks(snapshot in cursor_snapshot(), shift in any::<bool>()) {
        prop_assume!(!snapshot.start_block().is_list_item());
        let modifiers = Modifiers { shift, ..Modifiers::NONE };

        let resolution = CommandResolver::default().resolve(key(EditKey::Tab, modifiers), &snapshot);

        prop_assert_eq!(resolution, Resolution::NoMatch);
    }

    #[test]
    fn depth_stays_within_bounds(
        snapshot in cursor_snapshot(),
        max_depth in 0usize..4,
        presses in prop::collection::vec(any::<bool>(), 0..12),
    ) {
        prop_assume!(snapshot.start_block().is_list_item());
        let resolver = CommandResolver::new(ResolverConfig { max_depth });

        // Once Tab has been pressed the item stays within the bound
        let mut current = snapshot;
        let mut indented = false;
        for shift in presses {
            let modifiers = Modifiers { shift, ..Modifiers::NONE };
            if let Resolution::Changed(next) = resolver.resolve(key(EditKey::Tab, modifiers), &current) {
                current = next;
            }
            indented |= !shift;
            if indented {
                prop_assert!(current.start_block().depth() <= max_depth);
            }
        }
    }

    #[test]
    fn resolution_leaves_input_snapshot_untouched(
        snapshot in cursor_snapshot(),
        return_key in any::<bool>(),
        shift in any::<bool>(),
    ) {
        let before = snapshot.clone();
        let edit_key = if return_key { EditKey::Return } else { EditKey::Tab };
        let modifiers = Modifiers { shift, ..Modifiers::NONE };

        let _ = CommandResolver::default().resolve(key(edit_key, modifiers), &snapshot);

        prop_assert_eq!(snapshot, before);
    }
}
