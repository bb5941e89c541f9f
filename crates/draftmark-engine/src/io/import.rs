//! Markdown import.
//!
//! Turns markdown text into a flat [`Document`]: one block per heading,
//! paragraph, list item and code block, with list nesting carried as depth and
//! inline emphasis carried as style runs.

use std::collections::{BTreeMap, HashSet};

use pulldown_cmark::{CodeBlockKind, Event, Parser, Tag, TagEnd};

use crate::models::{
    Block, BlockKey, BlockType, CharMeta, Document, Entity, EntityKey, InlineStyle, StyleRuns,
    StyleSet,
};

/// Parse markdown into a document.
///
/// Never fails: markdown without any block yields a single empty unstyled block.
pub fn parse_markdown(content: &str) -> Document {
    let mut processor = MarkdownProcessor::new();
    for event in Parser::new(content) {
        processor.process_event(event);
    }
    processor.finalize()
}

/// A block whose text is still being collected
struct PendingBlock {
    block_type: BlockType,
    depth: usize,
    language: Option<String>,
    text: String,
    style: StyleRuns,
}

impl PendingBlock {
    fn new(block_type: BlockType, depth: usize) -> Self {
        Self {
            block_type,
            depth,
            language: None,
            text: String::new(),
            style: StyleRuns::new(),
        }
    }
}

/// Event-driven block builder.
///
/// pulldown-cmark nests a child list inside its parent item, between the
/// parent's text and the parent's `End(Item)`:
///
/// ```text
/// Start(List) Start(Item) Text("Parent")
///     Start(List) Start(Item) Text("Child") End(Item) End(List)
/// End(Item) End(List)
/// ```
///
/// The parent item is emitted as soon as its child list starts, so blocks come
/// out in document order and the child's depth is the list stack height.
struct MarkdownProcessor {
    blocks: Vec<Block>,
    keys: HashSet<BlockKey>,
    entities: BTreeMap<EntityKey, Entity>,
    pending: Option<PendingBlock>,
    /// One entry per open list, `true` for ordered lists
    list_stack: Vec<bool>,
    /// Open emphasis tags, innermost last
    style_stack: Vec<InlineStyle>,
    link: Option<EntityKey>,
    in_code_block: bool,
}

impl MarkdownProcessor {
    fn new() -> Self {
        Self {
            blocks: Vec::new(),
            keys: HashSet::new(),
            entities: BTreeMap::new(),
            pending: None,
            list_stack: Vec::new(),
            style_stack: Vec::new(),
            link: None,
            in_code_block: false,
        }
    }

    fn process_event(&mut self, event: Event) {
        match event {
            Event::Start(Tag::Paragraph) => {
                // Inside an item the paragraph continues the item's block
                match &self.pending {
                    Some(pending) if !self.list_stack.is_empty() => {
                        if !pending.text.is_empty() {
                            self.push_text("\n", None);
                        }
                    }
                    _ => self.start_block(BlockType::Unstyled, 0),
                }
            }
            Event::End(TagEnd::Paragraph) => {
                if self.list_stack.is_empty() {
                    self.flush_block();
                }
            }
            Event::Start(Tag::Heading { level, .. }) => {
                let block_type = BlockType::header(level as u8).unwrap_or(BlockType::Unstyled);
                self.start_block(block_type, 0);
            }
            Event::End(TagEnd::Heading(_)) => self.flush_block(),
            Event::Start(Tag::List(first_number)) => {
                // The parent item's own text is complete
                self.flush_block();
                self.list_stack.push(first_number.is_some());
            }
            Event::End(TagEnd::List(_)) => {
                self.list_stack.pop();
            }
            Event::Start(Tag::Item) => {
                let block_type = match self.list_stack.last() {
                    Some(true) => BlockType::OrderedListItem,
                    _ => BlockType::UnorderedListItem,
                };
                let depth = self.list_stack.len().saturating_sub(1);
                self.start_block(block_type, depth);
            }
            Event::End(TagEnd::Item) => self.flush_block(),
            Event::Start(Tag::CodeBlock(kind)) => {
                self.start_block(BlockType::CodeBlock, 0);
                self.in_code_block = true;
                if let CodeBlockKind::Fenced(info) = kind
                    && let Some(pending) = &mut self.pending
                {
                    let info = info.trim();
                    pending.language = (!info.is_empty()).then(|| info.to_string());
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                self.in_code_block = false;
                self.trim_trailing_newline();
                self.flush_block();
            }
            Event::Start(Tag::HtmlBlock) => self.start_block(BlockType::Unstyled, 0),
            Event::End(TagEnd::HtmlBlock) => {
                self.trim_trailing_newline();
                self.flush_block();
            }
            Event::Start(Tag::Emphasis) => self.style_stack.push(InlineStyle::Italic),
            Event::Start(Tag::Strong) => self.style_stack.push(InlineStyle::Bold),
            Event::End(TagEnd::Emphasis | TagEnd::Strong) => {
                self.style_stack.pop();
            }
            Event::Start(Tag::Link { dest_url, .. }) => {
                let key = EntityKey(self.entities.len() as u32);
                self.entities.insert(
                    key,
                    Entity::Link {
                        url: dest_url.to_string(),
                    },
                );
                self.link = Some(key);
            }
            Event::End(TagEnd::Link) => self.link = None,
            Event::Text(text) | Event::Html(text) | Event::InlineHtml(text) => {
                self.push_text(&text, None)
            }
            Event::Code(code) => self.push_text(&code, Some(InlineStyle::Code)),
            Event::SoftBreak => {
                let text = if self.in_code_block { "\n" } else { " " };
                self.push_text(text, None);
            }
            Event::HardBreak => self.push_text("\n", None),
            Event::Rule => self.flush_block(),
            _ => {}
        }
    }

    fn start_block(&mut self, block_type: BlockType, depth: usize) {
        self.flush_block();
        self.pending = Some(PendingBlock::new(block_type, depth));
    }

    /// Append text to the open block, opening a paragraph if none is open
    fn push_text(&mut self, text: &str, extra: Option<InlineStyle>) {
        let mut style: StyleSet = self.style_stack.iter().copied().collect();
        style.extend(extra);
        let meta = CharMeta {
            style,
            entity: self.link,
        };

        let pending = self
            .pending
            .get_or_insert_with(|| PendingBlock::new(BlockType::Unstyled, 0));
        pending.text.push_str(text);
        pending.style.push(text.chars().count(), meta);
    }

    fn trim_trailing_newline(&mut self) {
        if let Some(pending) = &mut self.pending
            && pending.text.ends_with('\n')
        {
            pending.text.pop();
            let len = pending.style.len();
            pending.style = pending.style.slice(0..len - 1);
        }
    }

    fn flush_block(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        let key = self.fresh_key();
        let block = Block::empty(key, pending.block_type)
            .with_depth(pending.depth)
            .with_language(pending.language)
            .with_content(pending.text, pending.style);
        self.blocks.push(block);
    }

    fn fresh_key(&mut self) -> BlockKey {
        loop {
            let key = BlockKey::generate();
            if self.keys.insert(key.clone()) {
                return key;
            }
        }
    }

    fn finalize(mut self) -> Document {
        self.flush_block();
        if self.blocks.is_empty() {
            let key = self.fresh_key();
            self.blocks.push(Block::empty(key, BlockType::Unstyled));
        }
        Document::from_parts(self.blocks, self.entities)
    }
}
