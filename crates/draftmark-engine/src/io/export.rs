//! Markdown export.
//!
//! Blocks are written in order: headings as `#` lines, list items as `-` or
//! numbered items indented four spaces per depth, code blocks fenced (or
//! indented when GFM is off) and everything else as paragraphs. Consecutive
//! list items share a list; every other pair of blocks is separated by a blank
//! line.

use crate::models::{Block, BlockType, Document, Entity, InlineStyle, StyleSet};

const LIST_INDENT: &str = "    ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    /// Fenced code blocks instead of indented ones
    pub gfm: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self { gfm: true }
    }
}

/// Serialize `document` as markdown
pub fn to_markdown(document: &Document, options: &ExportOptions) -> String {
    let mut exporter = MarkdownExporter::new(document, *options);
    for block in document.blocks() {
        exporter.write_block(block);
    }
    exporter.output
}

struct MarkdownExporter<'a> {
    document: &'a Document,
    options: ExportOptions,
    output: String,
    previous: Option<BlockType>,
    /// Ordered-list counters, one per depth of the current list
    counters: Vec<usize>,
}

impl<'a> MarkdownExporter<'a> {
    fn new(document: &'a Document, options: ExportOptions) -> Self {
        Self {
            document,
            options,
            output: String::new(),
            previous: None,
            counters: Vec::new(),
        }
    }

    fn write_block(&mut self, block: &Block) {
        let block_type = block.block_type();
        let in_list = self.previous.is_some_and(BlockType::is_list_item);
        if self.previous.is_some() && !(in_list && block_type.is_list_item()) {
            self.output.push('\n');
        }
        if !in_list {
            self.counters.clear();
        }

        match block_type {
            BlockType::Unstyled => {
                let text = render_inline(self.document, block, "", LineBreak::Hard);
                self.output.push_str(&text);
            }
            BlockType::CodeBlock => self.write_code_block(block),
            BlockType::UnorderedListItem | BlockType::OrderedListItem => self.write_list_item(block),
            header => {
                let level = header.header_level().unwrap_or(1) as usize;
                let text = render_inline(self.document, block, "", LineBreak::Space);
                self.output.push_str(&"#".repeat(level));
                self.output.push(' ');
                self.output.push_str(&text);
            }
        }
        self.output.push('\n');
        self.previous = Some(block_type);
    }

    fn write_list_item(&mut self, block: &Block) {
        let depth = block.depth();
        self.counters.truncate(depth + 1);
        self.counters.resize(depth + 1, 0);

        let marker = if block.block_type() == BlockType::OrderedListItem {
            self.counters[depth] += 1;
            format!("{}. ", self.counters[depth])
        } else {
            self.counters[depth] = 0;
            "- ".to_string()
        };

        let indent = LIST_INDENT.repeat(depth);
        let continuation = format!("{indent}{}", " ".repeat(marker.len()));
        let text = render_inline(self.document, block, &continuation, LineBreak::Hard);
        self.output.push_str(&indent);
        self.output.push_str(&marker);
        self.output.push_str(&text);
    }

    fn write_code_block(&mut self, block: &Block) {
        let code = block.text();
        if self.options.gfm {
            let fence = "`".repeat(longest_backtick_run(code).max(2) + 1);
            self.output.push_str(&fence);
            self.output.push_str(block.language().unwrap_or_default());
            self.output.push('\n');
            self.output.push_str(code);
            self.output.push('\n');
            self.output.push_str(&fence);
        } else {
            let indented: Vec<String> = code.split('\n').map(|line| format!("    {line}")).collect();
            self.output.push_str(&indented.join("\n"));
        }
    }
}

/// How a soft newline inside a block is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineBreak {
    /// Backslash hard break followed by the continuation indent
    Hard,
    /// A single space, for blocks that must stay on one line
    Space,
}

/// Render a block's text with emphasis markers, code spans and links.
///
/// Trailing soft newlines are dropped: a hard break cannot end a block.
fn render_inline(document: &Document, block: &Block, continuation: &str, breaks: LineBreak) -> String {
    let visible = block.text().trim_end_matches('\n').chars().count();
    let runs: Vec<_> = block
        .style()
        .ranges()
        .filter(|(range, _)| range.start < visible)
        .map(|(range, meta)| (range.start..range.end.min(visible), meta))
        .collect();

    let mut writer = InlineWriter::new(continuation, breaks);
    let mut index = 0;
    while index < runs.len() {
        let entity = runs[index].1.entity;
        let group_end = runs[index..]
            .iter()
            .position(|(_, meta)| meta.entity != entity)
            .map_or(runs.len(), |offset| index + offset);
        let group = &runs[index..group_end];

        match entity.and_then(|key| document.entity(key)) {
            Some(Entity::Link { url }) => {
                writer.close_all();
                writer.push_raw("[");
                for (range, meta) in group {
                    writer.write_run(block.text_slice(range.clone()), &meta.style);
                }
                writer.close_all();
                writer.push_raw("](");
                writer.push_raw(&link_destination(url));
                writer.push_raw(")");
            }
            None => {
                for (range, meta) in group {
                    writer.write_run(block.text_slice(range.clone()), &meta.style);
                }
            }
        }
        index = group_end;
    }
    writer.finish()
}

/// Incremental writer for one block's inline content.
///
/// Emphasis markers nest: a style is only closed together with every marker
/// opened after it. Whitespace at run edges is moved outside the markers so
/// emphasis stays left- and right-flanking.
struct InlineWriter<'a> {
    output: String,
    open: Vec<InlineStyle>,
    pending_space: String,
    line_start: bool,
    continuation: &'a str,
    breaks: LineBreak,
}

impl<'a> InlineWriter<'a> {
    fn new(continuation: &'a str, breaks: LineBreak) -> Self {
        Self {
            output: String::new(),
            open: Vec::new(),
            pending_space: String::new(),
            line_start: true,
            continuation,
            breaks,
        }
    }

    fn write_run(&mut self, text: &str, style: &StyleSet) {
        let is_blank = |c: char| c == ' ' || c == '\t';
        let core = text.trim_matches(is_blank);
        if core.is_empty() {
            self.pending_space.push_str(text);
            return;
        }
        let lead = &text[..text.len() - text.trim_start_matches(is_blank).len()];
        let trail = &text[text.trim_end_matches(is_blank).len()..];

        let marks: Vec<InlineStyle> = style
            .iter()
            .copied()
            .filter(|mark| *mark != InlineStyle::Code)
            .collect();
        let keep = self
            .open
            .iter()
            .take_while(|mark| marks.contains(mark))
            .count();
        self.close_to(keep);
        self.flush_space();
        self.push_space(lead);
        for mark in marks {
            if !self.open.contains(&mark) {
                self.output.push_str(marker(mark));
                self.open.push(mark);
                self.line_start = false;
            }
        }

        if style.contains(&InlineStyle::Code) {
            self.write_code_span(core);
        } else {
            self.write_escaped(core);
        }
        self.pending_space = trail.to_string();
    }

    fn write_escaped(&mut self, text: &str) {
        let chars: Vec<char> = text.chars().collect();
        let mut index = 0;
        while index < chars.len() {
            let c = chars[index];
            index += 1;

            if c == '\n' {
                match self.breaks {
                    LineBreak::Hard => {
                        self.output.push_str("\\\n");
                        self.output.push_str(self.continuation);
                        self.line_start = true;
                    }
                    LineBreak::Space => self.output.push(' '),
                }
                continue;
            }

            if self.line_start {
                if c == ' ' || c == '\t' {
                    continue;
                }
                self.line_start = false;
                if matches!(c, '#' | '-' | '+' | '=' | '>') {
                    self.output.push('\\');
                    self.output.push(c);
                    continue;
                }
                if c.is_ascii_digit() {
                    // "1." or "1)" would start an ordered list
                    self.output.push(c);
                    while index < chars.len() && chars[index].is_ascii_digit() {
                        self.output.push(chars[index]);
                        index += 1;
                    }
                    if index < chars.len() && matches!(chars[index], '.' | ')') {
                        self.output.push('\\');
                        self.output.push(chars[index]);
                        index += 1;
                    }
                    continue;
                }
            }

            if matches!(c, '\\' | '`' | '*' | '_' | '[' | ']' | '<' | '&') {
                self.output.push('\\');
            }
            self.output.push(c);
        }
    }

    fn write_code_span(&mut self, code: &str) {
        let code = code.replace('\n', " ");
        let fence = "`".repeat(longest_backtick_run(&code) + 1);
        let pad = if code.starts_with('`') || code.ends_with('`') {
            " "
        } else {
            ""
        };
        self.output.push_str(&fence);
        self.output.push_str(pad);
        self.output.push_str(&code);
        self.output.push_str(pad);
        self.output.push_str(&fence);
        self.line_start = false;
    }

    fn push_raw(&mut self, text: &str) {
        self.output.push_str(text);
        self.line_start = false;
    }

    /// Whitespace is dropped at the start of a line, where it could turn the
    /// line into an indented code block
    fn push_space(&mut self, space: &str) {
        if !self.line_start {
            self.output.push_str(space);
        }
    }

    fn flush_space(&mut self) {
        let space = std::mem::take(&mut self.pending_space);
        self.push_space(&space);
    }

    fn close_to(&mut self, keep: usize) {
        while self.open.len() > keep {
            if let Some(mark) = self.open.pop() {
                self.output.push_str(marker(mark));
            }
        }
    }

    fn close_all(&mut self) {
        self.close_to(0);
        self.flush_space();
    }

    /// Close every marker; trailing whitespace is dropped
    fn finish(mut self) -> String {
        self.close_to(0);
        self.output
    }
}

fn marker(style: InlineStyle) -> &'static str {
    match style {
        InlineStyle::Bold => "**",
        InlineStyle::Italic => "_",
        InlineStyle::Underline => "++",
        InlineStyle::Code => "`",
    }
}

fn longest_backtick_run(text: &str) -> usize {
    text.split(|c: char| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0)
}

fn link_destination(url: &str) -> String {
    if url.is_empty() || url.contains([' ', '(', ')', '<', '>']) {
        format!("<{}>", url.replace('<', "%3C").replace('>', "%3E"))
    } else {
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::import::parse_markdown;
    use crate::models::{BlockKey, CharMeta, EntityKey, StyleRuns};
    use insta::assert_snapshot;
    use std::collections::BTreeMap;

    fn export(markdown: &str) -> String {
        to_markdown(&parse_markdown(markdown), &ExportOptions::default())
    }

    fn block(key: &str, block_type: BlockType, text: &str) -> Block {
        Block::new(BlockKey::new(key), block_type, text)
    }

    #[test]
    fn test_headers_paragraphs_and_lists() {
        let doc = Document::new(vec![
            block("a", BlockType::HeaderOne, "Title"),
            block("b", BlockType::Unstyled, "Some text."),
            block("c", BlockType::UnorderedListItem, "one"),
            block("d", BlockType::UnorderedListItem, "nested").with_depth(1),
            block("e", BlockType::UnorderedListItem, "two"),
            block("f", BlockType::HeaderThree, "Next"),
        ])
        .unwrap();

        assert_snapshot!(to_markdown(&doc, &ExportOptions::default()), @r"
        # Title

        Some text.

        - one
            - nested
        - two

        ### Next
        ");
    }

    #[test]
    fn test_ordered_items_are_numbered_per_depth() {
        let doc = Document::new(vec![
            block("a", BlockType::OrderedListItem, "first"),
            block("b", BlockType::OrderedListItem, "inner one").with_depth(1),
            block("c", BlockType::OrderedListItem, "inner two").with_depth(1),
            block("d", BlockType::OrderedListItem, "second"),
            block("e", BlockType::OrderedListItem, "restarted").with_depth(1),
            block("f", BlockType::Unstyled, "break"),
            block("g", BlockType::OrderedListItem, "fresh list"),
        ])
        .unwrap();

        assert_snapshot!(to_markdown(&doc, &ExportOptions::default()), @r"
        1. first
            1. inner one
            2. inner two
        2. second
            1. restarted

        break

        1. fresh list
        ");
    }

    #[test]
    fn test_code_block_fences() {
        let doc = Document::new(vec![
            block("a", BlockType::CodeBlock, "let x = 1;\nlet y = 2;")
                .with_language(Some("rust".to_string())),
            block("b", BlockType::CodeBlock, "```\nnested fence\n```"),
        ])
        .unwrap();

        assert_snapshot!(to_markdown(&doc, &ExportOptions::default()), @r"
        ```rust
        let x = 1;
        let y = 2;
        ```

        ````
        ```
        nested fence
        ```
        ````
        ");
    }

    #[test]
    fn test_code_block_without_gfm_is_indented() {
        let doc = Document::new(vec![
            block("a", BlockType::Unstyled, "Example:"),
            block("b", BlockType::CodeBlock, "one\ntwo").with_language(Some("sh".to_string())),
        ])
        .unwrap();

        let markdown = to_markdown(&doc, &ExportOptions { gfm: false });

        assert_eq!(markdown, "Example:\n\n    one\n    two\n");
    }

    #[test]
    fn test_soft_newlines() {
        let doc = Document::new(vec![
            block("a", BlockType::Unstyled, "line one\nline two"),
            block("b", BlockType::UnorderedListItem, "item\ncontinued"),
            block("c", BlockType::HeaderTwo, "split\nheading"),
            block("d", BlockType::Unstyled, "trailing\n"),
        ])
        .unwrap();

        assert_snapshot!(to_markdown(&doc, &ExportOptions::default()), @r"
        line one\
        line two

        - item\
          continued

        ## split heading

        trailing
        ");
    }

    #[test]
    fn test_inline_styles() {
        assert_snapshot!(
            export("Plain **bold** and _italic_ with **_both_ mixed** and `code`."),
            @"Plain **bold** and _italic_ with **_both_ mixed** and `code`."
        );
    }

    #[test]
    fn test_style_boundaries_keep_spaces_outside_markers() {
        let bold = CharMeta::styled([InlineStyle::Bold].into());
        let mut style = StyleRuns::new();
        style.push(5, bold);
        style.push(4, CharMeta::default());
        let doc = Document::new(vec![
            Block::empty(BlockKey::new("a"), BlockType::Unstyled).with_content("bold rest", style),
        ])
        .unwrap();

        assert_eq!(to_markdown(&doc, &ExportOptions::default()), "**bold** rest\n");
    }

    #[test]
    fn test_underline_and_code_with_backticks() {
        let underline = CharMeta::styled([InlineStyle::Underline].into());
        let code = CharMeta::styled([InlineStyle::Code].into());
        let mut style = StyleRuns::new();
        style.push(5, underline);
        style.push(1, CharMeta::default());
        style.push(5, code);
        let doc = Document::new(vec![
            Block::empty(BlockKey::new("a"), BlockType::Unstyled)
                .with_content("under a`b`c", style),
        ])
        .unwrap();

        assert_eq!(
            to_markdown(&doc, &ExportOptions::default()),
            "++under++ ``a`b`c``\n"
        );
    }

    #[test]
    fn test_links() {
        let link = CharMeta {
            style: StyleSet::new(),
            entity: Some(EntityKey(0)),
        };
        let mut style = StyleRuns::new();
        style.push(4, CharMeta::default());
        style.push(4, link);
        let entities = BTreeMap::from([(
            EntityKey(0),
            Entity::Link {
                url: "https://example.com/a b".to_string(),
            },
        )]);
        let doc = Document::with_entities(
            vec![Block::empty(BlockKey::new("a"), BlockType::Unstyled).with_content("see docs", style)],
            entities,
        )
        .unwrap();

        assert_eq!(
            to_markdown(&doc, &ExportOptions::default()),
            "see [docs](<https://example.com/a b>)\n"
        );
    }

    #[test]
    fn test_markdown_syntax_in_text_is_escaped() {
        let doc = Document::new(vec![
            block("a", BlockType::Unstyled, "# not a heading"),
            block("b", BlockType::Unstyled, "1. not a list"),
            block("c", BlockType::Unstyled, "a *star* and [brackets] & `ticks`"),
            block("d", BlockType::UnorderedListItem, "- dash"),
        ])
        .unwrap();

        assert_snapshot!(to_markdown(&doc, &ExportOptions::default()), @r"
        \# not a heading

        1\. not a list

        a \*star\* and \[brackets\] \& \`ticks\`

        - \- dash
        ");
    }

    #[test]
    fn test_leading_whitespace_is_dropped() {
        let doc = Document::new(vec![block("a", BlockType::Unstyled, "    indented")]).unwrap();

        assert_eq!(to_markdown(&doc, &ExportOptions::default()), "indented\n");
    }
}
