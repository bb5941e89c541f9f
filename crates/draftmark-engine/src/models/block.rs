use std::fmt;
use std::ops::Range;

use serde::Serialize;
use uuid::Uuid;

use crate::models::style::{CharMeta, StyleRuns};

/// Opaque block identifier, unique within a document
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct BlockKey(String);

impl BlockKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// A fresh random key (8 hex digits of a v4 uuid)
    pub fn generate() -> Self {
        let mut key = Uuid::new_v4().simple().to_string();
        key.truncate(8);
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// Structural type of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockType {
    Unstyled,
    HeaderOne,
    HeaderTwo,
    HeaderThree,
    HeaderFour,
    HeaderFive,
    HeaderSix,
    UnorderedListItem,
    OrderedListItem,
    CodeBlock,
}

impl BlockType {
    pub fn is_list_item(self) -> bool {
        matches!(self, Self::UnorderedListItem | Self::OrderedListItem)
    }

    /// Headers and code blocks: anything that is neither a list item nor unstyled
    pub fn is_special(self) -> bool {
        !self.is_list_item() && self != Self::Unstyled
    }

    pub fn header_level(self) -> Option<u8> {
        match self {
            Self::HeaderOne => Some(1),
            Self::HeaderTwo => Some(2),
            Self::HeaderThree => Some(3),
            Self::HeaderFour => Some(4),
            Self::HeaderFive => Some(5),
            Self::HeaderSix => Some(6),
            _ => None,
        }
    }

    pub fn header(level: u8) -> Option<Self> {
        match level {
            1 => Some(Self::HeaderOne),
            2 => Some(Self::HeaderTwo),
            3 => Some(Self::HeaderThree),
            4 => Some(Self::HeaderFour),
            5 => Some(Self::HeaderFive),
            6 => Some(Self::HeaderSix),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unstyled => "unstyled",
            Self::HeaderOne => "header-one",
            Self::HeaderTwo => "header-two",
            Self::HeaderThree => "header-three",
            Self::HeaderFour => "header-four",
            Self::HeaderFive => "header-five",
            Self::HeaderSix => "header-six",
            Self::UnorderedListItem => "unordered-list-item",
            Self::OrderedListItem => "ordered-list-item",
            Self::CodeBlock => "code-block",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One paragraph-like unit of a document.
///
/// Fields are read through accessors so that `text` and `style` can never
/// disagree on length. Updates go through the `with_*` builders, which consume
/// the block and return the changed copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block {
    key: BlockKey,
    #[serde(rename = "type")]
    block_type: BlockType,
    text: String,
    style: StyleRuns,
    depth: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<String>,
}

impl Block {
    /// Block with unstyled text, depth 0 and no language
    pub fn new(key: BlockKey, block_type: BlockType, text: impl Into<String>) -> Self {
        let text = text.into();
        let style = StyleRuns::uniform(text.chars().count(), CharMeta::default());
        Self {
            key,
            block_type,
            text,
            style,
            depth: 0,
            language: None,
        }
    }

    pub fn empty(key: BlockKey, block_type: BlockType) -> Self {
        Self::new(key, block_type, String::new())
    }

    pub fn with_type(mut self, block_type: BlockType) -> Self {
        self.block_type = block_type;
        self
    }

    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }

    pub fn with_key(mut self, key: BlockKey) -> Self {
        self.key = key;
        self
    }

    /// Replace text and style together.
    ///
    /// Panics if `style` does not cover exactly the characters of `text`.
    pub fn with_content(mut self, text: impl Into<String>, style: StyleRuns) -> Self {
        let text = text.into();
        assert_eq!(
            text.chars().count(),
            style.len(),
            "style runs must cover block text exactly"
        );
        self.text = text;
        self.style = style;
        self
    }

    pub fn key(&self) -> &BlockKey {
        &self.key
    }

    pub fn block_type(&self) -> BlockType {
        self.block_type
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn style(&self) -> &StyleRuns {
        &self.style
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// Length of the text in characters
    pub fn len(&self) -> usize {
        self.style.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn is_list_item(&self) -> bool {
        self.block_type.is_list_item()
    }

    /// Text of the character range `range`
    pub fn text_slice(&self, range: Range<usize>) -> &str {
        let start = byte_offset(&self.text, range.start);
        let end = byte_offset(&self.text, range.end);
        &self.text[start..end]
    }

    /// Replace the characters in `range` with `text` carrying `style`
    pub fn splice(&self, range: Range<usize>, text: &str, style: &StyleRuns) -> Self {
        let start = byte_offset(&self.text, range.start);
        let end = byte_offset(&self.text, range.end);
        let mut spliced = String::with_capacity(self.text.len() - (end - start) + text.len());
        spliced.push_str(&self.text[..start]);
        spliced.push_str(text);
        spliced.push_str(&self.text[end..]);

        let style = self.style.splice(range, style);
        self.clone().with_content(spliced, style)
    }
}

/// Byte index of the character at `char_offset`, or the text length past the end
pub(crate) fn byte_offset(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(byte, _)| byte)
        .unwrap_or(text.len())
}
