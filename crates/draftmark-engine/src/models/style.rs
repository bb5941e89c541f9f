use std::collections::BTreeSet;
use std::ops::Range;

use serde::Serialize;

/// Inline style tag applied to a character
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InlineStyle {
    Bold,
    Italic,
    Underline,
    Code,
}

/// Ordered set of inline styles active on a character
pub type StyleSet = BTreeSet<InlineStyle>;

/// Key into a document's entity map
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct EntityKey(pub u32);

/// Document-level record referenced from style runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Entity {
    Link { url: String },
}

/// Metadata carried by every character of a block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CharMeta {
    pub style: StyleSet,
    pub entity: Option<EntityKey>,
}

impl CharMeta {
    pub fn styled(style: StyleSet) -> Self {
        Self {
            style,
            entity: None,
        }
    }
}

/// A run of `len` consecutive characters sharing the same metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StyleRun {
    pub len: usize,
    pub meta: CharMeta,
}

/// Style runs of a block's text.
///
/// Runs always cover the whole text, contain no zero-length entries and never
/// hold two adjacent runs with equal metadata. Every operation returns a new
/// value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StyleRuns {
    runs: Vec<StyleRun>,
}

impl StyleRuns {
    pub fn new() -> Self {
        Self::default()
    }

    /// `len` characters all carrying `meta`
    pub fn uniform(len: usize, meta: CharMeta) -> Self {
        let mut runs = Self::new();
        runs.push(len, meta);
        runs
    }

    /// Append `len` characters carrying `meta`, merging with the last run when equal
    pub fn push(&mut self, len: usize, meta: CharMeta) {
        if len == 0 {
            return;
        }
        match self.runs.last_mut() {
            Some(last) if last.meta == meta => last.len += len,
            _ => self.runs.push(StyleRun { len, meta }),
        }
    }

    /// Number of characters covered
    pub fn len(&self) -> usize {
        self.runs.iter().map(|run| run.len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn runs(&self) -> &[StyleRun] {
        &self.runs
    }

    /// Iterate runs together with the character range each one covers
    pub fn ranges(&self) -> impl Iterator<Item = (Range<usize>, &CharMeta)> {
        let mut start = 0;
        self.runs.iter().map(move |run| {
            let range = start..start + run.len;
            start += run.len;
            (range, &run.meta)
        })
    }

    /// Metadata of the character at `offset`, if there is one
    pub fn meta_at(&self, offset: usize) -> Option<&CharMeta> {
        self.ranges()
            .find(|(range, _)| range.contains(&offset))
            .map(|(_, meta)| meta)
    }

    /// Styles of the character at `offset`; empty past the end of the text
    pub fn style_at(&self, offset: usize) -> StyleSet {
        self.meta_at(offset)
            .map(|meta| meta.style.clone())
            .unwrap_or_default()
    }

    pub fn entity_at(&self, offset: usize) -> Option<EntityKey> {
        self.meta_at(offset).and_then(|meta| meta.entity)
    }

    /// Runs restricted to the character range `range`
    pub fn slice(&self, range: Range<usize>) -> Self {
        let mut sliced = Self::new();
        for (run_range, meta) in self.ranges() {
            let start = run_range.start.max(range.start);
            let end = run_range.end.min(range.end);
            if start < end {
                sliced.push(end - start, meta.clone());
            }
        }
        sliced
    }

    /// `self` followed by `other`
    pub fn concat(&self, other: &Self) -> Self {
        let mut joined = self.clone();
        for run in &other.runs {
            joined.push(run.len, run.meta.clone());
        }
        joined
    }

    /// Replace the characters in `range` with `inserted`
    pub fn splice(&self, range: Range<usize>, inserted: &Self) -> Self {
        let total = self.len();
        self.slice(0..range.start)
            .concat(inserted)
            .concat(&self.slice(range.end..total))
    }
}
