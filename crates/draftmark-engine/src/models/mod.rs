pub mod block;
pub mod document;
pub mod selection;
pub mod style;

pub use block::{Block, BlockKey, BlockType};
pub use document::{BlockShape, Document, DocumentError, ShapeRun};
pub use selection::Selection;
pub use style::{CharMeta, Entity, EntityKey, InlineStyle, StyleRun, StyleRuns, StyleSet};
