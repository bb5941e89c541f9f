pub mod editing;
pub mod io;
pub mod models;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use editing::{
    ChangeTag, CommandResolver, EditKey, KeyIntent, Modifiers, Resolution, ResolverConfig, Session,
    SessionAdapter, Snapshot,
};
pub use io::{ExportOptions, IoError, parse_markdown, read_document, to_markdown, write_document};
pub use models::{Block, BlockKey, BlockType, Document, DocumentError, Selection};
