pub mod export;
pub mod import;

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::models::Document;

pub use export::{ExportOptions, to_markdown};
pub use import::parse_markdown;

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read a markdown file into a document
pub fn read_document(path: &Path) -> Result<Document, IoError> {
    if !path.exists() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    let document = parse_markdown(&content);
    debug!("read {} blocks from {}", document.block_count(), path.display());
    Ok(document)
}

/// Write a document as markdown, creating parent directories as needed
pub fn write_document(
    path: &Path,
    document: &Document,
    options: &ExportOptions,
) -> Result<(), IoError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, to_markdown(document, options))?;
    debug!("wrote {} blocks to {}", document.block_count(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BlockType;
    use crate::tests::{create_test_dir, create_test_file};

    #[test]
    fn test_read_document() {
        // Given a markdown file on disk
        let dir = create_test_dir();
        let path = create_test_file(&dir, "notes.md", "# Notes\n\n- first\n- second\n");

        // When reading it
        let document = read_document(&path).unwrap();

        // Then its blocks are imported
        assert_eq!(document.block_count(), 3);
        assert_eq!(document.first_block().block_type(), BlockType::HeaderOne);
        assert_eq!(document.last_block().text(), "second");
    }

    #[test]
    fn test_read_missing_document() {
        let dir = create_test_dir();
        let path = dir.path().join("missing.md");

        let result = read_document(&path);

        assert!(matches!(result, Err(IoError::NotFound(p)) if p == path));
    }

    #[test]
    fn test_write_document_creates_parent_dirs() {
        // Given a document and a path in a directory that does not exist yet
        let dir = create_test_dir();
        let path = dir.path().join("nested/deeper/out.md");
        let document = parse_markdown("## Heading\n\nbody");

        // When writing it
        write_document(&path, &document, &ExportOptions::default()).unwrap();

        // Then the exported markdown is on disk
        assert_eq!(fs::read_to_string(&path).unwrap(), "## Heading\n\nbody\n");
    }

    #[test]
    fn test_write_then_read_keeps_structure() {
        let dir = create_test_dir();
        let path = dir.path().join("doc.md");
        let document = parse_markdown("1. one\n    1. nested\n\n```js\nlet a;\n```\n");

        write_document(&path, &document, &ExportOptions::default()).unwrap();
        let reread = read_document(&path).unwrap();

        assert_eq!(reread.outline(), document.outline());
    }
}
