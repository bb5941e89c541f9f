use log::{Level, debug, log_enabled, trace};

use crate::editing::resolver::{CommandResolver, KeyIntent, Resolution};
use crate::editing::snapshot::Snapshot;
use crate::io::export::{ExportOptions, to_markdown};
use crate::io::import::parse_markdown;

/// Owner of the "current snapshot" reference a host edits through
pub trait SessionAdapter {
    fn current(&self) -> &Snapshot;
    fn commit(&mut self, snapshot: Snapshot);
}

/// Default session: keeps the current snapshot and its markdown export.
///
/// `version` counts commits that changed the document; selection-only commits
/// keep the version and the cached markdown.
#[derive(Debug, Clone)]
pub struct Session {
    current: Snapshot,
    version: u64,
    export: ExportOptions,
    markdown: String,
}

impl Session {
    pub fn new(snapshot: Snapshot, export: ExportOptions) -> Self {
        let markdown = to_markdown(snapshot.document(), &export);
        Self {
            current: snapshot,
            version: 0,
            export,
            markdown,
        }
    }

    /// Import `source` and place the cursor at the start of the document
    pub fn from_markdown(source: &str, export: ExportOptions) -> Self {
        Self::new(Snapshot::from_document(parse_markdown(source)), export)
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Markdown export of the current document
    pub fn markdown(&self) -> &str {
        &self.markdown
    }

    pub fn export_options(&self) -> &ExportOptions {
        &self.export
    }

    /// Resolve a keystroke against the current snapshot and commit the result.
    ///
    /// Returns false on no match, leaving the host to run its default binding.
    pub fn dispatch(&mut self, resolver: &CommandResolver, intent: KeyIntent) -> bool {
        match resolver.resolve(intent, &self.current) {
            Resolution::Changed(snapshot) => {
                self.commit(snapshot);
                true
            }
            Resolution::NoMatch => false,
        }
    }

    /// Commit the output of a host default mutator
    pub fn apply(&mut self, edit: impl FnOnce(&Snapshot) -> Snapshot) {
        let next = edit(&self.current);
        self.commit(next);
    }
}

impl SessionAdapter for Session {
    fn current(&self) -> &Snapshot {
        &self.current
    }

    fn commit(&mut self, snapshot: Snapshot) {
        if snapshot.document() != self.current.document() {
            self.version += 1;
            self.markdown = to_markdown(snapshot.document(), &self.export);
            debug!(
                "commit v{} ({:?}):\n{}",
                self.version,
                snapshot.change(),
                self.markdown
            );
            if log_enabled!(Level::Trace) {
                match snapshot.to_json() {
                    Ok(dump) => trace!("commit v{} content: {dump}", self.version),
                    Err(e) => trace!("commit v{}: content dump failed: {e}", self.version),
                }
            }
        }
        self.current = snapshot;
    }
}
