/*!
 * # Editing Core
 *
 * ## Architecture Overview
 *
 * ### 1. Immutable Snapshots
 * - A [`Snapshot`] pairs a [`Document`](crate::models::Document) with a
 *   [`Selection`](crate::models::Selection) and the [`ChangeTag`] of the edit that produced it
 * - Nothing here mutates a document in place; every edit returns a fresh snapshot
 *
 * ### 2. Block Mutators
 * - Pure functions in [`mutators`] from one snapshot to the next
 * - Structural edits: soft newline, list exit, split-after, depth change
 * - Host defaults: text insertion, block split, backspace, block type toggle
 *
 * ### 3. Command Resolver
 * - [`CommandResolver`] turns a Return or Tab keystroke into a structural edit
 * - Returns [`Resolution::NoMatch`] so the host can run its default binding
 *
 * ### 4. Session
 * - [`Session`] owns the current snapshot, commits resolver output and
 *   keeps the markdown export in step with the document
 */

pub mod mutators;
pub mod resolver;
pub mod session;
pub mod snapshot;

pub use mutators::DepthChange;
pub use resolver::{
    CommandResolver, DEFAULT_MAX_DEPTH, EditKey, KeyIntent, Modifiers, Resolution, ResolverConfig,
};
pub use session::{Session, SessionAdapter};
pub use snapshot::{ChangeTag, Snapshot};
