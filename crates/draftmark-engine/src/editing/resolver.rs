//! Keystroke resolution.
//!
//! Return runs an ordered chain of guarded rules and applies the first one
//! whose guard holds. Tab adjusts list depth. When nothing applies the caller
//! gets [`Resolution::NoMatch`] and the host's default binding should run.

use log::{debug, trace};

use crate::editing::mutators::{self, DepthChange};
use crate::editing::snapshot::Snapshot;

/// Indent bound used when none is configured
pub const DEFAULT_MAX_DEPTH: usize = 1;

/// Modifier keys held during a keystroke
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub alt: bool,
    pub ctrl: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        alt: false,
        ctrl: false,
    };

    pub const SHIFT: Self = Self {
        shift: true,
        alt: false,
        ctrl: false,
    };

    /// Return with any of shift, alt or ctrl inserts a soft newline
    pub fn requests_soft_newline(self) -> bool {
        self.shift || self.alt || self.ctrl
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKey {
    Return,
    Tab,
}

/// A keystroke the host forwards to the resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyIntent {
    pub key: EditKey,
    pub modifiers: Modifiers,
}

impl KeyIntent {
    pub fn new(key: EditKey, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }
}

/// Outcome of resolving a keystroke
#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// No rule applied; the host's default handling should run
    NoMatch,
    Changed(Snapshot),
}

impl Resolution {
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Changed(_))
    }

    pub fn into_snapshot(self) -> Option<Snapshot> {
        match self {
            Self::NoMatch => None,
            Self::Changed(snapshot) => Some(snapshot),
        }
    }
}

impl From<Option<Snapshot>> for Resolution {
    fn from(snapshot: Option<Snapshot>) -> Self {
        snapshot.map_or(Self::NoMatch, Self::Changed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Deepest list level Tab may indent to
    pub max_depth: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// A guarded Return transform
struct ReturnRule {
    name: &'static str,
    applies: fn(Modifiers, &Snapshot) -> bool,
    apply: fn(&Snapshot) -> Snapshot,
}

/// Evaluated in order; the first rule whose guard holds wins
const RETURN_RULES: [ReturnRule; 3] = [
    ReturnRule {
        name: "soft-newline",
        applies: is_soft_newline_request,
        apply: mutators::insert_soft_newline,
    },
    ReturnRule {
        name: "empty-list-exit",
        applies: is_in_empty_list_item,
        apply: mutators::exit_list_item,
    },
    ReturnRule {
        name: "special-block-split",
        applies: is_at_end_of_special_block,
        apply: mutators::split_after,
    },
];

fn is_soft_newline_request(modifiers: Modifiers, _: &Snapshot) -> bool {
    modifiers.requests_soft_newline()
}

fn is_in_empty_list_item(_: Modifiers, snapshot: &Snapshot) -> bool {
    if !snapshot.selection().is_collapsed() {
        return false;
    }
    let block = snapshot.start_block();
    block.is_list_item() && block.is_empty()
}

fn is_at_end_of_special_block(_: Modifiers, snapshot: &Snapshot) -> bool {
    let selection = snapshot.selection();
    if !selection.is_collapsed() {
        return false;
    }
    let block = snapshot.start_block();
    block.block_type().is_special() && selection.start_offset() == block.len()
}

/// Chooses the structural edit for Return and Tab
#[derive(Debug, Clone, Default)]
pub struct CommandResolver {
    config: ResolverConfig,
}

impl CommandResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn resolve(&self, intent: KeyIntent, snapshot: &Snapshot) -> Resolution {
        match intent.key {
            EditKey::Return => self.resolve_return(intent.modifiers, snapshot),
            EditKey::Tab => self.resolve_tab(intent.modifiers, snapshot),
        }
    }

    pub fn resolve_return(&self, modifiers: Modifiers, snapshot: &Snapshot) -> Resolution {
        for rule in &RETURN_RULES {
            if (rule.applies)(modifiers, snapshot) {
                debug!("return: applying {} rule", rule.name);
                return Resolution::Changed((rule.apply)(snapshot));
            }
            trace!("return: {} rule does not apply", rule.name);
        }
        Resolution::NoMatch
    }

    /// Shift+Tab outdents, Tab indents up to the configured bound.
    ///
    /// Only list items react, and only when the selection stays within one block.
    pub fn resolve_tab(&self, modifiers: Modifiers, snapshot: &Snapshot) -> Resolution {
        let selection = snapshot.selection();
        if selection.anchor_key != selection.focus_key {
            trace!("tab: selection spans blocks");
            return Resolution::NoMatch;
        }
        if !snapshot.start_block().is_list_item() {
            trace!("tab: {} block is not a list item", snapshot.start_block().block_type());
            return Resolution::NoMatch;
        }

        let change = if modifiers.shift {
            DepthChange::Outdent
        } else {
            DepthChange::Indent
        };
        let resolution: Resolution =
            mutators::adjust_depth(snapshot, change, self.config.max_depth).into();
        debug!("tab: {change:?} matched={}", resolution.is_match());
        resolution
    }
}
