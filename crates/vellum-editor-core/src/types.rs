//! Core editor types: selection and change tracking.
//!
//! These types are host-agnostic. A browser shell, a native shell, and tests
//! all drive the document through the same selection model.

use std::ops::Range;

use web_time::Instant;

use crate::doc::NodeId;

/// Text selection within a single block's inline content.
///
/// The anchor is where the selection started, the head is where the cursor is
/// now. They may be in any order - use `start()` and `end()` for ordered
/// bounds. Offsets are character offsets into the block's inline text.
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub struct InlineSelection {
    /// Block node whose inline content holds the selection.
    pub block: NodeId,
    /// Where selection started
    pub anchor: usize,
    /// Where cursor is now
    pub head: usize,
}

impl InlineSelection {
    /// Create a new inline selection.
    pub fn new(block: NodeId, anchor: usize, head: usize) -> Self {
        Self {
            block,
            anchor,
            head,
        }
    }

    /// Create a collapsed selection (caret position).
    pub fn caret(block: NodeId, offset: usize) -> Self {
        Self {
            block,
            anchor: offset,
            head: offset,
        }
    }

    /// Get the start (lower bound) of the selection.
    pub fn start(&self) -> usize {
        self.anchor.min(self.head)
    }

    /// Get the end (upper bound) of the selection.
    pub fn end(&self) -> usize {
        self.anchor.max(self.head)
    }

    /// Check if the selection is collapsed (caret only).
    pub fn is_caret(&self) -> bool {
        self.anchor == self.head
    }

    /// Get the selection length in characters.
    pub fn len(&self) -> usize {
        self.end() - self.start()
    }

    /// Check if empty (same as is_caret).
    pub fn is_empty(&self) -> bool {
        self.is_caret()
    }

    /// Convert to a Range<usize> (ordered).
    pub fn to_range(&self) -> Range<usize> {
        self.start()..self.end()
    }

    /// Check if the selection is backwards (head before anchor).
    pub fn is_backwards(&self) -> bool {
        self.head < self.anchor
    }
}

/// Where edits apply.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    /// Caret or range within one block's inline content.
    Inline(InlineSelection),
    /// A single non-text node selected as a unit (image, rule).
    Node(NodeId),
    /// No selection.
    #[default]
    None,
}

impl Selection {
    /// Caret at a character offset within a block.
    pub fn caret(block: NodeId, offset: usize) -> Self {
        Self::Inline(InlineSelection::caret(block, offset))
    }

    /// Range within a block's inline content.
    pub fn inline(block: NodeId, anchor: usize, head: usize) -> Self {
        Self::Inline(InlineSelection::new(block, anchor, head))
    }

    /// Select a whole node as a unit.
    pub fn node(id: NodeId) -> Self {
        Self::Node(id)
    }

    pub fn as_inline(&self) -> Option<InlineSelection> {
        match self {
            Self::Inline(sel) => Some(*sel),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Self::Node(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// What category of change a command applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    /// Inline text content changed.
    Text,
    /// A node's attributes changed in place.
    Attrs,
    /// Marks on inline content changed.
    Marks,
    /// Tree structure changed (node inserted, replaced, wrapped, removed).
    Structure,
}

/// Information about the most recent successful command.
///
/// Embedding layers read this to decide what to re-render and when the user
/// last edited. Failed commands never touch it.
#[derive(Clone, Debug)]
pub struct ChangeInfo {
    /// Node the command targeted (or created).
    pub node: NodeId,
    /// What category of change was applied.
    pub kind: ChangeKind,
    /// When the change occurred. Used for idle detection by embedding layers.
    pub timestamp: Instant,
}

impl ChangeInfo {
    pub fn new(node: NodeId, kind: ChangeKind) -> Self {
        Self {
            node,
            kind,
            timestamp: Instant::now(),
        }
    }
}

impl PartialEq for ChangeInfo {
    fn eq(&self, other: &Self) -> bool {
        // Compare all fields except timestamp (not meaningful for equality)
        self.node == other.node && self.kind == other.kind
    }
}
