//! Snapshot-based undo and redo.
//!
//! Provides:
//! - `UndoManager` trait so hosts can swap in their own history backend
//! - `UndoableDocument` - wraps a Document and snapshots it per edit

use crate::commands::Command;
use crate::doc::Document;
use crate::execute::execute_command;
use crate::input_rules;
use crate::options::EditorOptions;
use crate::patterns::PatternRegistry;

/// History backend for an editable document.
///
/// Implementations perform the undo/redo themselves, not just report state.
/// For local editing, use `UndoableDocument`. A collaborative backend would
/// wrap its own history machinery behind the same trait.
pub trait UndoManager {
    /// Whether an undo step is available.
    fn can_undo(&self) -> bool;

    /// Whether a redo step is available.
    fn can_redo(&self) -> bool;

    /// Step back once. Returns false when there is nothing to undo.
    fn undo(&mut self) -> bool;

    /// Step forward once. Returns false when there is nothing to redo.
    fn redo(&mut self) -> bool;

    /// Drop both stacks.
    fn clear_history(&mut self);
}

/// A Document wrapper that snapshots state before each edit and provides
/// undo/redo.
///
/// Every mutation goes through [`execute`](UndoableDocument::execute) or
/// [`insert_text`](UndoableDocument::insert_text); a rejected edit leaves the
/// history untouched. One call is one undo step, so a typed character and the
/// input-rule conversion it triggers undo together.
#[derive(Clone, Debug)]
pub struct UndoableDocument {
    doc: Document,
    undo_stack: Vec<Document>,
    redo_stack: Vec<Document>,
    max_steps: usize,
}

impl Default for UndoableDocument {
    fn default() -> Self {
        Self::new(Document::new(), 100)
    }
}

impl UndoableDocument {
    /// Create a new undoable wrapper around the given document.
    pub fn new(doc: Document, max_steps: usize) -> Self {
        Self {
            doc,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_steps,
        }
    }

    /// Create a wrapper around a fresh document, sized from the options.
    pub fn with_options(options: &EditorOptions) -> Self {
        Self::new(Document::new(), options.history_limit)
    }

    /// Get a reference to the inner document.
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Get a mutable reference to the inner document.
    /// WARNING: Edits made directly bypass undo tracking!
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// Run a command, recording an undo step when it succeeds.
    pub fn execute(&mut self, command: &Command, options: &EditorOptions) -> bool {
        let before = self.doc.clone();
        if !execute_command(&mut self.doc, command, options) {
            return false;
        }
        self.record_snapshot(before);
        true
    }

    /// Insert typed text, recording an undo step when it succeeds.
    pub fn insert_text(
        &mut self,
        text: &str,
        registry: &PatternRegistry,
        options: &EditorOptions,
    ) -> bool {
        let before = self.doc.clone();
        if !input_rules::insert_text(&mut self.doc, text, registry, options) {
            return false;
        }
        self.record_snapshot(before);
        true
    }

    /// Record the pre-edit state (called after a successful edit).
    fn record_snapshot(&mut self, before: Document) {
        // A new edit invalidates anything that was undone
        self.redo_stack.clear();

        self.undo_stack.push(before);

        // Oldest snapshots fall off first
        while self.undo_stack.len() > self.max_steps {
            self.undo_stack.remove(0);
        }
    }
}

impl UndoManager for UndoableDocument {
    fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    fn undo(&mut self) -> bool {
        let Some(prev) = self.undo_stack.pop() else {
            return false;
        };

        let current = std::mem::replace(&mut self.doc, prev);
        self.redo_stack.push(current);
        true
    }

    fn redo(&mut self) -> bool {
        let Some(next) = self.redo_stack.pop() else {
            return false;
        };

        let current = std::mem::replace(&mut self.doc, next);
        self.undo_stack.push(current);
        true
    }

    fn clear_history(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;
    use crate::types::Selection;

    fn rig() -> (UndoableDocument, PatternRegistry, EditorOptions) {
        let options = EditorOptions::default();
        let registry = PatternRegistry::new(&options);
        (UndoableDocument::with_options(&options), registry, options)
    }

    fn first_block(undoable: &UndoableDocument) -> crate::doc::NodeId {
        let doc = undoable.document();
        doc.children(doc.root())[0]
    }

    #[test]
    fn test_execute_undo_redo_cycle() {
        let (mut undoable, _registry, options) = rig();
        let block = first_block(&undoable);

        assert!(!undoable.can_undo());
        assert!(undoable.execute(&Command::SetHeading { level: 2 }, &options));
        assert_eq!(undoable.document().kind(block), Some(NodeKind::Heading));
        assert!(undoable.can_undo());

        assert!(undoable.undo());
        assert_eq!(undoable.document().kind(block), Some(NodeKind::Paragraph));
        assert!(!undoable.can_undo());
        assert!(undoable.can_redo());

        assert!(undoable.redo());
        assert_eq!(undoable.document().kind(block), Some(NodeKind::Heading));
        assert!(undoable.can_undo());
        assert!(!undoable.can_redo());
    }

    #[test]
    fn test_rejected_command_records_nothing() {
        let (mut undoable, _registry, options) = rig();

        assert!(!undoable.execute(&Command::SetHeading { level: 0 }, &options));
        assert!(!undoable.can_undo());
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let (mut undoable, registry, options) = rig();

        assert!(undoable.insert_text("a", &registry, &options));
        assert!(undoable.undo());
        assert!(undoable.can_redo());

        // Typing after an undo discards the redo branch
        assert!(undoable.insert_text("b", &registry, &options));
        assert!(!undoable.can_redo());
    }

    #[test]
    fn test_max_steps() {
        let options = EditorOptions::default();
        let registry = PatternRegistry::new(&options);
        let mut undoable = UndoableDocument::new(Document::new(), 3);
        let block = first_block(&undoable);

        for ch in ["a", "b", "c", "d"] {
            assert!(undoable.insert_text(ch, &registry, &options));
        }
        assert_eq!(undoable.document().inline_text(block), "abcd");

        // Should only be able to undo 3 times; "a" was evicted
        assert!(undoable.undo());
        assert!(undoable.undo());
        assert!(undoable.undo());
        assert!(!undoable.undo());
        assert_eq!(undoable.document().inline_text(block), "a");
    }

    #[test]
    fn test_undo_restores_selection() {
        let (mut undoable, registry, options) = rig();
        let block = first_block(&undoable);

        assert!(undoable.insert_text("hi", &registry, &options));
        assert_eq!(undoable.document().selection, Selection::caret(block, 2));

        assert!(undoable.undo());
        assert_eq!(undoable.document().selection, Selection::caret(block, 0));
    }

    #[test]
    fn test_input_rule_conversion_is_one_step() {
        let (mut undoable, registry, options) = rig();
        let block = first_block(&undoable);

        for ch in ["#", " "] {
            assert!(undoable.insert_text(ch, &registry, &options));
        }
        assert_eq!(undoable.document().kind(block), Some(NodeKind::Heading));

        // One undo rolls back both the space and the conversion.
        assert!(undoable.undo());
        assert_eq!(undoable.document().kind(block), Some(NodeKind::Paragraph));
        assert_eq!(undoable.document().inline_text(block), "#");

        assert!(undoable.undo());
        assert_eq!(undoable.document().inline_text(block), "");
    }

    #[test]
    fn test_clear_history() {
        let (mut undoable, registry, options) = rig();

        assert!(undoable.insert_text("a", &registry, &options));
        assert!(undoable.undo());
        assert!(undoable.can_redo());

        undoable.clear_history();
        assert!(!undoable.can_undo());
        assert!(!undoable.can_redo());
    }
}
