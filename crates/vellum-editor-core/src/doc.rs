//! The document tree: a slot arena of nodes with parent links.
//!
//! Nodes live in a `Vec<Option<Node>>` and refer to each other by [`NodeId`].
//! Every node except the root records its parent, so ancestor walks (finding
//! the enclosing code block, checking list nesting) are O(depth) pointer
//! chases instead of tree searches. Freed slots go on a free list and are
//! reused by later allocations.
//!
//! All structural edits go through [`Document`] methods, which keep child
//! vectors and parent links consistent with each other.

use std::fmt;
use std::ops::Range;

use crate::marks::{Mark, MarkType};
use crate::node::{NodeBody, NodeKind, TextRun};
use crate::types::{ChangeInfo, ChangeKind, Selection};

/// Index of a node in the document arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// One arena slot: a body plus the owning parent.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) body: NodeBody,
}

impl Node {
    pub fn body(&self) -> &NodeBody {
        &self.body
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// An editable document: node arena, root id, and current selection.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    slots: Vec<Option<Node>>,
    free: Vec<u32>,
    root: NodeId,
    pub selection: Selection,
    pub last_change: Option<ChangeInfo>,
}

impl Document {
    /// A document holding one empty paragraph, with the caret inside it.
    pub fn new() -> Self {
        let mut doc = Self::bare();
        let para = doc
            .insert_child(doc.root, 0, NodeBody::Paragraph { content: Vec::new() })
            .expect("root accepts children");
        doc.selection = Selection::caret(para, 0);
        doc
    }

    /// A document with only the root node and no selection.
    pub(crate) fn bare() -> Self {
        let root = NodeId(0);
        Self {
            slots: vec![Some(Node {
                parent: None,
                body: NodeBody::Doc { children: Vec::new() },
            })],
            free: Vec::new(),
            root,
            selection: Selection::None,
            last_change: None,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.node(id).map(|n| n.body.kind())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    /// Child ids of a container node. Empty for leaves and unknown ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id)
            .and_then(|n| n.body.children())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Position of `id` within its parent's child list.
    pub fn child_index(&self, id: NodeId) -> Option<usize> {
        let parent = self.node(id)?.parent?;
        self.children(parent).iter().position(|c| *c == id)
    }

    /// Nearest ancestor of `start` (including `start` itself) of the given
    /// kind.
    pub fn find_ancestor(&self, start: NodeId, kind: NodeKind) -> Option<NodeId> {
        let mut current = Some(start);
        while let Some(id) = current {
            let node = self.node(id)?;
            if node.body.kind() == kind {
                return Some(id);
            }
            current = node.parent;
        }
        None
    }

    /// The block the selection sits in, for either selection shape.
    pub fn selected_block(&self) -> Option<NodeId> {
        match &self.selection {
            Selection::Inline(sel) => Some(sel.block),
            Selection::Node(id) => Some(*id),
            Selection::None => None,
        }
    }

    pub(crate) fn record_change(&mut self, node: NodeId, kind: ChangeKind) {
        self.last_change = Some(ChangeInfo::new(node, kind));
    }

    // === Structure ===

    fn alloc(&mut self, parent: Option<NodeId>, body: NodeBody) -> NodeId {
        let node = Node { parent, body };
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot as usize] = Some(node);
                NodeId(slot)
            }
            None => {
                let id = NodeId(self.slots.len() as u32);
                self.slots.push(Some(node));
                id
            }
        }
    }

    /// Free a node and its whole subtree.
    fn release(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let taken = self.slots.get_mut(next.index()).and_then(Option::take);
            if let Some(node) = taken {
                if let Some(children) = node.body.children() {
                    stack.extend(children.iter().copied());
                }
                self.free.push(next.0);
            }
        }
    }

    /// Create a node from `body` and insert it as the `index`-th child of
    /// `parent`. Child ids already listed in `body` are re-parented to the
    /// new node. Fails if `parent` is not a container or `index` is out of
    /// bounds.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, body: NodeBody) -> Option<NodeId> {
        let count = self.node(parent)?.body.children()?.len();
        if index > count {
            return None;
        }
        let adopted: Vec<NodeId> = body.children().cloned().unwrap_or_default();
        if adopted.iter().any(|c| !self.contains(*c)) {
            return None;
        }
        let id = self.alloc(Some(parent), body);
        for child in adopted {
            if let Some(node) = self.node_mut(child) {
                node.parent = Some(id);
            }
        }
        if let Some(children) = self.node_mut(parent).and_then(|n| n.body.children_mut()) {
            children.insert(index, id);
        }
        Some(id)
    }

    /// Remove a node and its subtree from the tree. The root cannot be
    /// removed.
    pub fn remove_node(&mut self, id: NodeId) -> bool {
        if id == self.root {
            return false;
        }
        if self.detach(id).is_none() {
            return false;
        }
        self.release(id);
        true
    }

    /// Swap in a new body for `id`. Old children not re-listed by the new
    /// body are freed; children the new body lists are re-parented.
    pub fn replace_body(&mut self, id: NodeId, body: NodeBody) -> bool {
        if id == self.root || !self.contains(id) {
            return false;
        }
        let adopted: Vec<NodeId> = body.children().cloned().unwrap_or_default();
        if adopted.iter().any(|c| !self.contains(*c)) {
            return false;
        }
        let old = match self.node_mut(id) {
            Some(node) => std::mem::replace(&mut node.body, body),
            None => return false,
        };
        if let Some(old_children) = old.children() {
            for child in old_children {
                if !adopted.contains(child) {
                    self.release(*child);
                }
            }
        }
        for child in adopted {
            if let Some(node) = self.node_mut(child) {
                node.parent = Some(id);
            }
        }
        true
    }

    /// Unhook a node from its parent without freeing it. Returns the child
    /// index it held.
    pub(crate) fn detach(&mut self, id: NodeId) -> Option<usize> {
        let parent = self.node(id)?.parent?;
        let children = self.node_mut(parent)?.body.children_mut()?;
        let index = children.iter().position(|c| *c == id)?;
        children.remove(index);
        if let Some(node) = self.node_mut(id) {
            node.parent = None;
        }
        Some(index)
    }

    /// Hook a detached node under `parent` at `index`.
    pub(crate) fn attach(&mut self, parent: NodeId, index: usize, id: NodeId) -> bool {
        match self.node(id) {
            Some(node) if node.parent.is_none() => {}
            _ => return false,
        }
        let Some(children) = self.node_mut(parent).and_then(|n| n.body.children_mut()) else {
            return false;
        };
        if index > children.len() {
            return false;
        }
        children.insert(index, id);
        if let Some(node) = self.node_mut(id) {
            node.parent = Some(parent);
        }
        true
    }

    // === Inline text ===

    /// Concatenated text of a textual block, or the code of a code block.
    pub fn inline_text(&self, block: NodeId) -> String {
        match self.node(block).map(|n| &n.body) {
            Some(NodeBody::CodeBlock { code, .. }) => code.clone(),
            Some(body) => body
                .inline()
                .map(|runs| runs.iter().map(|r| r.text.as_str()).collect())
                .unwrap_or_default(),
            None => String::new(),
        }
    }

    /// Length of a block's text in characters.
    pub fn inline_len(&self, block: NodeId) -> usize {
        match self.node(block).map(|n| &n.body) {
            Some(NodeBody::CodeBlock { code, .. }) => code.chars().count(),
            Some(body) => body
                .inline()
                .map(|runs| runs.iter().map(TextRun::len_chars).sum())
                .unwrap_or(0),
            None => 0,
        }
    }

    /// The runs of a textual block. Empty for anything else.
    pub fn runs(&self, block: NodeId) -> &[TextRun] {
        self.node(block)
            .and_then(|n| n.body.inline())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The source text of a code block.
    pub fn code_text(&self, id: NodeId) -> Option<&str> {
        match self.node(id).map(|n| &n.body) {
            Some(NodeBody::CodeBlock { code, .. }) => Some(code.as_str()),
            _ => None,
        }
    }

    /// Insert text at a character offset. At a run boundary the text joins
    /// the earlier run, so typing at the end of a link extends the link.
    pub fn insert_text(&mut self, block: NodeId, offset: usize, text: &str) -> bool {
        if text.is_empty() {
            return self.contains(block) && offset <= self.inline_len(block);
        }
        let Some(node) = self.node_mut(block) else {
            return false;
        };
        if let NodeBody::CodeBlock { code, .. } = &mut node.body {
            if offset > code.chars().count() {
                return false;
            }
            let byte = char_to_byte(code, offset);
            code.insert_str(byte, text);
            return true;
        }
        let Some(runs) = node.body.inline_mut() else {
            return false;
        };
        if runs.is_empty() {
            if offset != 0 {
                return false;
            }
            runs.push(TextRun::plain(text));
            return true;
        }
        let mut remaining = offset;
        for run in runs.iter_mut() {
            let len = run.len_chars();
            if remaining <= len {
                let byte = char_to_byte(&run.text, remaining);
                run.text.insert_str(byte, text);
                return true;
            }
            remaining -= len;
        }
        false
    }

    /// Delete a character range. Runs emptied by the deletion are dropped
    /// and equal-marked neighbors merge back together.
    pub fn delete_text(&mut self, block: NodeId, range: Range<usize>) -> bool {
        if range.start > range.end || range.end > self.inline_len(block) {
            return false;
        }
        if !self.contains(block) {
            return false;
        }
        if range.is_empty() {
            return true;
        }
        if let Some(NodeBody::CodeBlock { code, .. }) = self.node_mut(block).map(|n| &mut n.body) {
            let a = char_to_byte(code, range.start);
            let b = char_to_byte(code, range.end);
            code.replace_range(a..b, "");
            return true;
        }
        let Some(runs) = self.node_mut(block).and_then(|n| n.body.inline_mut()) else {
            return false;
        };
        let mut pos = 0usize;
        for run in runs.iter_mut() {
            let run_start = pos;
            let run_end = pos + run.len_chars();
            pos = run_end;
            let cut_start = range.start.max(run_start);
            let cut_end = range.end.min(run_end);
            if cut_start >= cut_end {
                continue;
            }
            let a = char_to_byte(&run.text, cut_start - run_start);
            let b = char_to_byte(&run.text, cut_end - run_start);
            run.text.replace_range(a..b, "");
        }
        self.coalesce_runs(block);
        true
    }

    /// Split runs so that `range` starts and ends exactly on run boundaries,
    /// and return the index range of the runs it covers.
    pub(crate) fn isolate_range(&mut self, block: NodeId, range: Range<usize>) -> Option<Range<usize>> {
        if range.start > range.end || range.end > self.inline_len(block) {
            return None;
        }
        let runs = self.node_mut(block)?.body.inline_mut()?;
        split_run_at(runs, range.start);
        split_run_at(runs, range.end);
        let mut pos = 0usize;
        let mut start_idx = None;
        let mut end_idx = runs.len();
        for (i, run) in runs.iter().enumerate() {
            if pos == range.start && start_idx.is_none() {
                start_idx = Some(i);
            }
            if pos >= range.end {
                end_idx = i;
                break;
            }
            pos += run.len_chars();
        }
        let start_idx = start_idx.unwrap_or(runs.len());
        Some(start_idx..end_idx.max(start_idx))
    }

    /// Apply a mark to every character in `range`. Empty ranges fail.
    pub fn add_mark(&mut self, block: NodeId, range: Range<usize>, mark: Mark) -> bool {
        if range.start >= range.end {
            return false;
        }
        let Some(idx) = self.isolate_range(block, range) else {
            return false;
        };
        let Some(runs) = self.node_mut(block).and_then(|n| n.body.inline_mut()) else {
            return false;
        };
        for run in &mut runs[idx] {
            run.marks.add(mark.clone());
        }
        self.coalesce_runs(block);
        true
    }

    /// Strip a mark type from every character in `range`. The text stays.
    pub fn remove_mark(&mut self, block: NodeId, range: Range<usize>, mark_type: MarkType) -> bool {
        if range.start >= range.end {
            return false;
        }
        let Some(idx) = self.isolate_range(block, range) else {
            return false;
        };
        let Some(runs) = self.node_mut(block).and_then(|n| n.body.inline_mut()) else {
            return false;
        };
        for run in &mut runs[idx] {
            run.marks.remove(mark_type);
        }
        self.coalesce_runs(block);
        true
    }

    /// Remove the link mark from every run that intersects `range`, without
    /// splitting. A link is one logical unit, so unlinking any part of it
    /// unlinks each touched run whole.
    pub fn unlink_runs(&mut self, block: NodeId, range: Range<usize>) -> bool {
        let Some(runs) = self.node_mut(block).and_then(|n| n.body.inline_mut()) else {
            return false;
        };
        let mut pos = 0usize;
        let mut changed = false;
        for run in runs.iter_mut() {
            let run_start = pos;
            let run_end = pos + run.len_chars();
            pos = run_end;
            if run_start < range.end && run_end > range.start && run.marks.contains(MarkType::Link)
            {
                run.marks.remove(MarkType::Link);
                changed = true;
            }
        }
        if changed {
            self.coalesce_runs(block);
        }
        changed
    }

    /// Drop empty runs and merge adjacent runs with equal mark sets.
    pub(crate) fn coalesce_runs(&mut self, block: NodeId) {
        if let Some(runs) = self.node_mut(block).and_then(|n| n.body.inline_mut()) {
            coalesce(runs);
        }
    }
}

/// Drop empty runs and merge adjacent runs with equal mark sets.
pub(crate) fn coalesce(runs: &mut Vec<TextRun>) {
    runs.retain(|r| !r.text.is_empty());
    let mut i = 1;
    while i < runs.len() {
        if runs[i].marks == runs[i - 1].marks {
            let merged = runs.remove(i);
            runs[i - 1].text.push_str(&merged.text);
        } else {
            i += 1;
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn char_to_byte(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// Split the run containing `offset` in two at that point. Boundary offsets
/// are left alone.
fn split_run_at(runs: &mut Vec<TextRun>, offset: usize) {
    let mut pos = 0usize;
    for i in 0..runs.len() {
        let len = runs[i].len_chars();
        if offset > pos && offset < pos + len {
            let byte = char_to_byte(&runs[i].text, offset - pos);
            let tail = runs[i].text.split_off(byte);
            let marks = runs[i].marks.clone();
            runs.insert(i + 1, TextRun { text: tail, marks });
            return;
        }
        pos += len;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marks::{LinkAttrs, LinkTarget, REL_NOOPENER};
    use crate::node::CodeBlockAttrs;

    fn make_doc(text: &str) -> (Document, NodeId) {
        let mut doc = Document::new();
        let block = doc.children(doc.root())[0];
        assert!(doc.insert_text(block, 0, text));
        (doc, block)
    }

    fn link_mark(href: &str) -> Mark {
        Mark::Link(LinkAttrs {
            href: href.into(),
            target: LinkTarget::Blank,
            rel: REL_NOOPENER.into(),
            title: None,
        })
    }

    #[test]
    fn test_new_doc_has_one_empty_paragraph() {
        let doc = Document::new();
        let children = doc.children(doc.root());
        assert_eq!(children.len(), 1);
        assert_eq!(doc.kind(children[0]), Some(NodeKind::Paragraph));
        assert_eq!(doc.inline_len(children[0]), 0);
    }

    #[test]
    fn test_insert_and_remove_child() {
        let mut doc = Document::new();
        let root = doc.root();
        let second = doc
            .insert_child(root, 1, NodeBody::Paragraph { content: Vec::new() })
            .unwrap();
        assert_eq!(doc.children(root).len(), 2);
        assert_eq!(doc.child_index(second), Some(1));
        assert!(doc.remove_node(second));
        assert_eq!(doc.children(root).len(), 1);
        assert!(!doc.contains(second));
    }

    #[test]
    fn test_remove_frees_subtree_and_reuses_slots() {
        let mut doc = Document::new();
        let root = doc.root();
        let list = doc
            .insert_child(root, 1, NodeBody::BulletList { children: Vec::new() })
            .unwrap();
        let item = doc
            .insert_child(list, 0, NodeBody::ListItem { children: Vec::new() })
            .unwrap();
        let para = doc
            .insert_child(item, 0, NodeBody::Paragraph { content: Vec::new() })
            .unwrap();
        assert!(doc.remove_node(list));
        assert!(!doc.contains(item));
        assert!(!doc.contains(para));
        // Freed slots are handed back out.
        let replacement = doc
            .insert_child(root, 1, NodeBody::HorizontalRule)
            .unwrap();
        assert!([list, item, para].contains(&replacement));
    }

    #[test]
    fn test_root_cannot_be_removed() {
        let mut doc = Document::new();
        let root = doc.root();
        assert!(!doc.remove_node(root));
        assert!(doc.contains(root));
    }

    #[test]
    fn test_find_ancestor_walks_parent_links() {
        let mut doc = Document::new();
        let root = doc.root();
        let quote = doc
            .insert_child(root, 1, NodeBody::Blockquote { children: Vec::new() })
            .unwrap();
        let para = doc
            .insert_child(quote, 0, NodeBody::Paragraph { content: Vec::new() })
            .unwrap();
        assert_eq!(doc.find_ancestor(para, NodeKind::Blockquote), Some(quote));
        assert_eq!(doc.find_ancestor(para, NodeKind::Paragraph), Some(para));
        assert_eq!(doc.find_ancestor(para, NodeKind::CodeBlock), None);
    }

    #[test]
    fn test_detach_then_attach_moves_block() {
        let mut doc = Document::new();
        let root = doc.root();
        let block = doc.children(root)[0];
        let list = doc
            .insert_child(root, 1, NodeBody::BulletList { children: Vec::new() })
            .unwrap();
        let item = doc
            .insert_child(list, 0, NodeBody::ListItem { children: Vec::new() })
            .unwrap();
        assert_eq!(doc.detach(block), Some(0));
        assert!(doc.attach(item, 0, block));
        assert_eq!(doc.parent(block), Some(item));
        assert_eq!(doc.children(root), &[list]);
    }

    #[test]
    fn test_replace_body_frees_old_children() {
        let mut doc = Document::new();
        let root = doc.root();
        let list = doc
            .insert_child(root, 1, NodeBody::BulletList { children: Vec::new() })
            .unwrap();
        let item = doc
            .insert_child(list, 0, NodeBody::ListItem { children: Vec::new() })
            .unwrap();
        assert!(doc.replace_body(list, NodeBody::HorizontalRule));
        assert!(!doc.contains(item));
        assert_eq!(doc.kind(list), Some(NodeKind::HorizontalRule));
    }

    #[test]
    fn test_insert_text_at_offsets() {
        let (mut doc, block) = make_doc("hello");
        assert!(doc.insert_text(block, 5, "!"));
        assert!(doc.insert_text(block, 0, ">"));
        assert_eq!(doc.inline_text(block), ">hello!");
        assert!(!doc.insert_text(block, 99, "x"));
    }

    #[test]
    fn test_insert_at_boundary_joins_earlier_run() {
        let (mut doc, block) = make_doc("ab");
        assert!(doc.add_mark(block, 0..1, Mark::Strong));
        // Offset 1 is the boundary between the strong "a" and plain "b".
        assert!(doc.insert_text(block, 1, "x"));
        let runs = doc.runs(block);
        assert_eq!(runs[0].text, "ax");
        assert!(runs[0].marks.contains(MarkType::Strong));
        assert_eq!(runs[1].text, "b");
    }

    #[test]
    fn test_delete_across_runs_merges_remainder() {
        let (mut doc, block) = make_doc("abcdef");
        assert!(doc.add_mark(block, 2..4, Mark::Em));
        assert!(doc.delete_text(block, 1..5));
        assert_eq!(doc.inline_text(block), "af");
        // "a" and "f" are both unmarked, so they merge into one run.
        assert_eq!(doc.runs(block).len(), 1);
    }

    #[test]
    fn test_delete_removes_mark_with_text() {
        let (mut doc, block) = make_doc("abc");
        assert!(doc.add_mark(block, 1..2, link_mark("https://example.com")));
        assert!(doc.delete_text(block, 1..2));
        assert_eq!(doc.inline_text(block), "ac");
        assert!(doc.runs(block).iter().all(|r| r.marks.is_empty()));
    }

    #[test]
    fn test_remove_mark_leaves_text() {
        let (mut doc, block) = make_doc("abc");
        assert!(doc.add_mark(block, 0..3, Mark::Strong));
        assert!(doc.remove_mark(block, 1..2, MarkType::Strong));
        assert_eq!(doc.inline_text(block), "abc");
        let runs = doc.runs(block);
        assert_eq!(runs.len(), 3);
        assert!(!runs[1].marks.contains(MarkType::Strong));
    }

    #[test]
    fn test_unlink_runs_takes_whole_runs() {
        let (mut doc, block) = make_doc("abcdef");
        assert!(doc.add_mark(block, 0..6, link_mark("https://example.com")));
        // Unlink only chars 2..3; the link run is not split, it is unlinked
        // whole.
        assert!(doc.unlink_runs(block, 2..3));
        assert_eq!(doc.runs(block).len(), 1);
        assert!(doc.runs(block)[0].marks.is_empty());
    }

    #[test]
    fn test_code_block_text_edits() {
        let mut doc = Document::new();
        let root = doc.root();
        let code = doc
            .insert_child(
                root,
                1,
                NodeBody::CodeBlock {
                    attrs: CodeBlockAttrs::default(),
                    code: "let x".into(),
                },
            )
            .unwrap();
        assert!(doc.insert_text(code, 5, " = 1"));
        assert_eq!(doc.code_text(code), Some("let x = 1"));
        assert!(doc.delete_text(code, 0..4));
        assert_eq!(doc.code_text(code), Some("x = 1"));
        // Marks never apply to code blocks.
        assert!(!doc.add_mark(code, 0..1, Mark::Strong));
    }

    #[test]
    fn test_char_offsets_not_bytes() {
        let (mut doc, block) = make_doc("héllo");
        assert!(doc.insert_text(block, 2, "X"));
        assert_eq!(doc.inline_text(block), "héXllo");
        assert!(doc.delete_text(block, 0..2));
        assert_eq!(doc.inline_text(block), "Xllo");
    }
}
