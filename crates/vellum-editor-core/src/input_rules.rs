//! Text insertion with markdown-style trigger handling.
//!
//! [`insert_text`] is how typed (or pasted) text enters the document. After
//! the text lands, the prefix before the caret is tested against the pattern
//! registry; a match deletes the marker and runs the matching conversion
//! command. When that command cannot apply (say a bullet typed inside an
//! existing list item), the whole rule is rolled back and the marker stays
//! in the text as typed.
//!
//! Rules only fire in paragraphs. Headings, code blocks, and everything
//! else take the characters literally.

use crate::commands::Command;
use crate::doc::{Document, NodeId};
use crate::execute::execute_command;
use crate::lang::CodeLanguage;
use crate::node::NodeKind;
use crate::options::EditorOptions;
use crate::patterns::{PatternRegistry, RuleMatch};
use crate::types::{ChangeKind, Selection};

/// Insert text at the current selection, replacing it if non-empty, then
/// apply any input rule the new prefix triggers. Returns whether the
/// insertion itself happened; a rolled-back rule still counts as a
/// successful insertion.
pub fn insert_text(
    doc: &mut Document,
    text: &str,
    registry: &PatternRegistry,
    options: &EditorOptions,
) -> bool {
    let Some(sel) = doc.selection.as_inline() else {
        return false;
    };
    let start = sel.start();
    if !sel.is_empty() && !doc.delete_text(sel.block, sel.to_range()) {
        return false;
    }
    if !doc.insert_text(sel.block, start, text) {
        return false;
    }
    let caret = start + text.chars().count();
    doc.selection = Selection::caret(sel.block, caret);
    doc.record_change(sel.block, ChangeKind::Text);

    if doc.kind(sel.block) == Some(NodeKind::Paragraph) {
        let prefix: String = doc.inline_text(sel.block).chars().take(caret).collect();
        if tracing::enabled!(target: "vellum::rules", tracing::Level::TRACE) {
            tracing::trace!(
                target: "vellum::rules",
                block = %sel.block,
                prefix = %prefix,
                "matching line prefix"
            );
        }
        if let Some(rule) = registry.match_prefix(&prefix) {
            tracing::debug!(
                target: "vellum::rules",
                block = %sel.block,
                rule = ?rule,
                "input rule triggered"
            );
            apply_rule(doc, sel.block, &rule, options);
        }
    }
    true
}

fn apply_rule(doc: &mut Document, block: NodeId, rule: &RuleMatch, options: &EditorOptions) {
    let before = doc.clone();
    if !doc.delete_text(block, 0..rule.marker_len()) {
        return;
    }
    doc.selection = Selection::caret(block, 0);
    let command = match rule {
        RuleMatch::Heading { level, .. } => Command::SetHeading { level: *level },
        RuleMatch::BulletList { .. } => Command::WrapInBulletList,
        RuleMatch::OrderedList { start, .. } => Command::WrapInOrderedList { start: *start },
        RuleMatch::Blockquote { .. } => Command::WrapInBlockquote,
        RuleMatch::HorizontalRule { .. } => Command::InsertHorizontalRule,
        RuleMatch::CodeFence { language, .. } => Command::SetCodeBlock {
            language: Some(if language.is_empty() {
                options.default_language
            } else {
                CodeLanguage::from_token(language)
            }),
            line_numbers: None,
        },
    };
    if !execute_command(doc, &command, options) {
        // Conversion refused; the marker stays literal.
        *doc = before;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeBody;

    struct Rig {
        doc: Document,
        block: NodeId,
        registry: PatternRegistry,
        options: EditorOptions,
    }

    impl Rig {
        fn new() -> Self {
            let doc = Document::new();
            let block = doc.children(doc.root())[0];
            Self {
                doc,
                block,
                registry: PatternRegistry::default(),
                options: EditorOptions::default(),
            }
        }

        /// Feed text one character at a time, like typing.
        fn type_str(&mut self, text: &str) {
            for ch in text.chars() {
                assert!(insert_text(
                    &mut self.doc,
                    &ch.to_string(),
                    &self.registry,
                    &self.options
                ));
            }
        }
    }

    #[test]
    fn test_fence_converts_to_typed_language() {
        let mut rig = Rig::new();
        rig.type_str("```typescript\n");
        assert_eq!(rig.doc.kind(rig.block), Some(NodeKind::CodeBlock));
        // The trigger text is gone.
        assert_eq!(rig.doc.code_text(rig.block), Some(""));
        match rig.doc.node(rig.block).unwrap().body() {
            NodeBody::CodeBlock { attrs, .. } => {
                assert_eq!(attrs.language, CodeLanguage::Typescript);
                assert!(attrs.line_numbers);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_bare_fence_uses_default_language() {
        let mut rig = Rig::new();
        rig.type_str("```\n");
        match rig.doc.node(rig.block).unwrap().body() {
            NodeBody::CodeBlock { attrs, .. } => {
                assert_eq!(attrs.language, CodeLanguage::Plaintext)
            }
            _ => panic!("expected code block"),
        }
    }

    #[test]
    fn test_heading_rule() {
        let mut rig = Rig::new();
        rig.type_str("## ");
        assert!(matches!(
            rig.doc.node(rig.block).unwrap().body(),
            NodeBody::Heading { level: 2, .. }
        ));
        assert_eq!(rig.doc.inline_text(rig.block), "");
        assert_eq!(rig.doc.selection, Selection::caret(rig.block, 0));
    }

    #[test]
    fn test_heading_above_cap_stays_literal() {
        let mut rig = Rig::new();
        rig.type_str("#### ");
        assert_eq!(rig.doc.kind(rig.block), Some(NodeKind::Paragraph));
        assert_eq!(rig.doc.inline_text(rig.block), "#### ");
    }

    #[test]
    fn test_bullet_rule_wraps_block() {
        let mut rig = Rig::new();
        rig.type_str("- ");
        let list = rig.doc.children(rig.doc.root())[0];
        assert_eq!(rig.doc.kind(list), Some(NodeKind::BulletList));
        let item = rig.doc.children(list)[0];
        assert_eq!(rig.doc.children(item), &[rig.block]);
        assert_eq!(rig.doc.inline_text(rig.block), "");
    }

    #[test]
    fn test_ordered_rule_keeps_typed_start() {
        let mut rig = Rig::new();
        rig.type_str("2. ");
        let list = rig.doc.children(rig.doc.root())[0];
        assert!(matches!(
            rig.doc.node(list).unwrap().body(),
            NodeBody::OrderedList { start: 2, .. }
        ));
    }

    #[test]
    fn test_blockquote_rule() {
        let mut rig = Rig::new();
        rig.type_str("> quoted");
        let quote = rig.doc.children(rig.doc.root())[0];
        assert_eq!(rig.doc.kind(quote), Some(NodeKind::Blockquote));
        assert_eq!(rig.doc.inline_text(rig.block), "quoted");
    }

    #[test]
    fn test_horizontal_rule_leaves_caret_in_new_paragraph() {
        let mut rig = Rig::new();
        rig.type_str("--- ");
        let root = rig.doc.root();
        assert_eq!(rig.doc.kind(rig.block), Some(NodeKind::HorizontalRule));
        let para = rig.doc.children(root)[1];
        assert_eq!(rig.doc.kind(para), Some(NodeKind::Paragraph));
        assert_eq!(rig.doc.selection, Selection::caret(para, 0));
    }

    #[test]
    fn test_no_fire_mid_line() {
        let mut rig = Rig::new();
        rig.type_str("hello");
        rig.type_str("# ");
        assert_eq!(rig.doc.kind(rig.block), Some(NodeKind::Paragraph));
        assert_eq!(rig.doc.inline_text(rig.block), "hello# ");
    }

    #[test]
    fn test_no_fire_in_code_block() {
        let mut rig = Rig::new();
        assert!(execute_command(
            &mut rig.doc,
            &Command::SetCodeBlock {
                language: None,
                line_numbers: None
            },
            &rig.options
        ));
        rig.type_str("# ");
        assert_eq!(rig.doc.kind(rig.block), Some(NodeKind::CodeBlock));
        assert_eq!(rig.doc.code_text(rig.block), Some("# "));
    }

    #[test]
    fn test_rule_rolls_back_when_conversion_refused() {
        let mut rig = Rig::new();
        assert!(execute_command(
            &mut rig.doc,
            &Command::WrapInBulletList,
            &rig.options
        ));
        // A bullet marker typed inside an existing list item cannot wrap
        // again; the marker must survive as plain text.
        rig.type_str("- ");
        assert_eq!(rig.doc.kind(rig.block), Some(NodeKind::Paragraph));
        assert_eq!(rig.doc.inline_text(rig.block), "- ");
        let list = rig.doc.children(rig.doc.root())[0];
        assert_eq!(rig.doc.kind(list), Some(NodeKind::BulletList));
        assert_eq!(rig.doc.children(rig.doc.root()).len(), 1);
    }

    #[test]
    fn test_insert_replaces_selection() {
        let mut rig = Rig::new();
        rig.type_str("hello world");
        rig.doc.selection = Selection::inline(rig.block, 0, 5);
        assert!(insert_text(&mut rig.doc, "X", &rig.registry, &rig.options));
        assert_eq!(rig.doc.inline_text(rig.block), "X world");
        assert_eq!(rig.doc.selection, Selection::caret(rig.block, 1));
    }

    #[test]
    fn test_requires_inline_selection() {
        let mut rig = Rig::new();
        rig.doc.selection = Selection::None;
        assert!(!insert_text(&mut rig.doc, "x", &rig.registry, &rig.options));
        rig.doc.selection = Selection::node(rig.block);
        assert!(!insert_text(&mut rig.doc, "x", &rig.registry, &rig.options));
    }

    #[test]
    fn test_rule_fires_with_trailing_text() {
        let mut rig = Rig::new();
        rig.type_str("hello");
        rig.doc.selection = Selection::caret(rig.block, 0);
        rig.type_str("# ");
        assert!(matches!(
            rig.doc.node(rig.block).unwrap().body(),
            NodeBody::Heading { level: 1, .. }
        ));
        assert_eq!(rig.doc.inline_text(rig.block), "hello");
    }
}
