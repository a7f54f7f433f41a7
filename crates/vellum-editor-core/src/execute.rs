//! Command execution against a document.
//!
//! [`execute_command`] is the single entry point: it validates, applies, and
//! reports success as a bool. A `false` means the document was not touched.
//! Every command checks its preconditions before the first mutation, so a
//! rejected command never leaves partial state behind.

use std::ops::Range;

use smol_str::SmolStr;

use vellum_common::{is_valid_url, sanitize_url};

use crate::commands::Command;
use crate::doc::{Document, NodeId};
use crate::lang::CodeLanguage;
use crate::marks::{LinkAttrs, LinkPatch, LinkRequest, LinkTarget, Mark, MarkType, REL_NOOPENER};
use crate::node::{Alignment, CodeBlockAttrs, ImageAttrs, ImagePatch, NodeBody, NodeKind, TextRun};
use crate::options::EditorOptions;
use crate::types::{ChangeKind, Selection};

/// Run a command against the document. Returns whether it applied.
pub fn execute_command(doc: &mut Document, command: &Command, options: &EditorOptions) -> bool {
    let applied = match command {
        Command::SetCodeBlock {
            language,
            line_numbers,
        } => execute_set_code_block(doc, *language, *line_numbers, options),
        Command::ToggleCodeBlock { language } => execute_toggle_code_block(doc, *language, options),
        Command::SetCodeBlockLanguage { language } => {
            execute_set_code_block_language(doc, language)
        }
        Command::ToggleLineNumbers => execute_toggle_line_numbers(doc),
        Command::SetImage(attrs) => execute_set_image(doc, attrs),
        Command::UpdateImage(patch) => execute_update_image(doc, patch),
        Command::SetImageAlignment(alignment) => execute_set_image_alignment(doc, *alignment),
        Command::ResizeImage { width, height } => {
            execute_resize_image(doc, *width, *height, options)
        }
        Command::SetLink(req) => execute_set_link(doc, req, options),
        Command::ToggleLink(req) => execute_toggle_link(doc, req, options),
        Command::UpdateLink(patch) => execute_update_link(doc, patch, options),
        Command::ToggleMark(mark_type) => execute_toggle_mark(doc, *mark_type),
        Command::SetHeading { level } => execute_set_heading(doc, *level, options),
        Command::SetParagraph => execute_set_paragraph(doc),
        Command::WrapInBulletList => execute_wrap_in_list(doc, None),
        Command::WrapInOrderedList { start } => execute_wrap_in_list(doc, Some(*start)),
        Command::WrapInBlockquote => execute_wrap_in_blockquote(doc),
        Command::InsertHorizontalRule => execute_insert_horizontal_rule(doc),
    };
    if !applied {
        tracing::debug!(
            target: "vellum::commands",
            command = command.name(),
            "command rejected"
        );
    }
    applied
}

// === Code blocks ===

fn execute_set_code_block(
    doc: &mut Document,
    language: Option<CodeLanguage>,
    line_numbers: Option<bool>,
    options: &EditorOptions,
) -> bool {
    let Some(block) = doc.selected_block() else {
        return false;
    };
    let attrs = CodeBlockAttrs {
        language: language.unwrap_or(options.default_language),
        line_numbers: line_numbers.unwrap_or(options.default_line_numbers),
    };
    match doc.kind(block) {
        Some(NodeKind::Paragraph | NodeKind::Heading) => {
            let code = doc.inline_text(block);
            if !doc.replace_body(block, NodeBody::CodeBlock { attrs, code }) {
                return false;
            }
            normalize_selection(doc, block);
            doc.record_change(block, ChangeKind::Structure);
            true
        }
        Some(NodeKind::CodeBlock) => {
            // Re-running the command on a code block resets its attributes.
            let changed = match doc.node_mut(block).map(|n| &mut n.body) {
                Some(NodeBody::CodeBlock { attrs: current, .. }) => {
                    let changed = *current != attrs;
                    *current = attrs;
                    changed
                }
                _ => return false,
            };
            if changed {
                doc.record_change(block, ChangeKind::Attrs);
            }
            true
        }
        _ => false,
    }
}

fn execute_toggle_code_block(
    doc: &mut Document,
    language: Option<CodeLanguage>,
    options: &EditorOptions,
) -> bool {
    let Some(block) = doc.selected_block() else {
        return false;
    };
    match doc.find_ancestor(block, NodeKind::CodeBlock) {
        Some(code_block) => {
            let code = doc.code_text(code_block).unwrap_or_default().to_string();
            let content = if code.is_empty() {
                Vec::new()
            } else {
                vec![TextRun::plain(code)]
            };
            if !doc.replace_body(code_block, NodeBody::Paragraph { content }) {
                return false;
            }
            normalize_selection(doc, code_block);
            doc.record_change(code_block, ChangeKind::Structure);
            true
        }
        None => execute_set_code_block(doc, language, None, options),
    }
}

fn execute_set_code_block_language(doc: &mut Document, token: &str) -> bool {
    let Some(block) = doc.selected_block() else {
        return false;
    };
    let Some(code_block) = doc.find_ancestor(block, NodeKind::CodeBlock) else {
        return false;
    };
    // Unknown tokens resolve to plaintext rather than failing.
    let language = CodeLanguage::from_token(token);
    let changed = match doc.node_mut(code_block).map(|n| &mut n.body) {
        Some(NodeBody::CodeBlock { attrs, .. }) => {
            let changed = attrs.language != language;
            attrs.language = language;
            changed
        }
        _ => return false,
    };
    if changed {
        doc.record_change(code_block, ChangeKind::Attrs);
    }
    true
}

fn execute_toggle_line_numbers(doc: &mut Document) -> bool {
    let Some(block) = doc.selected_block() else {
        return false;
    };
    let Some(code_block) = doc.find_ancestor(block, NodeKind::CodeBlock) else {
        return false;
    };
    match doc.node_mut(code_block).map(|n| &mut n.body) {
        Some(NodeBody::CodeBlock { attrs, .. }) => {
            attrs.line_numbers = !attrs.line_numbers;
        }
        _ => return false,
    }
    doc.record_change(code_block, ChangeKind::Attrs);
    true
}

// === Images ===

fn selected_image(doc: &Document) -> Option<NodeId> {
    let id = doc.selection.as_node()?;
    (doc.kind(id)? == NodeKind::Image).then_some(id)
}

fn insertion_after(doc: &Document, block: NodeId) -> Option<(NodeId, usize)> {
    let parent = doc.parent(block)?;
    let index = doc.child_index(block)?;
    Some((parent, index + 1))
}

fn execute_set_image(doc: &mut Document, attrs: &ImageAttrs) -> bool {
    if attrs.src.trim().is_empty() {
        return false;
    }
    let slot = match doc.selection {
        Selection::Inline(sel) => insertion_after(doc, sel.block),
        Selection::Node(id) => insertion_after(doc, id),
        Selection::None => Some((doc.root(), doc.children(doc.root()).len())),
    };
    let Some((parent, index)) = slot else {
        return false;
    };
    let Some(image) = doc.insert_child(parent, index, NodeBody::Image(attrs.clone())) else {
        return false;
    };
    doc.selection = Selection::node(image);
    doc.record_change(image, ChangeKind::Structure);
    true
}

fn execute_update_image(doc: &mut Document, patch: &ImagePatch) -> bool {
    let Some(image) = selected_image(doc) else {
        return false;
    };
    if patch.src.as_ref().is_some_and(|s| s.trim().is_empty()) {
        return false;
    }
    let changed = match doc.node_mut(image).map(|n| &mut n.body) {
        Some(NodeBody::Image(attrs)) => {
            let before = attrs.clone();
            if let Some(src) = &patch.src {
                attrs.src = src.clone();
            }
            if let Some(alt) = &patch.alt {
                attrs.alt = alt.clone();
            }
            if let Some(width) = patch.width {
                attrs.width = width;
            }
            if let Some(height) = patch.height {
                attrs.height = height;
            }
            if let Some(alignment) = patch.alignment {
                attrs.alignment = alignment;
            }
            if let Some(file_id) = &patch.file_id {
                attrs.file_id = file_id.clone();
            }
            *attrs != before
        }
        _ => return false,
    };
    if changed {
        doc.record_change(image, ChangeKind::Attrs);
    }
    true
}

fn execute_set_image_alignment(doc: &mut Document, alignment: Alignment) -> bool {
    execute_update_image(
        doc,
        &ImagePatch {
            alignment: Some(alignment),
            ..ImagePatch::default()
        },
    )
}

fn execute_resize_image(
    doc: &mut Document,
    width: u32,
    height: Option<u32>,
    options: &EditorOptions,
) -> bool {
    let Some(image) = selected_image(doc) else {
        return false;
    };
    let min = options.min_image_width;
    let max = options.max_image_width.max(min);
    match doc.node_mut(image).map(|n| &mut n.body) {
        Some(NodeBody::Image(attrs)) => {
            attrs.width = Some(width.clamp(min, max));
            // No height means the image keeps its natural aspect ratio.
            attrs.height = height;
        }
        _ => return false,
    }
    doc.record_change(image, ChangeKind::Attrs);
    true
}

// === Links and marks ===

/// Sanitize and validate a link request, filling unset fields from the
/// options. `None` means the href is unacceptable and nothing may change.
fn resolve_link_attrs(req: &LinkRequest, options: &EditorOptions) -> Option<LinkAttrs> {
    if req.href.trim().is_empty() {
        return None;
    }
    let href = sanitize_url(&req.href, &options.default_protocol);
    if !is_valid_url(&href, &options.allowed_protocols) {
        tracing::debug!(target: "vellum::commands", href = %req.href, "link href rejected");
        return None;
    }
    let target = req.target.unwrap_or(if options.open_in_new_tab {
        LinkTarget::Blank
    } else {
        LinkTarget::Current
    });
    let rel = if target == LinkTarget::Blank {
        SmolStr::new_static(REL_NOOPENER)
    } else {
        req.rel.clone().unwrap_or_default()
    };
    Some(LinkAttrs {
        href,
        target,
        rel,
        title: req.title.clone(),
    })
}

fn execute_set_link(doc: &mut Document, req: &LinkRequest, options: &EditorOptions) -> bool {
    let Some(sel) = doc.selection.as_inline() else {
        return false;
    };
    if sel.is_empty() {
        return false;
    }
    let Some(attrs) = resolve_link_attrs(req, options) else {
        return false;
    };
    if !doc.add_mark(sel.block, sel.to_range(), Mark::Link(attrs)) {
        return false;
    }
    doc.record_change(sel.block, ChangeKind::Marks);
    true
}

fn execute_toggle_link(doc: &mut Document, req: &LinkRequest, options: &EditorOptions) -> bool {
    let Some(sel) = doc.selection.as_inline() else {
        return false;
    };
    if sel.is_empty() {
        return false;
    }
    if range_fully_marked(doc, sel.block, sel.to_range(), MarkType::Link) {
        if !doc.unlink_runs(sel.block, sel.to_range()) {
            return false;
        }
        doc.record_change(sel.block, ChangeKind::Marks);
        true
    } else {
        execute_set_link(doc, req, options)
    }
}

fn execute_update_link(doc: &mut Document, patch: &LinkPatch, options: &EditorOptions) -> bool {
    let Some(sel) = doc.selection.as_inline() else {
        return false;
    };
    let range = sel.to_range();
    // Sanitize the replacement href before touching any mark.
    let href = match &patch.href {
        Some(href) => {
            if href.trim().is_empty() {
                return false;
            }
            let sanitized = sanitize_url(href, &options.default_protocol);
            if !is_valid_url(&sanitized, &options.allowed_protocols) {
                tracing::debug!(target: "vellum::commands", href = %href, "link href rejected");
                return false;
            }
            Some(sanitized)
        }
        None => None,
    };
    let Some(runs) = doc.node_mut(sel.block).and_then(|n| n.body.inline_mut()) else {
        return false;
    };
    let mut pos = 0usize;
    let mut touched = false;
    for run in runs.iter_mut() {
        let run_start = pos;
        let run_end = pos + run.len_chars();
        pos = run_end;
        // Strict overlap. A caret strictly inside a run also qualifies, so
        // updating with the cursor parked in a link still works.
        if run_end <= range.start || run_start >= range.end {
            continue;
        }
        let Some(existing) = run.marks.link() else {
            continue;
        };
        let mut attrs = existing.clone();
        if let Some(href) = &href {
            attrs.href = href.clone();
        }
        if let Some(target) = patch.target {
            attrs.target = target;
        }
        if let Some(rel) = &patch.rel {
            attrs.rel = rel.clone();
        }
        if let Some(title) = &patch.title {
            attrs.title = title.clone();
        }
        if attrs.target == LinkTarget::Blank {
            attrs.rel = SmolStr::new_static(REL_NOOPENER);
        }
        run.marks.add(Mark::Link(attrs));
        touched = true;
    }
    if !touched {
        return false;
    }
    doc.coalesce_runs(sel.block);
    doc.record_change(sel.block, ChangeKind::Marks);
    true
}

fn execute_toggle_mark(doc: &mut Document, mark_type: MarkType) -> bool {
    // Links carry attributes and have their own commands.
    let mark = match mark_type {
        MarkType::Strong => Mark::Strong,
        MarkType::Em => Mark::Em,
        MarkType::Code => Mark::Code,
        MarkType::Link => return false,
    };
    let Some(sel) = doc.selection.as_inline() else {
        return false;
    };
    if sel.is_empty() {
        return false;
    }
    let range = sel.to_range();
    let applied = if range_fully_marked(doc, sel.block, range.clone(), mark_type) {
        doc.remove_mark(sel.block, range, mark_type)
    } else {
        doc.add_mark(sel.block, range, mark)
    };
    if applied {
        doc.record_change(sel.block, ChangeKind::Marks);
    }
    applied
}

/// Is every run intersecting `range` carrying the mark? False when nothing
/// intersects.
fn range_fully_marked(
    doc: &Document,
    block: NodeId,
    range: Range<usize>,
    mark_type: MarkType,
) -> bool {
    let mut pos = 0usize;
    let mut any = false;
    for run in doc.runs(block) {
        let run_start = pos;
        let run_end = pos + run.len_chars();
        pos = run_end;
        if run_start < range.end && run_end > range.start {
            if !run.marks.contains(mark_type) {
                return false;
            }
            any = true;
        }
    }
    any
}

// === Block structure ===

fn execute_set_heading(doc: &mut Document, level: u8, options: &EditorOptions) -> bool {
    if level == 0 || level > options.max_heading_level {
        return false;
    }
    let Some(block) = doc.selected_block() else {
        return false;
    };
    if !doc.node(block).is_some_and(|n| n.body().is_textual()) {
        return false;
    }
    let content = doc.runs(block).to_vec();
    if !doc.replace_body(block, NodeBody::Heading { level, content }) {
        return false;
    }
    doc.record_change(block, ChangeKind::Structure);
    true
}

fn execute_set_paragraph(doc: &mut Document) -> bool {
    let Some(block) = doc.selected_block() else {
        return false;
    };
    let content = match doc.node(block).map(|n| n.body()) {
        Some(NodeBody::Paragraph { .. }) => return true,
        Some(NodeBody::Heading { content, .. }) => content.clone(),
        Some(NodeBody::CodeBlock { code, .. }) => {
            if code.is_empty() {
                Vec::new()
            } else {
                vec![TextRun::plain(code.clone())]
            }
        }
        _ => return false,
    };
    if !doc.replace_body(block, NodeBody::Paragraph { content }) {
        return false;
    }
    normalize_selection(doc, block);
    doc.record_change(block, ChangeKind::Structure);
    true
}

fn execute_wrap_in_list(doc: &mut Document, start: Option<u64>) -> bool {
    let Some(block) = doc.selected_block() else {
        return false;
    };
    if matches!(
        doc.kind(block),
        None | Some(NodeKind::Doc) | Some(NodeKind::ListItem)
    ) {
        return false;
    }
    let Some(parent) = doc.parent(block) else {
        return false;
    };
    // A block already sitting in a list item does not get a second list.
    if doc.kind(parent) == Some(NodeKind::ListItem) {
        return false;
    }
    let Some(index) = doc.child_index(block) else {
        return false;
    };
    let wrapper = match start {
        Some(start) => NodeBody::OrderedList {
            start,
            children: Vec::new(),
        },
        None => NodeBody::BulletList {
            children: Vec::new(),
        },
    };
    let Some(list) = doc.insert_child(parent, index, wrapper) else {
        return false;
    };
    let Some(item) = doc.insert_child(list, 0, NodeBody::ListItem { children: Vec::new() })
    else {
        return false;
    };
    if doc.detach(block).is_none() || !doc.attach(item, 0, block) {
        return false;
    }
    doc.record_change(list, ChangeKind::Structure);
    true
}

fn execute_wrap_in_blockquote(doc: &mut Document) -> bool {
    let Some(block) = doc.selected_block() else {
        return false;
    };
    if matches!(
        doc.kind(block),
        None | Some(NodeKind::Doc) | Some(NodeKind::ListItem)
    ) {
        return false;
    }
    let Some(parent) = doc.parent(block) else {
        return false;
    };
    if doc.kind(parent) == Some(NodeKind::Blockquote) {
        return false;
    }
    let Some(index) = doc.child_index(block) else {
        return false;
    };
    let Some(quote) = doc.insert_child(parent, index, NodeBody::Blockquote { children: Vec::new() })
    else {
        return false;
    };
    if doc.detach(block).is_none() || !doc.attach(quote, 0, block) {
        return false;
    }
    doc.record_change(quote, ChangeKind::Structure);
    true
}

fn execute_insert_horizontal_rule(doc: &mut Document) -> bool {
    let Some(block) = doc.selected_block() else {
        return false;
    };
    if !matches!(
        doc.kind(block),
        Some(NodeKind::Paragraph | NodeKind::Heading)
    ) {
        return false;
    }
    let Some(parent) = doc.parent(block) else {
        return false;
    };
    let Some(index) = doc.child_index(block) else {
        return false;
    };
    if !doc.replace_body(block, NodeBody::HorizontalRule) {
        return false;
    }
    let Some(para) = doc.insert_child(parent, index + 1, NodeBody::Paragraph { content: Vec::new() })
    else {
        return false;
    };
    doc.selection = Selection::caret(para, 0);
    doc.record_change(block, ChangeKind::Structure);
    true
}

/// Keep an inline selection that still fits the block, otherwise drop the
/// caret at its start.
fn normalize_selection(doc: &mut Document, block: NodeId) {
    let keep = matches!(
        &doc.selection,
        Selection::Inline(sel) if sel.block == block && sel.end() <= doc.inline_len(block)
    );
    if !keep {
        doc.selection = Selection::caret(block, 0);
    }
}
