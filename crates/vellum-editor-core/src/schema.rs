//! Serialization schema: documents to and from [`DomElement`] trees.
//!
//! Rendering is total - every node kind has a fixed markup shape. Parsing is
//! the strict inverse over that shape and fails with a [`VellumError`] on
//! anything the schema does not produce: unknown tags, missing required
//! attributes, list children that are not items. Two deliberate safety rules
//! live here: a link that opens in a new tab always renders with
//! `rel="noopener noreferrer"` no matter what is stored, and an href with a
//! blocked protocol never parses.

use smol_str::{SmolStr, format_smolstr};

use vellum_common::{VellumError, has_blocked_protocol};

use crate::doc::{self, Document, NodeId};
use crate::dom::{DomElement, DomNode};
use crate::lang::CodeLanguage;
use crate::marks::{LinkAttrs, LinkTarget, Mark, MarkSet, MarkType, REL_NOOPENER};
use crate::node::{Alignment, CodeBlockAttrs, ImageAttrs, NodeBody, NodeKind, TextRun};

const STYLE_ALIGN_LEFT: &str = "float: left; margin: 0 1em 1em 0;";
const STYLE_ALIGN_RIGHT: &str = "float: right; margin: 0 0 1em 1em;";
const STYLE_ALIGN_CENTER: &str = "display: block; margin-left: auto; margin-right: auto;";

// === Rendering ===

/// Render the whole document, root included, as a `<doc>` element.
pub fn document_to_dom(doc: &Document) -> DomElement {
    node_to_dom(doc, doc.root()).unwrap_or_else(|| DomElement::new("doc"))
}

/// Render the document body as an HTML fragment: the root's children
/// concatenated, without a wrapper element.
pub fn document_to_html(doc: &Document) -> String {
    let mut out = String::new();
    for child in doc.children(doc.root()) {
        if let Some(el) = node_to_dom(doc, *child) {
            out.push_str(&el.to_html());
        }
    }
    out
}

/// Render one node and its subtree.
pub fn node_to_dom(doc: &Document, id: NodeId) -> Option<DomElement> {
    let node = doc.node(id)?;
    Some(render_body(doc, node.body()))
}

fn render_body(doc: &Document, body: &NodeBody) -> DomElement {
    match body {
        NodeBody::Doc { children } => render_container(doc, "doc", children),
        NodeBody::Paragraph { content } => render_textual(SmolStr::new_static("p"), content),
        NodeBody::Heading { level, content } => {
            render_textual(format_smolstr!("h{}", (*level).clamp(1, 6)), content)
        }
        NodeBody::Blockquote { children } => render_container(doc, "blockquote", children),
        NodeBody::BulletList { children } => render_container(doc, "ul", children),
        NodeBody::OrderedList { start, children } => {
            let mut el = render_container(doc, "ol", children);
            if *start != 1 {
                el = el.attr("start", start.to_string());
            }
            el
        }
        NodeBody::ListItem { children } => render_container(doc, "li", children),
        NodeBody::CodeBlock { attrs, code } => render_code_block(attrs, code),
        NodeBody::Image(attrs) => render_image(attrs),
        NodeBody::HorizontalRule => DomElement::new("hr"),
    }
}

fn render_container(doc: &Document, tag: &'static str, children: &[NodeId]) -> DomElement {
    let mut el = DomElement::new(tag);
    for child in children {
        if let Some(rendered) = node_to_dom(doc, *child) {
            el = el.child(rendered);
        }
    }
    el
}

fn render_textual(tag: SmolStr, content: &[TextRun]) -> DomElement {
    let mut el = DomElement::new(tag);
    for run in content {
        el.children.push(render_run(run));
    }
    el
}

/// Wrap a run's text in its mark elements, innermost first. The link, when
/// present, is always the outermost wrapper.
fn render_run(run: &TextRun) -> DomNode {
    let mut node = DomNode::Text(run.text.clone());
    if run.marks.contains(MarkType::Code) {
        node = wrap(node, DomElement::new("code"));
    }
    if run.marks.contains(MarkType::Em) {
        node = wrap(node, DomElement::new("em"));
    }
    if run.marks.contains(MarkType::Strong) {
        node = wrap(node, DomElement::new("strong"));
    }
    if let Some(link) = run.marks.link() {
        node = wrap(node, render_link(link));
    }
    node
}

fn wrap(node: DomNode, mut el: DomElement) -> DomNode {
    el.children.push(node);
    DomNode::Element(el)
}

fn render_link(link: &LinkAttrs) -> DomElement {
    let mut el = DomElement::new("a")
        .attr("href", link.href.as_str())
        .attr("target", link.target.as_str());
    // New-tab links get the safe rel unconditionally, whatever is stored.
    let rel = if link.target == LinkTarget::Blank {
        REL_NOOPENER
    } else {
        link.rel.as_str()
    };
    if !rel.is_empty() {
        el = el.attr("rel", rel);
    }
    if let Some(title) = &link.title {
        el = el.attr("title", title.as_str());
    }
    el
}

fn render_code_block(attrs: &CodeBlockAttrs, code: &str) -> DomElement {
    let token = attrs.language.token();
    DomElement::new("pre")
        .attr("data-language", token)
        .attr(
            "data-line-numbers",
            if attrs.line_numbers { "true" } else { "false" },
        )
        .child(
            DomElement::new("code")
                .attr("class", format!("language-{token}"))
                .text_child(code),
        )
}

fn render_image(attrs: &ImageAttrs) -> DomElement {
    let mut el = DomElement::new("img").attr("src", attrs.src.as_str());
    if let Some(alt) = &attrs.alt {
        el = el.attr("alt", alt.as_str());
    }
    if let Some(width) = attrs.width {
        el = el.attr("width", width.to_string());
    }
    if let Some(height) = attrs.height {
        el = el.attr("height", height.to_string());
    }
    if let Some(file_id) = &attrs.file_id {
        el = el.attr("data-file-id", file_id.as_str());
    }
    el.attr("style", alignment_style(attrs.alignment))
        .attr("loading", "lazy")
        .attr("decoding", "async")
}

fn alignment_style(alignment: Alignment) -> &'static str {
    match alignment {
        Alignment::Left => STYLE_ALIGN_LEFT,
        Alignment::Right => STYLE_ALIGN_RIGHT,
        Alignment::Center => STYLE_ALIGN_CENTER,
    }
}

// === Parsing ===

/// Rebuild a document from its rendered form. The root must be a `<doc>`
/// element; an empty one yields a document with a single empty paragraph.
/// The loaded document carries no selection.
pub fn document_from_dom(root: &DomElement) -> Result<Document, VellumError> {
    if root.tag != "doc" {
        return Err(VellumError::UnknownTag(root.tag.clone()));
    }
    let mut doc = Document::bare();
    let root_id = doc.root();
    parse_children(&mut doc, root_id, root)?;
    if doc.children(root_id).is_empty() {
        let _ = doc.insert_child(root_id, 0, NodeBody::Paragraph { content: Vec::new() });
    }
    Ok(doc)
}

fn parse_children(doc: &mut Document, parent: NodeId, el: &DomElement) -> Result<(), VellumError> {
    for child in &el.children {
        match child {
            DomNode::Element(child_el) => parse_block(doc, parent, child_el)?,
            // Whitespace between blocks is formatting noise.
            DomNode::Text(text) if text.trim().is_empty() => {}
            DomNode::Text(_) => {
                return Err(VellumError::BadStructure {
                    parent: el.tag.clone(),
                    tag: SmolStr::new_static("#text"),
                });
            }
        }
    }
    Ok(())
}

fn parse_block(doc: &mut Document, parent: NodeId, el: &DomElement) -> Result<(), VellumError> {
    let tag = el.tag.as_str();
    let parent_is_list = matches!(
        doc.kind(parent),
        Some(NodeKind::BulletList | NodeKind::OrderedList)
    );
    if parent_is_list != (tag == "li") {
        return Err(VellumError::BadStructure {
            parent: parent_tag(doc, parent),
            tag: el.tag.clone(),
        });
    }
    let body = match tag {
        "p" => NodeBody::Paragraph {
            content: parse_inline(el)?,
        },
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => NodeBody::Heading {
            level: tag.as_bytes()[1] - b'0',
            content: parse_inline(el)?,
        },
        "blockquote" => NodeBody::Blockquote {
            children: Vec::new(),
        },
        "ul" => NodeBody::BulletList {
            children: Vec::new(),
        },
        "ol" => NodeBody::OrderedList {
            start: parse_ol_start(el)?,
            children: Vec::new(),
        },
        "li" => NodeBody::ListItem {
            children: Vec::new(),
        },
        "pre" => parse_code_block(el)?,
        "img" => NodeBody::Image(parse_image(el)?),
        "hr" => NodeBody::HorizontalRule,
        _ => return Err(VellumError::UnknownTag(el.tag.clone())),
    };
    let is_container = body.children().is_some();
    let index = doc.children(parent).len();
    let Some(id) = doc.insert_child(parent, index, body) else {
        return Err(VellumError::BadStructure {
            parent: parent_tag(doc, parent),
            tag: el.tag.clone(),
        });
    };
    if is_container {
        parse_children(doc, id, el)?;
    }
    Ok(())
}

fn parent_tag(doc: &Document, parent: NodeId) -> SmolStr {
    let tag = match doc.kind(parent) {
        Some(NodeKind::Doc) => "doc",
        Some(NodeKind::Blockquote) => "blockquote",
        Some(NodeKind::BulletList) => "ul",
        Some(NodeKind::OrderedList) => "ol",
        Some(NodeKind::ListItem) => "li",
        _ => "?",
    };
    SmolStr::new_static(tag)
}

fn parse_inline(el: &DomElement) -> Result<Vec<TextRun>, VellumError> {
    let mut runs = Vec::new();
    collect_runs(&el.children, &MarkSet::new(), &mut runs)?;
    doc::coalesce(&mut runs);
    Ok(runs)
}

fn collect_runs(
    nodes: &[DomNode],
    marks: &MarkSet,
    out: &mut Vec<TextRun>,
) -> Result<(), VellumError> {
    for node in nodes {
        match node {
            DomNode::Text(text) => out.push(TextRun {
                text: text.clone(),
                marks: marks.clone(),
            }),
            DomNode::Element(el) => {
                let mut inner = marks.clone();
                match el.tag.as_str() {
                    "strong" | "b" => inner.add(Mark::Strong),
                    "em" | "i" => inner.add(Mark::Em),
                    "code" => inner.add(Mark::Code),
                    "a" => inner.add(Mark::Link(parse_link_attrs(el)?)),
                    _ => return Err(VellumError::UnknownTag(el.tag.clone())),
                }
                collect_runs(&el.children, &inner, out)?;
            }
        }
    }
    Ok(())
}

fn parse_link_attrs(el: &DomElement) -> Result<LinkAttrs, VellumError> {
    let href = el.attr_value("href").ok_or(VellumError::MissingAttr {
        tag: SmolStr::new_static("a"),
        attr: "href",
    })?;
    // Script-injection protocols never make it back into a document.
    if has_blocked_protocol(href.trim()) {
        return Err(VellumError::InvalidAttr {
            tag: SmolStr::new_static("a"),
            attr: "href",
            value: href.to_string(),
        });
    }
    let target = el
        .attr_value("target")
        .map(LinkTarget::from_attr)
        .unwrap_or_default();
    let rel = if target == LinkTarget::Blank {
        SmolStr::new_static(REL_NOOPENER)
    } else {
        el.attr_value("rel").map(SmolStr::new).unwrap_or_default()
    };
    Ok(LinkAttrs {
        href: SmolStr::new(href),
        target,
        rel,
        title: el.attr_value("title").map(SmolStr::new),
    })
}

fn parse_code_block(el: &DomElement) -> Result<NodeBody, VellumError> {
    let code_el = el.find_child("code").ok_or(VellumError::MissingCodeChild)?;
    let language = code_el
        .attr_value("class")
        .and_then(|class| {
            class
                .split_whitespace()
                .find_map(|token| token.strip_prefix("language-"))
        })
        .or_else(|| el.attr_value("data-language"))
        .map(CodeLanguage::from_token)
        .unwrap_or_default();
    // The stored flag is compared against the literal "true"; anything else
    // reads as false.
    let line_numbers = el
        .attr_value("data-line-numbers")
        .map(|v| v == "true")
        .unwrap_or(true);
    Ok(NodeBody::CodeBlock {
        attrs: CodeBlockAttrs {
            language,
            line_numbers,
        },
        code: code_el.text_content(),
    })
}

fn parse_image(el: &DomElement) -> Result<ImageAttrs, VellumError> {
    let src = el
        .attr_value("src")
        .filter(|s| !s.trim().is_empty())
        .ok_or(VellumError::MissingAttr {
            tag: SmolStr::new_static("img"),
            attr: "src",
        })?;
    let mut attrs = ImageAttrs::new(src);
    attrs.alt = el.attr_value("alt").map(SmolStr::new);
    attrs.width = parse_dimension(el, "width")?;
    attrs.height = parse_dimension(el, "height")?;
    attrs.file_id = el.attr_value("data-file-id").map(SmolStr::new);
    attrs.alignment = match el.attr_value("style") {
        Some(style) if style.contains("float: left") => Alignment::Left,
        Some(style) if style.contains("float: right") => Alignment::Right,
        _ => Alignment::Center,
    };
    Ok(attrs)
}

fn parse_dimension(el: &DomElement, attr: &'static str) -> Result<Option<u32>, VellumError> {
    match el.attr_value(attr) {
        None => Ok(None),
        Some(value) => value.parse().map(Some).map_err(|_| VellumError::InvalidAttr {
            tag: SmolStr::new_static("img"),
            attr,
            value: value.to_string(),
        }),
    }
}

fn parse_ol_start(el: &DomElement) -> Result<u64, VellumError> {
    match el.attr_value("start") {
        None => Ok(1),
        Some(value) => value.parse().map_err(|_| VellumError::InvalidAttr {
            tag: SmolStr::new_static("ol"),
            attr: "start",
            value: value.to_string(),
        }),
    }
}
