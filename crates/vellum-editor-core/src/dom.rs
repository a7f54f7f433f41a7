//! A minimal DOM-shaped tree for serialization.
//!
//! [`DomElement`] is the interchange form between documents and the outside
//! world: schema code renders documents into it and parses documents out of
//! it, and it converts losslessly to JSON. HTML output is write-only; we
//! emit markup but never parse free-form HTML back in.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use vellum_common::VellumError;

/// Tags serialized without closing tags or children.
const VOID_TAGS: &[&str] = &["img", "hr", "br"];

/// An element: tag, attributes in insertion order, children.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomElement {
    pub tag: SmolStr,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attrs: Vec<(SmolStr, String)>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DomNode>,
}

/// A child slot: nested element or raw text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DomNode {
    Text(String),
    Element(DomElement),
}

impl DomElement {
    pub fn new(tag: impl Into<SmolStr>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: impl Into<SmolStr>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    pub fn child(mut self, child: DomElement) -> Self {
        self.children.push(DomNode::Element(child));
        self
    }

    pub fn text_child(mut self, text: impl Into<String>) -> Self {
        self.children.push(DomNode::Text(text.into()));
        self
    }

    /// First value of the named attribute.
    pub fn attr_value(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// First child element with the given tag.
    pub fn find_child(&self, tag: &str) -> Option<&DomElement> {
        self.children.iter().find_map(|c| match c {
            DomNode::Element(el) if el.tag == tag => Some(el),
            _ => None,
        })
    }

    /// All text beneath this element, concatenated.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                DomNode::Text(text) => out.push_str(text),
                DomNode::Element(el) => el.collect_text(out),
            }
        }
    }

    /// Render as HTML. Text and attribute values are escaped; tags and
    /// attribute names come from the schema and are emitted as-is.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        for (name, value) in &self.attrs {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&html_escape::encode_double_quoted_attribute(value));
            out.push('"');
        }
        out.push('>');
        if VOID_TAGS.contains(&self.tag.as_str()) {
            return;
        }
        for child in &self.children {
            match child {
                DomNode::Element(el) => el.write_html(out),
                DomNode::Text(text) => out.push_str(&html_escape::encode_text(text)),
            }
        }
        out.push_str("</");
        out.push_str(&self.tag);
        out.push('>');
    }

    pub fn to_json(&self) -> Result<String, VellumError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, VellumError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_lookups() {
        let el = DomElement::new("pre")
            .attr("data-language", "rust")
            .child(DomElement::new("code").text_child("fn main() {}"));
        assert_eq!(el.attr_value("data-language"), Some("rust"));
        assert_eq!(el.attr_value("missing"), None);
        assert_eq!(el.find_child("code").unwrap().tag, "code");
        assert_eq!(el.text_content(), "fn main() {}");
    }

    #[test]
    fn test_html_escapes_text_and_attrs() {
        let el = DomElement::new("a")
            .attr("href", "https://example.com/?a=1&b=\"2\"")
            .text_child("1 < 2 & 3");
        insta::assert_snapshot!(
            el.to_html(),
            @r#"<a href="https://example.com/?a=1&amp;b=&quot;2&quot;">1 &lt; 2 &amp; 3</a>"#
        );
    }

    #[test]
    fn test_void_tags_have_no_closing_tag() {
        let el = DomElement::new("img").attr("src", "https://example.com/x.png");
        insta::assert_snapshot!(el.to_html(), @r#"<img src="https://example.com/x.png">"#);
        insta::assert_snapshot!(DomElement::new("hr").to_html(), @"<hr>");
    }

    #[test]
    fn test_json_round_trip() {
        let el = DomElement::new("p")
            .text_child("before ")
            .child(DomElement::new("strong").text_child("bold"))
            .text_child(" after");
        let json = el.to_json().unwrap();
        assert_eq!(DomElement::from_json(&json).unwrap(), el);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(DomElement::from_json("not json").is_err());
        assert!(DomElement::from_json("{\"children\": []}").is_err());
    }
}
