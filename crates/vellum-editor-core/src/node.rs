//! Node bodies: the typed content of each document node.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::doc::NodeId;
use crate::lang::CodeLanguage;
use crate::marks::MarkSet;

/// Horizontal placement of an image within its line box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    #[default]
    Center,
    Right,
}

impl Alignment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }
}

/// Attributes of a code block node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlockAttrs {
    pub language: CodeLanguage,
    pub line_numbers: bool,
}

impl Default for CodeBlockAttrs {
    fn default() -> Self {
        Self {
            language: CodeLanguage::Plaintext,
            line_numbers: true,
        }
    }
}

/// Attributes of an image node. `src` is the only required field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAttrs {
    pub src: SmolStr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<SmolStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default)]
    pub alignment: Alignment,
    /// Upload-tracking id, carried as `data-file-id` in markup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<SmolStr>,
}

impl ImageAttrs {
    pub fn new(src: impl Into<SmolStr>) -> Self {
        Self {
            src: src.into(),
            alt: None,
            width: None,
            height: None,
            alignment: Alignment::default(),
            file_id: None,
        }
    }
}

/// Partial update for an existing image. Unset fields keep their stored
/// value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImagePatch {
    pub src: Option<SmolStr>,
    pub alt: Option<Option<SmolStr>>,
    pub width: Option<Option<u32>>,
    pub height: Option<Option<u32>>,
    pub alignment: Option<Alignment>,
    pub file_id: Option<Option<SmolStr>>,
}

/// A maximal span of inline text with a uniform mark set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    #[serde(default, skip_serializing_if = "MarkSet::is_empty")]
    pub marks: MarkSet,
}

impl TextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: MarkSet::new(),
        }
    }

    pub fn len_chars(&self) -> usize {
        self.text.chars().count()
    }
}

/// The content of a node, one variant per node kind.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeBody {
    Doc { children: Vec<NodeId> },
    Paragraph { content: Vec<TextRun> },
    Heading { level: u8, content: Vec<TextRun> },
    Blockquote { children: Vec<NodeId> },
    BulletList { children: Vec<NodeId> },
    OrderedList { start: u64, children: Vec<NodeId> },
    ListItem { children: Vec<NodeId> },
    CodeBlock { attrs: CodeBlockAttrs, code: String },
    Image(ImageAttrs),
    HorizontalRule,
}

/// Node discriminant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Doc,
    Paragraph,
    Heading,
    Blockquote,
    BulletList,
    OrderedList,
    ListItem,
    CodeBlock,
    Image,
    HorizontalRule,
}

impl NodeBody {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Doc { .. } => NodeKind::Doc,
            Self::Paragraph { .. } => NodeKind::Paragraph,
            Self::Heading { .. } => NodeKind::Heading,
            Self::Blockquote { .. } => NodeKind::Blockquote,
            Self::BulletList { .. } => NodeKind::BulletList,
            Self::OrderedList { .. } => NodeKind::OrderedList,
            Self::ListItem { .. } => NodeKind::ListItem,
            Self::CodeBlock { .. } => NodeKind::CodeBlock,
            Self::Image(_) => NodeKind::Image,
            Self::HorizontalRule => NodeKind::HorizontalRule,
        }
    }

    /// Paragraphs and headings carry marked inline text.
    pub fn is_textual(&self) -> bool {
        matches!(self, Self::Paragraph { .. } | Self::Heading { .. })
    }

    pub fn children(&self) -> Option<&Vec<NodeId>> {
        match self {
            Self::Doc { children }
            | Self::Blockquote { children }
            | Self::BulletList { children }
            | Self::OrderedList { children, .. }
            | Self::ListItem { children } => Some(children),
            _ => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<NodeId>> {
        match self {
            Self::Doc { children }
            | Self::Blockquote { children }
            | Self::BulletList { children }
            | Self::OrderedList { children, .. }
            | Self::ListItem { children } => Some(children),
            _ => None,
        }
    }

    pub fn inline(&self) -> Option<&Vec<TextRun>> {
        match self {
            Self::Paragraph { content } | Self::Heading { content, .. } => Some(content),
            _ => None,
        }
    }

    pub fn inline_mut(&mut self) -> Option<&mut Vec<TextRun>> {
        match self {
            Self::Paragraph { content } | Self::Heading { content, .. } => Some(content),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_block_defaults() {
        let attrs = CodeBlockAttrs::default();
        assert_eq!(attrs.language, CodeLanguage::Plaintext);
        assert!(attrs.line_numbers);
    }

    #[test]
    fn test_image_defaults_center() {
        let attrs = ImageAttrs::new("https://example.com/cat.png");
        assert_eq!(attrs.alignment, Alignment::Center);
        assert!(attrs.width.is_none());
    }

    #[test]
    fn test_kind_and_textual() {
        let para = NodeBody::Paragraph {
            content: vec![TextRun::plain("hi")],
        };
        assert_eq!(para.kind(), NodeKind::Paragraph);
        assert!(para.is_textual());
        assert!(para.inline().is_some());
        assert!(para.children().is_none());

        let hr = NodeBody::HorizontalRule;
        assert!(!hr.is_textual());
        assert!(hr.inline().is_none());
        assert!(hr.children().is_none());
    }

    #[test]
    fn test_len_chars_is_char_based() {
        assert_eq!(TextRun::plain("héllo").len_chars(), 5);
    }
}
