//! Inline marks: formatting that attaches to text runs rather than nodes.
//!
//! A mark lives on the text it decorates. Deleting the text deletes the mark
//! with it; removing the mark leaves the text in place. Links are marks, not
//! nodes, so a single link can span several runs and survives edits inside
//! the linked range.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// The `rel` value forced onto every link that opens in a new tab.
pub const REL_NOOPENER: &str = "noopener noreferrer";

/// Where a link opens.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkTarget {
    /// New tab or window (`_blank`).
    #[default]
    Blank,
    /// Same browsing context (`_self`).
    Current,
    /// Parent frame (`_parent`).
    Parent,
    /// Topmost frame (`_top`).
    Top,
}

impl LinkTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blank => "_blank",
            Self::Current => "_self",
            Self::Parent => "_parent",
            Self::Top => "_top",
        }
    }

    /// Parse a `target` attribute value. Unknown values read as `_self`.
    pub fn from_attr(value: &str) -> Self {
        match value {
            "_blank" => Self::Blank,
            "_parent" => Self::Parent,
            "_top" => Self::Top,
            _ => Self::Current,
        }
    }
}

/// Fully resolved link attributes as stored on a mark.
///
/// `href` is always the sanitized form; raw caller input never lands here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkAttrs {
    pub href: SmolStr,
    pub target: LinkTarget,
    pub rel: SmolStr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<SmolStr>,
}

/// Caller-supplied link payload. Fields left unset resolve against the
/// editor options when the command runs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkRequest {
    pub href: SmolStr,
    pub target: Option<LinkTarget>,
    pub rel: Option<SmolStr>,
    pub title: Option<SmolStr>,
}

impl LinkRequest {
    pub fn new(href: impl Into<SmolStr>) -> Self {
        Self {
            href: href.into(),
            ..Self::default()
        }
    }
}

/// Partial update for existing link marks. Unset fields keep their stored
/// value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkPatch {
    pub href: Option<SmolStr>,
    pub target: Option<LinkTarget>,
    pub rel: Option<SmolStr>,
    pub title: Option<Option<SmolStr>>,
}

/// A single mark on a text run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mark {
    Strong,
    Em,
    Code,
    Link(LinkAttrs),
}

impl Mark {
    pub fn mark_type(&self) -> MarkType {
        match self {
            Self::Strong => MarkType::Strong,
            Self::Em => MarkType::Em,
            Self::Code => MarkType::Code,
            Self::Link(_) => MarkType::Link,
        }
    }
}

/// Mark discriminant, for lookups that do not care about attributes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MarkType {
    Strong,
    Em,
    Code,
    Link,
}

/// The set of marks on one run. At most one mark of each type.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MarkSet(Vec<Mark>);

/// Equality ignores insertion order, so runs marked in different sequences
/// still compare (and coalesce) as equal.
impl PartialEq for MarkSet {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len() && self.0.iter().all(|m| other.0.contains(m))
    }
}

impl Eq for MarkSet {}

impl MarkSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, mark_type: MarkType) -> bool {
        self.0.iter().any(|m| m.mark_type() == mark_type)
    }

    /// The link attributes, if this set carries a link mark.
    pub fn link(&self) -> Option<&LinkAttrs> {
        self.0.iter().find_map(|m| match m {
            Mark::Link(attrs) => Some(attrs),
            _ => None,
        })
    }

    /// Add a mark, replacing any existing mark of the same type.
    pub fn add(&mut self, mark: Mark) {
        self.remove(mark.mark_type());
        self.0.push(mark);
    }

    pub fn remove(&mut self, mark_type: MarkType) {
        self.0.retain(|m| m.mark_type() != mark_type);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mark> {
        self.0.iter()
    }
}

impl FromIterator<Mark> for MarkSet {
    fn from_iter<I: IntoIterator<Item = Mark>>(iter: I) -> Self {
        let mut set = MarkSet::new();
        for mark in iter {
            set.add(mark);
        }
        set
    }
}
