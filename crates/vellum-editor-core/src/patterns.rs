//! Markdown-style trigger patterns for input rules.
//!
//! The registry compiles every pattern once, up front, from the editor
//! options. Matching is first-match-wins over a fixed rule order, and every
//! pattern is anchored at both ends, so a trigger is recognized only when
//! the typed prefix is exactly the marker.

use regex::Regex;
use smol_str::SmolStr;

use crate::options::EditorOptions;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RuleKind {
    Heading,
    BulletList,
    OrderedList,
    Blockquote,
    HorizontalRule,
    CodeFence,
}

struct InputRule {
    pattern: Regex,
    kind: RuleKind,
}

/// A recognized trigger, with everything needed to apply it.
///
/// `len` is the character length of the matched marker text, which the
/// caller deletes before converting the block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuleMatch {
    Heading { len: usize, level: u8 },
    BulletList { len: usize },
    OrderedList { len: usize, start: u64 },
    Blockquote { len: usize },
    HorizontalRule { len: usize },
    CodeFence { len: usize, language: SmolStr },
}

impl RuleMatch {
    /// Character length of the marker text to delete.
    pub fn marker_len(&self) -> usize {
        match self {
            Self::Heading { len, .. }
            | Self::BulletList { len }
            | Self::OrderedList { len, .. }
            | Self::Blockquote { len }
            | Self::HorizontalRule { len }
            | Self::CodeFence { len, .. } => *len,
        }
    }
}

/// The compiled rule set. Immutable once built.
pub struct PatternRegistry {
    rules: Vec<InputRule>,
}

impl PatternRegistry {
    pub fn new(options: &EditorOptions) -> Self {
        let heading_cap = options.max_heading_level.max(1);
        let rules = vec![
            InputRule {
                pattern: Regex::new(&format!(r"^(#{{1,{heading_cap}}})\s$")).unwrap(),
                kind: RuleKind::Heading,
            },
            InputRule {
                pattern: Regex::new(r"^[-*+]\s$").unwrap(),
                kind: RuleKind::BulletList,
            },
            InputRule {
                pattern: Regex::new(r"^(\d+)\.\s$").unwrap(),
                kind: RuleKind::OrderedList,
            },
            InputRule {
                pattern: Regex::new(r"^>\s$").unwrap(),
                kind: RuleKind::Blockquote,
            },
            InputRule {
                pattern: Regex::new(r"^(---|\*\*\*|___)\s$").unwrap(),
                kind: RuleKind::HorizontalRule,
            },
            InputRule {
                pattern: Regex::new(r"^```(\w*)[\s\n]$").unwrap(),
                kind: RuleKind::CodeFence,
            },
        ];
        Self { rules }
    }

    /// Test a block prefix against the rules, in order. Returns the first
    /// match, or `None` when the prefix is not a trigger.
    pub fn match_prefix(&self, prefix: &str) -> Option<RuleMatch> {
        for rule in &self.rules {
            let Some(caps) = rule.pattern.captures(prefix) else {
                continue;
            };
            let len = caps.get(0).map(|m| m.as_str().chars().count())?;
            let matched = match rule.kind {
                RuleKind::Heading => RuleMatch::Heading {
                    len,
                    level: caps.get(1).map(|m| m.as_str().len() as u8).unwrap_or(1),
                },
                RuleKind::BulletList => RuleMatch::BulletList { len },
                RuleKind::OrderedList => RuleMatch::OrderedList {
                    len,
                    start: caps
                        .get(1)
                        .and_then(|m| m.as_str().parse().ok())
                        .unwrap_or(1),
                },
                RuleKind::Blockquote => RuleMatch::Blockquote { len },
                RuleKind::HorizontalRule => RuleMatch::HorizontalRule { len },
                RuleKind::CodeFence => RuleMatch::CodeFence {
                    len,
                    language: caps
                        .get(1)
                        .map(|m| SmolStr::new(m.as_str()))
                        .unwrap_or_default(),
                },
            };
            return Some(matched);
        }
        None
    }
}

impl Default for PatternRegistry {
    fn default() -> Self {
        Self::new(&EditorOptions::default())
    }
}
