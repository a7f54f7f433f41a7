//! vellum-editor-core: Pure Rust rich-text editor logic without framework
//! dependencies.
//!
//! This crate provides:
//! - `Document` - a tree of block nodes with marked inline text
//! - `Command` + `execute_command` - validate-then-mutate editing operations
//! - `PatternRegistry` + `insert_text` - markdown-style input rules
//! - `schema` - HTML-shaped DOM serialization and parsing
//! - `UndoableDocument` - snapshot-based undo/redo
//! - `ClipboardProvider` - platform seam for copy support

pub mod commands;
pub mod doc;
pub mod dom;
pub mod execute;
pub mod input_rules;
pub mod lang;
pub mod marks;
pub mod node;
pub mod options;
pub mod patterns;
pub mod platform;
pub mod schema;
pub mod types;
pub mod undo;

pub use commands::Command;
pub use doc::{Document, Node, NodeId};
pub use dom::{DomElement, DomNode};
pub use execute::execute_command;
pub use input_rules::insert_text;
pub use lang::{CodeLanguage, detect_language};
pub use marks::{
    LinkAttrs, LinkPatch, LinkRequest, LinkTarget, Mark, MarkSet, MarkType, REL_NOOPENER,
};
pub use node::{
    Alignment, CodeBlockAttrs, ImageAttrs, ImagePatch, NodeBody, NodeKind, TextRun,
};
pub use options::EditorOptions;
pub use patterns::{PatternRegistry, RuleMatch};
pub use platform::{ClipboardError, ClipboardProvider, CopyOutcome, copy_code_block, copy_text};
pub use schema::{document_from_dom, document_to_dom, document_to_html, node_to_dom};
pub use smol_str::SmolStr;
pub use types::{ChangeInfo, ChangeKind, InlineSelection, Selection};
pub use undo::{UndoManager, UndoableDocument};
pub use vellum_common::VellumError;
