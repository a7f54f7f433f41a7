//! Platform abstraction for clipboard access.
//!
//! The engine never talks to a real clipboard; a host (browser shell, native
//! UI, test rig) supplies a [`ClipboardProvider`]. Clipboard trouble is
//! never fatal to an edit: failures are logged and reported through
//! [`CopyOutcome`], and a fallback provider can take over when the primary
//! refuses.

use crate::doc::{Document, NodeId};

/// Error type for clipboard operations.
#[derive(Debug, Clone)]
pub struct ClipboardError(pub String);

impl std::fmt::Display for ClipboardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ClipboardError {}

impl From<&str> for ClipboardError {
    fn from(s: &str) -> Self {
        ClipboardError(s.to_string())
    }
}

impl From<String> for ClipboardError {
    fn from(s: String) -> Self {
        ClipboardError(s)
    }
}

/// Writes text to a host clipboard.
pub trait ClipboardProvider {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// The null provider: every write fails. Useful as a stand-in where no
/// clipboard exists.
impl ClipboardProvider for () {
    fn write_text(&mut self, _text: &str) -> Result<(), ClipboardError> {
        Err("clipboard unavailable".into())
    }
}

impl<T: ClipboardProvider + ?Sized> ClipboardProvider for &mut T {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        (**self).write_text(text)
    }
}

/// How a copy attempt ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CopyOutcome {
    /// The primary provider took the text.
    Copied,
    /// The primary failed; the fallback took the text.
    CopiedViaFallback,
    /// Every available provider failed.
    Failed,
}

impl CopyOutcome {
    pub fn succeeded(&self) -> bool {
        !matches!(self, Self::Failed)
    }
}

/// Copy text through the primary provider, then the fallback. Failures are
/// logged, never raised.
pub fn copy_text(
    primary: &mut dyn ClipboardProvider,
    fallback: Option<&mut dyn ClipboardProvider>,
    text: &str,
) -> CopyOutcome {
    match primary.write_text(text) {
        Ok(()) => return CopyOutcome::Copied,
        Err(err) => {
            tracing::warn!(
                target: "vellum::clipboard",
                error = %err,
                "primary clipboard write failed"
            );
        }
    }
    if let Some(fallback) = fallback {
        match fallback.write_text(text) {
            Ok(()) => return CopyOutcome::CopiedViaFallback,
            Err(err) => {
                tracing::warn!(
                    target: "vellum::clipboard",
                    error = %err,
                    "fallback clipboard write failed"
                );
            }
        }
    }
    CopyOutcome::Failed
}

/// Copy a code block's source text. Fails without logging when the node is
/// not a code block.
pub fn copy_code_block(
    doc: &Document,
    id: NodeId,
    primary: &mut dyn ClipboardProvider,
    fallback: Option<&mut dyn ClipboardProvider>,
) -> CopyOutcome {
    let Some(code) = doc.code_text(id) else {
        return CopyOutcome::Failed;
    };
    copy_text(primary, fallback, code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{CodeBlockAttrs, NodeBody};

    #[derive(Default)]
    struct TestClipboard {
        written: Vec<String>,
        fail: bool,
    }

    impl ClipboardProvider for TestClipboard {
        fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
            if self.fail {
                return Err("denied".into());
            }
            self.written.push(text.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_copy_uses_primary() {
        let mut primary = TestClipboard::default();
        let mut fallback = TestClipboard::default();
        let outcome = copy_text(&mut primary, Some(&mut fallback), "hello");
        assert_eq!(outcome, CopyOutcome::Copied);
        assert_eq!(primary.written, vec!["hello"]);
        assert!(fallback.written.is_empty());
    }

    #[test]
    fn test_copy_falls_back_when_primary_fails() {
        let mut primary = TestClipboard {
            fail: true,
            ..TestClipboard::default()
        };
        let mut fallback = TestClipboard::default();
        let outcome = copy_text(&mut primary, Some(&mut fallback), "hello");
        assert_eq!(outcome, CopyOutcome::CopiedViaFallback);
        assert!(outcome.succeeded());
        assert_eq!(fallback.written, vec!["hello"]);
    }

    #[test]
    fn test_copy_fails_quietly_when_everything_fails() {
        let mut primary = TestClipboard {
            fail: true,
            ..TestClipboard::default()
        };
        let outcome = copy_text(&mut primary, None, "hello");
        assert_eq!(outcome, CopyOutcome::Failed);
        assert!(!outcome.succeeded());
    }

    #[test]
    fn test_copy_code_block_takes_source() {
        let mut doc = Document::new();
        let code = doc
            .insert_child(
                doc.root(),
                1,
                NodeBody::CodeBlock {
                    attrs: CodeBlockAttrs::default(),
                    code: "let x = 1;".into(),
                },
            )
            .unwrap();
        let mut clipboard = TestClipboard::default();
        let outcome = copy_code_block(&doc, code, &mut clipboard, None);
        assert_eq!(outcome, CopyOutcome::Copied);
        assert_eq!(clipboard.written, vec!["let x = 1;"]);
    }

    #[test]
    fn test_copy_code_block_rejects_other_nodes() {
        let doc = Document::new();
        let para = doc.children(doc.root())[0];
        let mut clipboard = TestClipboard::default();
        assert_eq!(
            copy_code_block(&doc, para, &mut clipboard, None),
            CopyOutcome::Failed
        );
        assert!(clipboard.written.is_empty());
    }
}
