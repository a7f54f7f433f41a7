//! The command vocabulary understood by [`crate::execute::execute_command`].
//!
//! Commands are plain values. Building one performs no validation and never
//! touches a document; all checking happens at execution time, where a
//! command either applies fully or reports `false` and leaves the document
//! untouched.

use smol_str::SmolStr;

use crate::lang::CodeLanguage;
use crate::marks::{LinkPatch, LinkRequest, MarkType};
use crate::node::{Alignment, ImageAttrs, ImagePatch};

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    // === Code blocks ===
    /// Convert the selected block into a code block. Unset fields fall back
    /// to the configured defaults.
    SetCodeBlock {
        language: Option<CodeLanguage>,
        line_numbers: Option<bool>,
    },
    /// Convert to a code block, or back to a paragraph if the selection is
    /// already inside one.
    ToggleCodeBlock { language: Option<CodeLanguage> },
    /// Change the language of the code block enclosing the selection. The
    /// token may be an alias; unknown tokens resolve to plaintext.
    SetCodeBlockLanguage { language: SmolStr },
    /// Flip the line-number gutter of the enclosing code block.
    ToggleLineNumbers,

    // === Images ===
    /// Insert an image after the selected block and select it.
    SetImage(ImageAttrs),
    /// Patch the attributes of the selected image.
    UpdateImage(ImagePatch),
    /// Set the alignment of the selected image.
    SetImageAlignment(Alignment),
    /// Resize the selected image. Width is clamped to the configured range;
    /// height is stored as given, or cleared to keep the aspect ratio
    /// natural.
    ResizeImage { width: u32, height: Option<u32> },

    // === Links and marks ===
    /// Link the selected text. The href is sanitized, then validated; an
    /// href that fails validation rejects the command.
    SetLink(LinkRequest),
    /// Link the selected text, or unlink it if it is already fully linked.
    ToggleLink(LinkRequest),
    /// Patch every link mark intersecting the selection.
    UpdateLink(LinkPatch),
    /// Flip a simple formatting mark on the selected text. Links have their
    /// own commands and are rejected here.
    ToggleMark(MarkType),

    // === Block structure ===
    /// Convert the selected block into a heading of the given level.
    SetHeading { level: u8 },
    /// Convert the selected block back into a paragraph.
    SetParagraph,
    /// Wrap the selected block in a bullet list.
    WrapInBulletList,
    /// Wrap the selected block in an ordered list starting at `start`.
    WrapInOrderedList { start: u64 },
    /// Wrap the selected block in a blockquote.
    WrapInBlockquote,
    /// Replace the selected block with a horizontal rule and put the caret
    /// in a fresh paragraph after it.
    InsertHorizontalRule,
}

impl Command {
    /// Stable name for log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetCodeBlock { .. } => "set_code_block",
            Self::ToggleCodeBlock { .. } => "toggle_code_block",
            Self::SetCodeBlockLanguage { .. } => "set_code_block_language",
            Self::ToggleLineNumbers => "toggle_line_numbers",
            Self::SetImage(_) => "set_image",
            Self::UpdateImage(_) => "update_image",
            Self::SetImageAlignment(_) => "set_image_alignment",
            Self::ResizeImage { .. } => "resize_image",
            Self::SetLink(_) => "set_link",
            Self::ToggleLink(_) => "toggle_link",
            Self::UpdateLink(_) => "update_link",
            Self::ToggleMark(_) => "toggle_mark",
            Self::SetHeading { .. } => "set_heading",
            Self::SetParagraph => "set_paragraph",
            Self::WrapInBulletList => "wrap_in_bullet_list",
            Self::WrapInOrderedList { .. } => "wrap_in_ordered_list",
            Self::WrapInBlockquote => "wrap_in_blockquote",
            Self::InsertHorizontalRule => "insert_horizontal_rule",
        }
    }
}
