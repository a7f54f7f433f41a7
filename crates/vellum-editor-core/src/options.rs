//! Editor configuration.
//!
//! One options struct covers the whole engine: pattern compilation, command
//! defaults, link sanitization, and history depth. Patterns are compiled
//! from the options once at startup, so changing `max_heading_level` after
//! building a [`crate::patterns::PatternRegistry`] has no effect on it.

use smol_str::SmolStr;

use vellum_common::DEFAULT_ALLOWED_PROTOCOLS;

use crate::lang::CodeLanguage;

#[derive(Clone, Debug, PartialEq)]
pub struct EditorOptions {
    /// Largest heading level the `#` input rule produces (1 through this).
    pub max_heading_level: u8,
    /// Lower clamp bound for image resize, in pixels.
    pub min_image_width: u32,
    /// Upper clamp bound for image resize, in pixels.
    pub max_image_width: u32,
    /// Language for code blocks created without one.
    pub default_language: CodeLanguage,
    /// Line-number gutter state for new code blocks.
    pub default_line_numbers: bool,
    /// When set, links without an explicit target open in a new tab.
    pub open_in_new_tab: bool,
    /// Protocols accepted by link validation, without the `:`.
    pub allowed_protocols: Vec<SmolStr>,
    /// Protocol prefixed onto bare hosts like `example.com`.
    pub default_protocol: SmolStr,
    /// Maximum number of undo steps kept.
    pub history_limit: usize,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            max_heading_level: 3,
            min_image_width: 100,
            max_image_width: 800,
            default_language: CodeLanguage::Plaintext,
            default_line_numbers: true,
            open_in_new_tab: true,
            allowed_protocols: DEFAULT_ALLOWED_PROTOCOLS
                .iter()
                .copied()
                .map(SmolStr::new_static)
                .collect(),
            default_protocol: SmolStr::new_static("https"),
            history_limit: 100,
        }
    }
}
