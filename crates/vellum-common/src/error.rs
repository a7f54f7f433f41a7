//! Error types for vellum operations.
//!
//! Commands signal rejection through their `bool` return and never produce an
//! error value. The only fallible boundary is parsing a stored document back
//! into a tree, which is what these variants describe.

use miette::Diagnostic;
use smol_str::SmolStr;

/// Main error type for vellum operations.
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum VellumError {
    /// Element tag with no registered node schema
    #[error("unknown element tag: <{0}>")]
    #[diagnostic(code(vellum::parse::unknown_tag))]
    UnknownTag(SmolStr),

    /// Required attribute missing from a serialized element
    #[error("missing required attribute `{attr}` on <{tag}>")]
    #[diagnostic(
        code(vellum::parse::missing_attr),
        help("documents stored before the attribute existed may need migration")
    )]
    MissingAttr { tag: SmolStr, attr: &'static str },

    /// Attribute present but unparseable
    #[error("invalid value for `{attr}` on <{tag}>: {value:?}")]
    #[diagnostic(code(vellum::parse::invalid_attr))]
    InvalidAttr {
        tag: SmolStr,
        attr: &'static str,
        value: String,
    },

    /// Serialized element in a position its kind does not allow
    #[error("unexpected <{tag}> inside <{parent}>")]
    #[diagnostic(code(vellum::parse::structure))]
    BadStructure { parent: SmolStr, tag: SmolStr },

    /// Code block element without its nested code element
    #[error("code block <pre> is missing its <code> child")]
    #[diagnostic(code(vellum::parse::structure))]
    MissingCodeChild,

    /// Malformed stored JSON
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VellumError::UnknownTag(SmolStr::new("marquee"));
        assert_eq!(err.to_string(), "unknown element tag: <marquee>");

        let err = VellumError::MissingAttr {
            tag: SmolStr::new("img"),
            attr: "src",
        };
        assert_eq!(err.to_string(), "missing required attribute `src` on <img>");
    }

    #[test]
    fn test_json_error_wraps() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{nope").unwrap_err();
        let err = VellumError::from(parse_err);
        assert!(matches!(err, VellumError::Json(_)));
    }
}
