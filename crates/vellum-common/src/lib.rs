//! vellum-common: shared types and utilities for the vellum editor stack.

pub mod error;
pub mod url;

pub use error::VellumError;
pub use url::{DEFAULT_ALLOWED_PROTOCOLS, has_blocked_protocol, is_valid_url, sanitize_url};
