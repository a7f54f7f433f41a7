//! URL validation and sanitization for link attributes.
//!
//! Validation decides whether an href may be stored at all; sanitization
//! normalizes user input (bare domains, email addresses, phone numbers) into
//! a usable href. Both operate on the string level only - no network, no
//! punycode, no full RFC 3986 parse.

use std::sync::OnceLock;

use regex::Regex;
use smol_str::{SmolStr, format_smolstr};

/// Protocols accepted by default when validating an explicit-protocol URL.
pub const DEFAULT_ALLOWED_PROTOCOLS: &[&str] = &["https", "http", "mailto", "tel"];

/// Protocols rejected no matter what the allow-list says.
const BLOCKED_PROTOCOLS: &[&str] = &["javascript:", "data:"];

fn email_pattern() -> &'static Regex {
    static RE_EMAIL: OnceLock<Regex> = OnceLock::new();
    RE_EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap())
}

fn phone_pattern() -> &'static Regex {
    static RE_PHONE: OnceLock<Regex> = OnceLock::new();
    RE_PHONE.get_or_init(|| Regex::new(r"^\+?[\d\s\-().]+$").unwrap())
}

/// Case-insensitive ASCII prefix test.
fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    s.len() >= prefix.len() && s.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

/// Check for script-injection protocols. These are rejected in any casing,
/// even when the caller's allow-list would otherwise permit them.
pub fn has_blocked_protocol(url: &str) -> bool {
    BLOCKED_PROTOCOLS
        .iter()
        .any(|blocked| starts_with_ignore_case(url, blocked))
}

/// Extract the protocol of `url`, if it has one.
///
/// A protocol is an RFC 3986 scheme: a leading ASCII letter followed by
/// letters, digits, `+`, `-`, or `.`, terminated by a colon. Returns the
/// scheme without the colon.
fn split_protocol(url: &str) -> Option<&str> {
    let colon = url.find(':')?;
    let scheme = &url[..colon];
    let mut chars = scheme.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    if chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
        Some(scheme)
    } else {
        None
    }
}

fn is_email(url: &str) -> bool {
    email_pattern().is_match(url)
}

fn is_phone(url: &str) -> bool {
    // Only digits and common separators, with enough digits to be a number.
    phone_pattern().is_match(url) && url.chars().filter(char::is_ascii_digit).count() >= 6
}

/// Check whether a URL is acceptable as a link href.
///
/// Rules, in order:
/// - empty input is invalid
/// - `javascript:` and `data:` prefixes are invalid in any casing, even when
///   the allow-list is permissive
/// - a same-page anchor (`#section`) is valid
/// - a relative path (`/docs`, but not the protocol-relative `//host`) is valid
/// - an explicit protocol must appear in `allowed_protocols`
/// - a bare string with no protocol (`example.com`) is valid; prefixing is
///   deferred to [`sanitize_url`]
pub fn is_valid_url<S: AsRef<str>>(url: &str, allowed_protocols: &[S]) -> bool {
    let url = url.trim();
    if url.is_empty() {
        return false;
    }
    if has_blocked_protocol(url) {
        return false;
    }
    if url.starts_with('#') {
        return true;
    }
    if url.starts_with("//") {
        return false;
    }
    if url.starts_with('/') {
        return true;
    }
    match split_protocol(url) {
        Some(protocol) => allowed_protocols
            .iter()
            .any(|allowed| allowed.as_ref().eq_ignore_ascii_case(protocol)),
        None => true,
    }
}

/// Normalize user input into a usable href.
///
/// - an email-shaped string gains a `mailto:` prefix
/// - a phone-shaped string is stripped of separators and gains a `tel:` prefix
/// - relative paths and anchors pass through unchanged
/// - anything else without a protocol gains `{default_protocol}://`
/// - everything else passes through unchanged
///
/// Email and phone detection run before the generic prefixing step, so
/// `user@example.com` becomes a mailto link rather than
/// `https://user@example.com`. The function is idempotent: applying it to its
/// own output changes nothing.
pub fn sanitize_url(url: &str, default_protocol: &str) -> SmolStr {
    let url = url.trim();
    if url.is_empty() {
        return SmolStr::default();
    }
    if url.starts_with('#') || url.starts_with('/') {
        return url.into();
    }
    if split_protocol(url).is_none() {
        if is_email(url) {
            return format_smolstr!("mailto:{url}");
        }
        if is_phone(url) {
            let mut digits = String::with_capacity(url.len());
            for (i, ch) in url.chars().enumerate() {
                if ch.is_ascii_digit() || (i == 0 && ch == '+') {
                    digits.push(ch);
                }
            }
            return format_smolstr!("tel:{digits}");
        }
        return format_smolstr!("{default_protocol}://{url}");
    }
    url.into()
}
