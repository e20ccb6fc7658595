//! Canonical payload construction for signed login links.
//!
//! The signed payload of a link is its path followed by its query parameters,
//! in the order they appear, excluding `signature`:
//!
//! ```text
//! CanonicalPath?key1=value1&key2=value2...
//! ```
//!
//! Path segments, keys, and values are percent-decoded and re-encoded with the
//! RFC 3986 unreserved set, so the payload does not depend on how a client
//! chose to escape the URL. Parameter order is significant.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

/// Characters left unescaped in canonical components: `A-Z a-z 0-9 - _ . ~`.
const COMPONENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Escape set for the principal path segment.
///
/// Dots are escaped too, so identifiers such as `..` can't be normalized away
/// by clients into a different route.
const SEGMENT_ENCODE_SET: &AsciiSet = &COMPONENT_ENCODE_SET.add(b'.');

/// Build the canonical payload for a path and its ordered query parameters.
///
/// # Examples
///
/// ```
/// use passlink_auth::canonical::canonicalize;
///
/// let params = vec![("expires".to_owned(), "1700000000".to_owned())];
/// let payload = canonicalize("/magic-login/42", &params);
/// assert_eq!(payload, b"/magic-login/42?expires=1700000000");
/// ```
#[must_use]
pub fn canonicalize(path: &str, params: &[(String, String)]) -> Vec<u8> {
    let canonical_path = build_canonical_path(path);
    let canonical_query = build_query_string(params);
    format!("{canonical_path}?{canonical_query}").into_bytes()
}

/// Build the canonical path by re-encoding each segment individually.
///
/// Forward slashes are preserved. Empty paths are normalized to `/`.
///
/// # Examples
///
/// ```
/// use passlink_auth::canonical::build_canonical_path;
///
/// assert_eq!(build_canonical_path("/magic-login/42"), "/magic-login/42");
/// assert_eq!(build_canonical_path("/a%20b"), build_canonical_path("/a b"));
/// assert_eq!(build_canonical_path(""), "/");
/// ```
#[must_use]
pub fn build_canonical_path(path: &str) -> String {
    if path.is_empty() || path == "/" {
        return "/".to_owned();
    }

    path.split('/')
        .map(|segment| encode_component(&decode_component(segment)))
        .collect::<Vec<_>>()
        .join("/")
}

/// Serialize ordered parameters as `k=v` pairs joined with `&`.
///
/// This is both the canonical query form and the query string placed on
/// generated links.
///
/// # Examples
///
/// ```
/// use passlink_auth::canonical::build_query_string;
///
/// let params = vec![
///     ("expires".to_owned(), "10".to_owned()),
///     ("redirect_to".to_owned(), "/a b".to_owned()),
/// ];
/// assert_eq!(build_query_string(&params), "expires=10&redirect_to=%2Fa%20b");
/// ```
#[must_use]
pub fn build_query_string(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", encode_component(k), encode_component(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Parse a raw query string into decoded `(key, value)` pairs, preserving order
/// and duplicates.
///
/// # Examples
///
/// ```
/// use passlink_auth::canonical::parse_query;
///
/// let pairs = parse_query("expires=10&redirect_to=%2Fhome&expires=11");
/// assert_eq!(pairs[1], ("redirect_to".to_owned(), "/home".to_owned()));
/// assert_eq!(pairs.len(), 3);
/// ```
#[must_use]
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Percent-encode a principal identifier as a single path segment.
///
/// # Examples
///
/// ```
/// use passlink_auth::canonical::encode_path_segment;
///
/// assert_eq!(encode_path_segment("42"), "42");
/// assert_eq!(encode_path_segment("../admin"), "%2E%2E%2Fadmin");
/// ```
#[must_use]
pub fn encode_path_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT_ENCODE_SET).to_string()
}

/// Percent-encode each segment of a configured route prefix such as
/// `/auth/magic-login`, leaving the `/` separators intact.
#[must_use]
pub fn encode_route_prefix(prefix: &str) -> String {
    prefix
        .split('/')
        .map(encode_component)
        .collect::<Vec<_>>()
        .join("/")
}

/// Percent-decode a single path segment or query component.
#[must_use]
pub fn decode_component(input: &str) -> String {
    percent_decode_str(input).decode_utf8_lossy().into_owned()
}

/// Percent-encode a component with the unreserved set.
fn encode_component(input: &str) -> String {
    utf8_percent_encode(input, COMPONENT_ENCODE_SET).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_should_canonicalize_path_and_params_in_order() {
        let params = pairs(&[
            ("expires", "1700000000"),
            ("team", "blue"),
            ("redirect_to", "/home"),
        ]);
        let payload = canonicalize("/magic-login/7", &params);
        assert_eq!(
            payload,
            b"/magic-login/7?expires=1700000000&team=blue&redirect_to=%2Fhome"
        );
    }

    #[test]
    fn test_should_be_sensitive_to_parameter_order() {
        let forward = pairs(&[("a", "1"), ("b", "2")]);
        let reversed = pairs(&[("b", "2"), ("a", "1")]);
        assert_ne!(
            canonicalize("/magic-login/7", &forward),
            canonicalize("/magic-login/7", &reversed)
        );
    }

    #[test]
    fn test_should_bind_payload_to_principal_path() {
        let params = pairs(&[("expires", "1")]);
        assert_ne!(
            canonicalize("/magic-login/7", &params),
            canonicalize("/magic-login/8", &params)
        );
    }

    #[test]
    fn test_should_canonicalize_empty_params() {
        assert_eq!(canonicalize("/magic-login/7", &[]), b"/magic-login/7?");
    }

    #[test]
    fn test_should_normalize_path_encoding() {
        assert_eq!(build_canonical_path("/a%20b/c"), "/a%20b/c");
        assert_eq!(build_canonical_path("/a b/c"), "/a%20b/c");
        assert_eq!(build_canonical_path("/%2E%2E"), "/..");
    }

    #[test]
    fn test_should_encode_reserved_characters_in_query() {
        let params = pairs(&[("next", "/a?b=c&d"), ("name", "Donald O'Duck")]);
        assert_eq!(
            build_query_string(&params),
            "next=%2Fa%3Fb%3Dc%26d&name=Donald%20O%27Duck"
        );
    }

    #[test]
    fn test_should_round_trip_query_through_parser() {
        let params = pairs(&[("next", "/a?b=c&d"), ("plus", "1+1"), ("empty", "")]);
        let query = build_query_string(&params);
        assert_eq!(parse_query(&query), params);
    }

    #[test]
    fn test_should_parse_query_preserving_duplicates() {
        let parsed = parse_query("redirect_to=%2Fa&signature=abc&redirect_to=%2Fb");
        assert_eq!(
            parsed,
            pairs(&[("redirect_to", "/a"), ("signature", "abc"), ("redirect_to", "/b")])
        );
    }

    #[test]
    fn test_should_parse_empty_query() {
        assert!(parse_query("").is_empty());
    }

    #[test]
    fn test_should_escape_traversal_in_path_segment() {
        assert_eq!(encode_path_segment(".."), "%2E%2E");
        assert_eq!(encode_path_segment("a/b"), "a%2Fb");
        assert_eq!(encode_path_segment("a?b#c"), "a%3Fb%23c");
        assert_eq!(encode_path_segment("user@example.com"), "user%40example%2Ecom");
    }

    #[test]
    fn test_should_encode_route_prefix_segments() {
        assert_eq!(encode_route_prefix("/auth/magic-login"), "/auth/magic-login");
        assert_eq!(encode_route_prefix("/my app/log in"), "/my%20app/log%20in");
        assert_eq!(encode_route_prefix("/100%/entrée"), "/100%25/entr%C3%A9e");
    }

    #[test]
    fn test_should_decode_component() {
        assert_eq!(decode_component("user%40example%2Ecom"), "user@example.com");
        assert_eq!(decode_component("plain"), "plain");
    }
}
