//! BiDi `UrlPattern` matching (§6).
//!
//! Two wire shapes exist: a `"string"` pattern matched against the exact
//! normalised URL, and a `"pattern"` form matched component-by-component.
//! Scheme and host compare case-insensitively; everything else is
//! case-sensitive. An absent component matches anything.

use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum UrlPattern {
    String { pattern: String },
    Pattern {
        #[serde(skip_serializing_if = "Option::is_none")]
        protocol: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        hostname: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        port: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pathname: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        search: Option<String>,
    },
}

impl UrlPattern {
    /// §4.4: an empty pattern list matches every request.
    pub fn matches_any(patterns: &[UrlPattern], url: &str) -> bool {
        patterns.is_empty() || patterns.iter().any(|p| p.matches(url))
    }

    pub fn matches(&self, url: &str) -> bool {
        match self {
            UrlPattern::String { pattern } => normalise(pattern)
                .zip(normalise(url))
                .map(|(a, b)| a == b)
                .unwrap_or(false),
            UrlPattern::Pattern {
                protocol,
                hostname,
                port,
                pathname,
                search,
            } => {
                let Ok(parsed) = Url::parse(url) else {
                    return false;
                };
                component_matches(protocol.as_deref(), parsed.scheme(), true)
                    && component_matches(hostname.as_deref(), parsed.host_str().unwrap_or(""), true)
                    && component_matches(port.as_deref(), &port_of(&parsed), false)
                    && component_matches(pathname.as_deref(), parsed.path(), false)
                    && component_matches(
                        search.as_deref(),
                        parsed.query().unwrap_or(""),
                        false,
                    )
            }
        }
    }
}

fn port_of(url: &Url) -> String {
    url.port()
        .map(|p| p.to_string())
        .unwrap_or_else(|| url.port_or_known_default().map(|p| p.to_string()).unwrap_or_default())
}

fn component_matches(pattern: Option<&str>, actual: &str, case_insensitive: bool) -> bool {
    match pattern {
        None => true,
        Some(p) if case_insensitive => p.eq_ignore_ascii_case(actual),
        Some(p) => p == actual,
    }
}

fn normalise(url: &str) -> Option<String> {
    Url::parse(url).ok().map(|u| u.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_pattern_list_matches_all() {
        assert!(UrlPattern::matches_any(&[], "http://example.com/"));
    }

    #[test]
    fn string_pattern_matches_after_normalisation() {
        let p = UrlPattern::String {
            pattern: "http://example.com".into(),
        };
        assert!(p.matches("http://example.com/"));
    }

    #[test]
    fn pattern_form_is_case_insensitive_for_scheme_and_host() {
        let p = UrlPattern::Pattern {
            protocol: Some("HTTP".into()),
            hostname: Some("Example.COM".into()),
            port: None,
            pathname: None,
            search: None,
        };
        assert!(p.matches("http://example.com/path"));
    }

    #[test]
    fn pattern_form_is_case_sensitive_for_path() {
        let p = UrlPattern::Pattern {
            protocol: None,
            hostname: None,
            port: None,
            pathname: Some("/Foo".into()),
            search: None,
        };
        assert!(!p.matches("http://example.com/foo"));
        assert!(p.matches("http://example.com/Foo"));
    }

    #[test]
    fn absent_components_match_anything() {
        let p = UrlPattern::Pattern {
            protocol: None,
            hostname: None,
            port: None,
            pathname: None,
            search: None,
        };
        assert!(p.matches("https://anything.example/whatever?x=1"));
    }
}
