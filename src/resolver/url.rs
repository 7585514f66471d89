//! Resource URL helpers.

use std::borrow::Cow;

use url::Url;

/// Rewrite a protocol-relative URL (`//host/path`) to `https:`.
pub fn canonical_protocol(value: &str) -> Cow<'_, str> {
    let trimmed = value.trim();
    match trimmed.strip_prefix("//") {
        Some(rest) if !rest.starts_with('/') && !rest.is_empty() => {
            Cow::Owned(format!("https://{rest}"))
        }
        _ => Cow::Borrowed(value),
    }
}

/// Parse an absolute http(s) URL; relative and non-web URLs are `None`.
pub fn parse_web(value: &str) -> Option<Url> {
    let value = canonical_protocol(value);
    let url = Url::parse(value.trim()).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

/// `scheme://host[:port]` of an absolute web URL.
pub fn origin(value: &str) -> Option<String> {
    let url = parse_web(value)?;
    url.host_str()?;
    Some(url.origin().ascii_serialization())
}

/// Lowercased host of an absolute web URL.
pub fn host(value: &str) -> Option<String> {
    parse_web(value)?.host_str().map(str::to_ascii_lowercase)
}

/// True when `value` points at a host other than `site_host`.
///
/// With no site host every absolute URL counts as external.
pub fn is_external(value: &str, site_host: &str) -> bool {
    let Some(host) = host(value) else {
        return false;
    };
    let site = site_host.trim().to_ascii_lowercase();
    site.is_empty() || strip_www(&host) != strip_www(&site)
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// URLs that never hit the network and are never lazyloaded.
pub fn is_inline(value: &str) -> bool {
    let lower = value.trim_start().get(..11).unwrap_or(value).to_ascii_lowercase();
    lower.starts_with("data:")
        || lower.starts_with("blob:")
        || lower.starts_with("javascript:")
        || lower.starts_with("about:")
}

/// First `url(...)` reference in a declaration list.
pub fn first_css_url(css: &str) -> Option<&str> {
    let lower = css.to_ascii_lowercase();
    let start = lower.find("url(")? + 4;
    let end = start + css[start..].find(')')?;
    let inner = css[start..end].trim().trim_matches(['"', '\'']);
    (!inner.is_empty()).then_some(inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_protocol() {
        assert_eq!(canonical_protocol("//cdn.test/a.js"), "https://cdn.test/a.js");
        assert_eq!(canonical_protocol("/a.js"), "/a.js");
        assert_eq!(canonical_protocol("///a.js"), "///a.js");
        assert_eq!(canonical_protocol("http://x.test/"), "http://x.test/");
    }

    #[test]
    fn test_origin_and_host() {
        assert_eq!(
            origin("//cdn.example.com/x.js").as_deref(),
            Some("https://cdn.example.com")
        );
        assert_eq!(
            origin("http://a.test:8080/p?q").as_deref(),
            Some("http://a.test:8080")
        );
        assert_eq!(origin("/relative.js"), None);
        assert_eq!(origin("mailto:a@b.test"), None);
        assert_eq!(host("https://CDN.Test/x").as_deref(), Some("cdn.test"));
    }

    #[test]
    fn test_is_external() {
        assert!(is_external("https://cdn.test/x.js", ""));
        assert!(is_external("https://cdn.test/x.js", "site.test"));
        assert!(!is_external("https://www.site.test/x.js", "site.test"));
        assert!(!is_external("/x.js", "site.test"));
    }

    #[test]
    fn test_is_inline() {
        assert!(is_inline("data:image/png;base64,AAAA"));
        assert!(is_inline("about:blank"));
        assert!(!is_inline("a.jpg"));
        assert!(!is_inline("d"));
    }

    #[test]
    fn test_first_css_url() {
        assert_eq!(first_css_url("background: URL('a.png') no-repeat"), Some("a.png"));
        assert_eq!(first_css_url("color: red"), None);
    }
}
