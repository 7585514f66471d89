//! HTML text helpers shared by the parser, serializer and resolvers.
//!
//! - `escape_attr()` / `unescape()` - attribute value entity handling
//! - `escape_comment()` - make arbitrary markup safe inside `<!-- -->`
//! - element tables: void, raw text, whitespace sensitive, block level

use std::borrow::Cow;

// =============================================================================
// Entities
// =============================================================================

/// Escape an attribute value for a double-quoted attribute.
///
/// Only `&` and `"` are significant inside a quoted value, so nothing else is
/// touched. Uses `Cow` to avoid allocation when no escaping is needed.
#[inline]
pub fn escape_attr(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '"']) {
        return Cow::Borrowed(s);
    }

    let mut result = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            _ => result.push(c),
        }
    }
    Cow::Owned(result)
}

/// Decode HTML entities in an attribute value.
///
/// Handles the common named entities and numeric character references.
/// Unknown entities are kept verbatim.
pub fn unescape(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }

    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(pos) = rest.find('&') {
        result.push_str(&rest[..pos]);
        let tail = &rest[pos + 1..];

        let decoded = tail
            .find(';')
            .filter(|&end| end > 0 && end <= 10)
            .and_then(|end| decode_entity(&tail[..end]).map(|c| (c, end)));

        match decoded {
            Some((c, end)) => {
                result.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                result.push('&');
                rest = tail;
            }
        }
    }
    result.push_str(rest);

    Cow::Owned(result)
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{00A0}'),
        s => {
            let num = s.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => num.parse().ok(),
            };
            code.and_then(char::from_u32)
        }
    }
}

/// Make text safe to embed in an HTML comment.
///
/// A comment ends at the first `--`, so every double dash is split.
pub fn escape_comment(s: &str) -> Cow<'_, str> {
    if !s.contains("--") {
        return Cow::Borrowed(s);
    }
    let mut out = s.replace("--", "- -");
    // "---" becomes "- --" after one pass
    while out.contains("--") {
        out = out.replace("--", "- -");
    }
    Cow::Owned(out)
}

// =============================================================================
// Element Tables
// =============================================================================

/// Void elements never have children or a closing tag.
#[inline]
pub fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Raw text elements: content is emitted without any escaping.
#[inline]
pub fn is_raw_text_element(tag: &str) -> bool {
    matches!(tag, "script" | "style")
}

/// Elements whose text content must keep its exact whitespace.
#[inline]
pub fn is_whitespace_sensitive(tag: &str) -> bool {
    matches!(tag, "script" | "style" | "pre" | "textarea" | "code")
}

/// Block-level elements: whitespace between them carries no word boundary.
#[inline]
pub fn is_block_element(tag: &str) -> bool {
    matches!(
        tag,
        "html"
            | "head"
            | "body"
            | "title"
            | "meta"
            | "link"
            | "script"
            | "style"
            | "noscript"
            | "address"
            | "article"
            | "aside"
            | "blockquote"
            | "dd"
            | "div"
            | "dl"
            | "dt"
            | "fieldset"
            | "figcaption"
            | "figure"
            | "footer"
            | "form"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "header"
            | "hr"
            | "li"
            | "main"
            | "nav"
            | "ol"
            | "p"
            | "pre"
            | "section"
            | "table"
            | "tbody"
            | "thead"
            | "tfoot"
            | "tr"
            | "td"
            | "th"
            | "ul"
    )
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_attr() {
        assert_eq!(escape_attr("normal"), "normal");
        assert_eq!(escape_attr("a\"b&c"), "a&quot;b&amp;c");
        assert_eq!(escape_attr("it's <ok>"), "it's <ok>");
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape("hello"), "hello");
        assert_eq!(unescape("&lt;script&gt;"), "<script>");
        assert_eq!(unescape("a &amp; b"), "a & b");
        assert_eq!(unescape("&quot;hi&quot;"), "\"hi\"");
        assert_eq!(unescape("&#39;&#x27;&#65;"), "''A");
        assert_eq!(unescape("&nbsp;"), "\u{00A0}");
    }

    #[test]
    fn test_unescape_keeps_unknown() {
        assert_eq!(unescape("a&b"), "a&b");
        assert_eq!(unescape("&bogus;"), "&bogus;");
        assert_eq!(unescape("?a=1&amp;b=2"), "?a=1&b=2");
    }

    #[test]
    fn test_escape_comment() {
        assert_eq!(escape_comment("<img>"), "<img>");
        assert!(!escape_comment("a--b---c").contains("--"));
    }

    #[test]
    fn test_element_tables() {
        assert!(is_void_element("img"));
        assert!(!is_void_element("div"));
        assert!(is_raw_text_element("script"));
        assert!(!is_raw_text_element("pre"));
        assert!(is_whitespace_sensitive("pre"));
        assert!(is_whitespace_sensitive("textarea"));
        assert!(!is_whitespace_sensitive("p"));
        assert!(is_block_element("div"));
        assert!(!is_block_element("span"));
    }
}
