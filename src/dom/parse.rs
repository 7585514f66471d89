//! HTML parsing through `tl`, converted into the mutable arena.
//!
//! `tl` gives a read-only tree; we copy it node by node. Before parsing, the
//! bodies of raw text elements (`script`, `style`, `textarea`) are swapped for
//! private-use placeholders so markup-looking content inside them can never be
//! mistaken for tags. The placeholders are put back after conversion.

use super::{Attrs, Document, DomError, NodeData, NodeId};
use crate::utils::html::unescape;

const RAW_TEXT_TAGS: [&str; 3] = ["script", "style", "textarea"];
const MARK_OPEN: char = '\u{E000}';
const MARK_CLOSE: char = '\u{E001}';

/// Parse a full HTML document.
///
/// Fails when no `<html>` element can be found at the top level.
pub fn parse_document(source: &str) -> Result<Document, DomError> {
    let (doctype, rest) = split_doctype(source);
    let (protected, stash) = protect_raw_text(rest);

    let dom = tl::parse(&protected, tl::ParserOptions::default())
        .map_err(|e| DomError::Parse(format!("{e:?}")))?;
    let parser = dom.parser();

    let mut doc = Document::new();
    doc.doctype = doctype.map(str::to_string);
    doc.bolt_marker = has_bolt_marker(rest);

    for handle in dom.children() {
        convert(&mut doc, NodeId::ROOT, *handle, parser, &stash);
    }

    let has_html = doc
        .children(NodeId::ROOT)
        .iter()
        .any(|&c| doc.tag(c) == Some("html"));
    if !has_html {
        return Err(DomError::NotADocument);
    }

    Ok(doc)
}

/// Split a leading `<!DOCTYPE ...>` off the source.
fn split_doctype(source: &str) -> (Option<&str>, &str) {
    let trimmed = source.trim_start();
    let is_doctype = trimmed
        .get(..9)
        .is_some_and(|p| p.eq_ignore_ascii_case("<!doctype"));
    if !is_doctype {
        return (None, source);
    }
    match trimmed.find('>') {
        Some(end) => (Some(&trimmed[..=end]), &trimmed[end + 1..]),
        None => (None, source),
    }
}

/// Check whether the opening `<html ...>` tag carries the `⚡` AMP marker.
fn has_bolt_marker(source: &str) -> bool {
    let lower = source.to_ascii_lowercase();
    let Some(start) = lower.find("<html") else {
        return false;
    };
    source[start..]
        .find('>')
        .is_some_and(|end| source[start..start + end].contains('\u{26A1}'))
}

// =============================================================================
// Raw text protection
// =============================================================================

/// Replace the content of raw text elements with `MARK_OPEN index MARK_CLOSE`.
fn protect_raw_text(source: &str) -> (String, Vec<String>) {
    let lower = source.to_ascii_lowercase();
    let mut out = String::with_capacity(source.len());
    let mut stash = Vec::new();
    let mut cursor = 0;

    while let Some((tag, open_start)) = next_raw_open(&lower, cursor) {
        let Some(open_end) = lower[open_start..].find('>').map(|i| open_start + i + 1) else {
            break;
        };
        let close_pat = format!("</{tag}");
        let Some(close_start) = lower[open_end..].find(&close_pat).map(|i| open_end + i) else {
            break;
        };

        out.push_str(&source[cursor..open_end]);
        let body = &source[open_end..close_start];
        if !body.is_empty() {
            out.push(MARK_OPEN);
            out.push_str(&stash.len().to_string());
            out.push(MARK_CLOSE);
            stash.push(body.to_string());
        }
        cursor = close_start;
    }
    out.push_str(&source[cursor..]);

    (out, stash)
}

/// Find the earliest `<script`, `<style` or `<textarea` open tag at or after `from`.
fn next_raw_open(lower: &str, from: usize) -> Option<(&'static str, usize)> {
    RAW_TEXT_TAGS
        .iter()
        .filter_map(|&tag| {
            let pat = format!("<{tag}");
            let mut search = from;
            // Skip prefixes such as `<scripts>` or `<style-guide>`.
            while let Some(i) = lower[search..].find(&pat) {
                let at = search + i;
                let next = lower.as_bytes().get(at + pat.len()).copied();
                if matches!(next, Some(b'>' | b'/' | b' ' | b'\t' | b'\n' | b'\r' | b'\x0c')) {
                    return Some((tag, at));
                }
                search = at + pat.len();
            }
            None
        })
        .min_by_key(|&(_, at)| at)
}

/// Put stashed raw text back in place of its placeholders.
fn restore(text: &str, stash: &[String]) -> String {
    if !text.contains(MARK_OPEN) {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(MARK_OPEN) {
        out.push_str(&rest[..start]);
        let after = &rest[start + MARK_OPEN.len_utf8()..];
        let Some(end) = after.find(MARK_CLOSE) else {
            out.push_str(&rest[start..]);
            return out;
        };
        match after[..end].parse::<usize>().ok().and_then(|i| stash.get(i)) {
            Some(body) => out.push_str(body),
            None => out.push_str(&rest[start..start + MARK_OPEN.len_utf8() + end + MARK_CLOSE.len_utf8()]),
        }
        rest = &after[end + MARK_CLOSE.len_utf8()..];
    }
    out.push_str(rest);
    out
}

// =============================================================================
// tl conversion
// =============================================================================

fn convert(
    doc: &mut Document,
    parent: NodeId,
    handle: tl::NodeHandle,
    parser: &tl::Parser,
    stash: &[String],
) {
    let Some(node) = handle.get(parser) else {
        return;
    };

    match node {
        tl::Node::Tag(tag) => {
            let tag_name = tag.name().as_utf8_str().to_ascii_lowercase();

            let attrs = read_attrs(tag, stash);

            let elem = doc.create_element_with(&tag_name, attrs);
            doc.append_child(parent, elem);

            for child in tag.children().top().iter() {
                convert(doc, elem, *child, parser, stash);
            }
        }
        tl::Node::Raw(bytes) => {
            let text = restore(&bytes.as_utf8_str(), stash);
            if text.is_empty() {
                return;
            }
            // Merge adjacent text produced by placeholder boundaries.
            let last = doc.children(parent).last().copied();
            if let Some(last) = last
                && let NodeData::Text(prev) = doc.data_mut(last)
            {
                prev.push_str(&text);
                return;
            }
            let node = doc.create_text(text);
            doc.append_child(parent, node);
        }
        tl::Node::Comment(bytes) => {
            let raw = restore(&bytes.as_utf8_str(), stash);
            let inner = raw
                .strip_prefix("<!--")
                .map(|s| s.strip_suffix("-->").unwrap_or(s))
                .unwrap_or(&raw);
            let node = doc.create_comment(inner);
            doc.append_child(parent, node);
        }
    }
}

/// Attributes in source order.
///
/// `tl` keeps attributes in a hash map once a tag has more than a couple, so
/// the opening tag is re-read from the raw markup. The `tl` view is only used
/// when the raw tag cannot be read.
fn read_attrs(tag: &tl::HTMLTag<'_>, stash: &[String]) -> Attrs {
    let raw = tag.raw().as_utf8_str();
    let pairs = parse_open_tag(&raw).unwrap_or_else(|| {
        tag.attributes()
            .iter()
            .map(|(key, value)| {
                let key_str: &str = key.as_ref();
                (key_str.to_string(), value.map(|v| v.to_string()).unwrap_or_default())
            })
            .collect()
    });

    pairs
        .into_iter()
        .map(|(k, v)| (k, unescape(&restore(&v, stash)).into_owned()))
        .collect()
}

/// Read the attribute list of an opening tag such as `<img src="a" alt=b hidden>`.
///
/// Returns `None` when the tag is not terminated by `>`.
fn parse_open_tag(raw: &str) -> Option<Vec<(String, String)>> {
    let rest = raw.strip_prefix('<')?;
    let name_end = rest.find(|c: char| c.is_ascii_whitespace() || c == '>' || c == '/')?;
    let mut chars = rest[name_end..].chars().peekable();
    let mut attrs = Vec::new();

    loop {
        while chars.peek().is_some_and(|c| c.is_ascii_whitespace() || *c == '/') {
            chars.next();
        }
        match chars.peek() {
            None => return None,
            Some('>') => return Some(attrs),
            _ => {}
        }

        let mut name = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_ascii_whitespace() || c == '=' || c == '>' || (c == '/' && !name.is_empty()) {
                break;
            }
            name.push(c);
            chars.next();
        }

        while chars.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            chars.next();
        }

        if chars.peek() != Some(&'=') {
            attrs.push((name, String::new()));
            continue;
        }
        chars.next();
        while chars.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            chars.next();
        }

        let mut value = String::new();
        match chars.peek().copied() {
            Some(quote @ ('"' | '\'')) => {
                chars.next();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == quote {
                        closed = true;
                        break;
                    }
                    value.push(c);
                }
                if !closed {
                    return None;
                }
            }
            _ => {
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_whitespace() || c == '>' {
                        break;
                    }
                    value.push(c);
                    chars.next();
                }
            }
        }
        attrs.push((name, value));
    }
}
