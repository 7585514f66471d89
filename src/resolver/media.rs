//! `<img>`, `<picture>`, `<video>`, `<audio>`, `<source>` and
//! `<input type="image">`.
//!
//! Lazyloading moves the real URLs to `data-*` attributes and, for images,
//! puts a placeholder in `src`: the configured `img_placeholder`, or a
//! transparent SVG with the element's own dimensions so layout does not
//! shift.

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use super::{Base, Context, Lazyable, Normalizable, Preloadable, impl_resolve, marker, url};
use crate::config::Options;
use crate::dom::{Document, NodeId};

/// Canonical lazy attributes and their third-party spellings, by priority.
const SYNONYMS: &[(&str, &[&str])] = &[
    ("data-src", &["data-lazy-src", "data-original", "data-lazy"]),
    ("data-srcset", &["data-lazy-srcset", "data-original-set"]),
    ("data-sizes", &["data-lazy-sizes"]),
];

/// Characters escaped inside a `data:image/svg+xml` URI.
const SVG_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>');

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MediaTag {
    Image,
    Picture,
    Video,
    Audio,
    Source,
}

#[derive(Debug)]
pub struct MediaResolver {
    base: Base,
    tag: MediaTag,
}

impl_resolve!(MediaResolver);

impl MediaResolver {
    pub fn new(base: Base, doc: &Document) -> Self {
        let tag = match doc.tag(base.id) {
            Some("picture") => MediaTag::Picture,
            Some("video") => MediaTag::Video,
            Some("audio") => MediaTag::Audio,
            Some("source") => MediaTag::Source,
            _ => MediaTag::Image,
        };
        Self { base, tag }
    }
}

/// Transparent SVG sized like the element, as a `data:` URI.
pub fn svg_placeholder(width: Option<&str>, height: Option<&str>) -> String {
    let mut svg = String::from("<svg xmlns='http://www.w3.org/2000/svg'");
    for (name, value) in [("width", width), ("height", height)] {
        if let Some(px) = value.and_then(leading_digits) {
            svg.push_str(&format!(" {name}='{px}'"));
        }
    }
    svg.push_str("></svg>");
    format!("data:image/svg+xml,{}", utf8_percent_encode(&svg, SVG_ESCAPE))
}

fn leading_digits(value: &str) -> Option<&str> {
    let value = value.trim();
    let end = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    (end > 0).then(|| &value[..end])
}

fn image_placeholder(cx: &Context<'_>, id: NodeId) -> String {
    let configured = cx.options.img_placeholder.trim();
    if !configured.is_empty() {
        return configured.to_string();
    }
    svg_placeholder(cx.doc.attr(id, "width"), cx.doc.attr(id, "height"))
}

fn has_value(doc: &Document, id: NodeId, name: &str) -> bool {
    doc.attr(id, name).is_some_and(|v| !v.trim().is_empty())
}

/// Mark an element for the runtime.
fn add_lazy_markers(cx: &mut Context<'_>, id: NodeId, color: bool) {
    if let Some(attrs) = cx.doc.attrs_mut(id) {
        attrs.add_class(marker::LAZY_CLASS);
        if color {
            attrs.add_class(marker::COLOR_CLASS);
        }
    }
}

/// A `<picture>`, `<video>` or `<audio>` marked no-lazy holds its children
/// back too.
fn in_nolazy_container(doc: &Document, id: NodeId) -> bool {
    doc.parent(id).is_some_and(|parent| {
        matches!(doc.tag(parent), Some("picture" | "video" | "audio"))
            && doc.has_attr(parent, marker::NOLAZY_ATTR)
    })
}

/// Move `src`/`srcset`/`sizes` of an image to their `data-*` slots.
fn lazyload_image(cx: &mut Context<'_>, id: NodeId) -> bool {
    let color = cx.options.use_color_placeholder;

    // already lazy, possibly from another library: only hand it to the runtime
    if cx.doc.has_attr(id, "data-src") || cx.doc.has_attr(id, "data-srcset") {
        if !cx.doc.has_attr(id, "src") {
            let placeholder = image_placeholder(cx, id);
            cx.doc.set_attr(id, "src", placeholder);
        }
        add_lazy_markers(cx, id, color);
        return false;
    }

    let src = cx.doc.attr(id, "src").map(str::trim).unwrap_or_default();
    let has_srcset = has_value(cx.doc, id, "srcset");
    if (src.is_empty() && !has_srcset) || url::is_inline(src) {
        return false;
    }

    let placeholder = image_placeholder(cx, id);
    let Some(attrs) = cx.doc.attrs_mut(id) else {
        return false;
    };
    if attrs.rename("src", "data-src") {
        attrs.set_after("data-src", "src", placeholder);
    } else {
        attrs.set("src", placeholder);
    }
    attrs.rename("srcset", "data-srcset");
    attrs.rename("sizes", "data-sizes");
    if !attrs.has("loading") {
        attrs.set("loading", "lazy");
    }
    add_lazy_markers(cx, id, color);
    true
}

/// `<source>` inside `<picture>`, `<video>` or `<audio>`.
fn lazyload_source(cx: &mut Context<'_>, id: NodeId) -> bool {
    let Some(attrs) = cx.doc.attrs_mut(id) else {
        return false;
    };
    let moved_srcset = attrs.rename("srcset", "data-srcset");
    let moved_src = attrs.rename("src", "data-src");
    cx.doc.mark_optimized(id);
    moved_srcset || moved_src
}

impl MediaResolver {
    fn lazyload_picture(&self, cx: &mut Context<'_>) -> bool {
        let children: Vec<NodeId> = cx.doc.child_elements(self.base.id).collect();
        let mut changed = false;
        for child in children {
            match cx.doc.tag(child) {
                Some("source") => changed |= lazyload_source(cx, child),
                // a no-lazy image is left to its own visit
                Some("img") if !cx.doc.has_attr(child, marker::NOLAZY_ATTR) => {
                    changed |= lazyload_image(cx, child);
                    cx.doc.mark_optimized(child);
                }
                _ => {}
            }
        }
        changed
    }

    fn lazyload_av(&self, cx: &mut Context<'_>) -> bool {
        let id = self.base.id;
        if cx.doc.has_attr(id, "data-src") || cx.doc.has_attr(id, "data-poster") {
            add_lazy_markers(cx, id, false);
            return false;
        }

        let mut changed = false;
        if let Some(attrs) = cx.doc.attrs_mut(id) {
            changed |= attrs.rename("src", "data-src");
            changed |= attrs.rename("poster", "data-poster");
        }
        let sources: Vec<NodeId> = cx
            .doc
            .child_elements(id)
            .filter(|&c| cx.doc.tag(c) == Some("source"))
            .collect();
        for source in sources {
            changed |= lazyload_source(cx, source);
        }
        if changed {
            cx.doc.set_attr(id, "preload", "none");
            add_lazy_markers(cx, id, false);
        }
        changed
    }
}

fn normalize_attrs(base: &mut Base, doc: &mut Document) {
    for (canonical, synonyms) in SYNONYMS {
        base.unify_synonyms(doc, canonical, synonyms);
    }
    for name in ["src", "data-src", "poster"] {
        base.canonicalize_url_attr(doc, name);
    }
}

impl Normalizable for MediaResolver {
    /// Containers normalize their `<source>`/`<img>` children too.
    fn normalize(&mut self, cx: &mut Context<'_>) {
        let id = self.base.id;
        normalize_attrs(&mut self.base, cx.doc);
        if matches!(self.tag, MediaTag::Picture | MediaTag::Video | MediaTag::Audio) {
            let children: Vec<NodeId> = cx.doc.child_elements(id).collect();
            for child in children {
                if matches!(cx.doc.tag(child), Some("source" | "img")) {
                    normalize_attrs(&mut Base::new(child), cx.doc);
                }
            }
        }
    }
}

impl Preloadable for MediaResolver {
    fn resource_url(&self, cx: &Context<'_>) -> Option<String> {
        let id = self.base.id;
        ["src", "data-src"]
            .iter()
            .filter_map(|name| cx.doc.attr(id, name))
            .map(str::trim)
            .find(|v| !v.is_empty() && !url::is_inline(v))
            .map(str::to_string)
    }
}

impl Lazyable for MediaResolver {
    fn lazy_enabled(&self, options: &Options) -> bool {
        options.optimize_images
    }

    fn lazy_url(&self, cx: &Context<'_>) -> Option<String> {
        self.resource_url(cx)
    }

    fn wants_fallback(&self) -> bool {
        self.tag != MediaTag::Source
    }

    fn lazyload(&mut self, cx: &mut Context<'_>) -> bool {
        match self.tag {
            MediaTag::Image if in_nolazy_container(cx.doc, self.base.id) => false,
            MediaTag::Image => lazyload_image(cx, self.base.id),
            MediaTag::Picture => self.lazyload_picture(cx),
            MediaTag::Video | MediaTag::Audio => self.lazyload_av(cx),
            // a lone <source> is handled by its parent
            MediaTag::Source => false,
        }
    }
}
