//! `<link>`: resource hints, stylesheets and everything else.
//!
//! Hints are deduplicated and gathered right before `<title>`. Stylesheets
//! move to the end of `<head>`; third-party ones load as `media="print"` and
//! switch to their real media once fetched.

use super::{
    Base, Context, Lazyable, Normalizable, Preloadable, Reorderable, impl_resolve, marker, url,
};
use crate::config::Options;
use crate::dom::{Document, NodeId};
use crate::optimizer::is_hint_rel;

/// Restores the media saved in `data-media` once the sheet has loaded.
const RESTORE_MEDIA: &str = "this.media=this.getAttribute('data-media')||'all'";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Hint,
    Stylesheet,
    Other,
}

#[derive(Debug)]
pub struct LinkResolver {
    base: Base,
    kind: LinkKind,
}

impl_resolve!(LinkResolver);

impl LinkResolver {
    pub fn new(base: Base, doc: &Document) -> Self {
        let kind = link_kind(doc, base.id);
        Self { base, kind }
    }

    pub fn kind(&self) -> LinkKind {
        self.kind
    }

    /// The `<noscript>` right after a sheet marked as having a fallback.
    fn trailing_fallback(&self, doc: &Document) -> Option<NodeId> {
        let id = self.base.id;
        let has_fallback = doc
            .element(id)
            .is_some_and(|e| e.attrs.has_class(marker::FALLBACK_CLASS));
        if !has_fallback {
            return None;
        }
        doc.next_sibling(id)
            .filter(|&next| doc.tag(next) == Some("noscript"))
    }

    fn href<'d>(&self, doc: &'d Document) -> Option<&'d str> {
        doc.attr(self.base.id, "href")
            .map(str::trim)
            .filter(|h| !h.is_empty())
    }
}

pub fn link_kind(doc: &Document, id: NodeId) -> LinkKind {
    let rel = doc.attr(id, "rel").unwrap_or_default();
    if is_hint_rel(rel) {
        LinkKind::Hint
    } else if rel
        .split_ascii_whitespace()
        .any(|t| t.eq_ignore_ascii_case("stylesheet"))
    {
        LinkKind::Stylesheet
    } else {
        LinkKind::Other
    }
}

impl Normalizable for LinkResolver {
    fn normalize(&mut self, cx: &mut Context<'_>) {
        let id = self.base.id;
        self.base.canonicalize_url_attr(cx.doc, "href");

        if let Some(rel) = cx.doc.attr(id, "rel") {
            let lower = rel.trim().to_ascii_lowercase();
            if lower != rel {
                cx.doc.set_attr(id, "rel", lower);
            }
        }

        if self.kind == LinkKind::Stylesheet {
            if cx
                .doc
                .attr(id, "type")
                .is_some_and(|t| t.trim().eq_ignore_ascii_case("text/css"))
            {
                cx.doc.remove_attr(id, "type");
            }
            if cx
                .doc
                .attr(id, "media")
                .is_some_and(|m| m.trim().eq_ignore_ascii_case("all"))
            {
                cx.doc.remove_attr(id, "media");
            }
        }
    }
}

impl Reorderable for LinkResolver {
    fn reposition(&mut self, cx: &mut Context<'_>) {
        let id = self.base.id;
        match self.kind {
            LinkKind::Hint => {
                cx.place_hint(id);
            }
            LinkKind::Stylesheet if cx.options.fix_render_blocking => {
                let Some(head) = cx.doc.head() else {
                    return;
                };
                // a sheet deferred by an earlier pass takes its fallback along
                let fallback = self.trailing_fallback(cx.doc);
                cx.doc.append_child(head, id);
                if let Some(noscript) = fallback {
                    cx.doc.insert_after(id, noscript);
                }
            }
            _ => {}
        }
    }
}

impl Preloadable for LinkResolver {
    fn resource_url(&self, cx: &Context<'_>) -> Option<String> {
        match self.kind {
            LinkKind::Stylesheet => self.href(cx.doc).map(str::to_string),
            _ => None,
        }
    }

    fn preconnect_node(&self, cx: &mut Context<'_>) -> Option<NodeId> {
        let href = self.resource_url(cx)?;
        if !cx.is_external(&href) {
            return None;
        }
        let origin = url::origin(&href)?;
        Some(cx.create_hint("preconnect", &origin, &[("crossorigin", "")]))
    }

    fn preload_node(&self, cx: &mut Context<'_>) -> Option<NodeId> {
        let href = self.resource_url(cx)?;
        let id = self.base.id;
        let mut extra = vec![("as", "style")];
        // the real media of an already deferred sheet sits in data-media
        let media = cx
            .doc
            .attr(id, "data-media")
            .or_else(|| cx.doc.attr(id, "media"))
            .map(str::trim)
            .filter(|m| !m.is_empty() && !m.eq_ignore_ascii_case("all"))
            .map(str::to_string);
        if let Some(media) = media.as_deref() {
            extra.push(("media", media));
        }
        Some(cx.create_hint("preload", &href, &extra))
    }
}

impl Lazyable for LinkResolver {
    fn lazy_enabled(&self, options: &Options) -> bool {
        options.optimize_css && self.kind == LinkKind::Stylesheet
    }

    fn lazy_url(&self, cx: &Context<'_>) -> Option<String> {
        self.href(cx.doc).map(str::to_string)
    }

    fn wants_fallback(&self) -> bool {
        self.kind == LinkKind::Stylesheet
    }

    /// Third-party stylesheets only; first-party CSS stays render-critical.
    fn lazyload(&mut self, cx: &mut Context<'_>) -> bool {
        let id = self.base.id;
        let Some(href) = self.href(cx.doc).map(str::to_string) else {
            return false;
        };
        if !cx.is_third_party(&href)
            || cx.doc.has_attr(id, "data-media")
            || cx.doc.has_attr(id, "onload")
        {
            return false;
        }
        let media = cx
            .doc
            .attr(id, "media")
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or("all")
            .to_string();
        cx.doc.set_attr(id, "data-media", media);
        cx.doc.set_attr(id, "media", "print");
        cx.doc.set_attr(id, "onload", RESTORE_MEDIA);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_document;

    #[test]
    fn test_link_kind() {
        let doc = parse_document(
            r#"<html><head><link rel="DNS-Prefetch" href="//a"><link rel="stylesheet alternate" href="a.css"><link rel="icon" href="i.png"></head></html>"#,
        )
        .unwrap();
        let links = doc.elements_by_tag(&["link"]);
        assert_eq!(link_kind(&doc, links[0]), LinkKind::Hint);
        assert_eq!(link_kind(&doc, links[1]), LinkKind::Stylesheet);
        assert_eq!(link_kind(&doc, links[2]), LinkKind::Other);
    }
}
