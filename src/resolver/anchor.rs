//! `<a>`: URL canonicalization, `noopener` and DNS hints for third-party links.

use super::{Base, Context, Normalizable, Preloadable, impl_resolve, url};
use crate::dom::NodeId;

#[derive(Debug)]
pub struct AnchorResolver {
    base: Base,
}

impl_resolve!(AnchorResolver);

impl AnchorResolver {
    pub fn new(base: Base) -> Self {
        Self { base }
    }
}

impl Normalizable for AnchorResolver {
    fn normalize(&mut self, cx: &mut Context<'_>) {
        let id = self.base.id;
        self.base.canonicalize_url_attr(cx.doc, "href");

        let blank = cx
            .doc
            .attr(id, "target")
            .is_some_and(|t| t.trim().eq_ignore_ascii_case("_blank"));
        if !blank {
            return;
        }
        let rel = cx.doc.attr(id, "rel").unwrap_or_default();
        if rel
            .split_ascii_whitespace()
            .any(|t| t.eq_ignore_ascii_case("noopener") || t.eq_ignore_ascii_case("noreferrer"))
        {
            return;
        }
        let rel = match rel.trim() {
            "" => "noopener".to_string(),
            tokens => format!("{tokens} noopener"),
        };
        cx.doc.set_attr(id, "rel", rel);
    }
}

impl Preloadable for AnchorResolver {
    fn resource_url(&self, cx: &Context<'_>) -> Option<String> {
        let href = cx.doc.attr(self.base.id, "href")?;
        url::parse_web(href).map(|_| href.to_string())
    }

    /// Only well-known third-party destinations are worth resolving early.
    fn dns_prefetch_node(&self, cx: &mut Context<'_>) -> Option<NodeId> {
        let href = self.resource_url(cx)?;
        if !cx.is_external(&href) || !cx.is_third_party(&href) {
            return None;
        }
        let origin = url::origin(&href)?;
        Some(cx.create_hint("dns-prefetch", &origin, &[]))
    }
}
