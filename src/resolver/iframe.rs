//! `<iframe>`, `<frame>` and `<embed>`.

use super::{Base, Context, Lazyable, Normalizable, Preloadable, impl_resolve, marker, url};
use crate::config::Options;
use crate::dom::{Document, NodeId};

#[derive(Debug)]
pub struct IframeResolver {
    base: Base,
    /// `<embed>` has no placeholder document and no `loading` attribute.
    is_embed: bool,
}

impl_resolve!(IframeResolver);

impl IframeResolver {
    pub fn new(base: Base, doc: &Document) -> Self {
        let is_embed = doc.tag(base.id) == Some("embed");
        Self { base, is_embed }
    }

    fn src<'d>(&self, doc: &'d Document) -> Option<&'d str> {
        ["src", "data-src"]
            .iter()
            .filter_map(|name| doc.attr(self.base.id, name))
            .map(str::trim)
            .find(|v| !v.is_empty())
    }
}

impl Normalizable for IframeResolver {
    fn normalize(&mut self, cx: &mut Context<'_>) {
        self.base
            .unify_synonyms(cx.doc, "data-src", &["data-lazy-src", "data-original"]);
        self.base.canonicalize_url_attr(cx.doc, "src");
        self.base.canonicalize_url_attr(cx.doc, "data-src");
    }
}

impl Preloadable for IframeResolver {
    fn resource_url(&self, cx: &Context<'_>) -> Option<String> {
        self.src(cx.doc)
            .filter(|s| !url::is_inline(s))
            .map(str::to_string)
    }

    fn preconnect_node(&self, cx: &mut Context<'_>) -> Option<NodeId> {
        let src = self.resource_url(cx)?;
        if !cx.is_external(&src) || !cx.is_third_party(&src) {
            return None;
        }
        let origin = url::origin(&src)?;
        Some(cx.create_hint("preconnect", &origin, &[]))
    }
}

impl Lazyable for IframeResolver {
    fn lazy_enabled(&self, options: &Options) -> bool {
        options.optimize_iframes
    }

    fn lazy_url(&self, cx: &Context<'_>) -> Option<String> {
        self.src(cx.doc).map(str::to_string)
    }

    fn lazyload(&mut self, cx: &mut Context<'_>) -> bool {
        let id = self.base.id;
        if cx.doc.has_attr(id, "data-src") {
            if let Some(attrs) = cx.doc.attrs_mut(id) {
                attrs.add_class(marker::LAZY_CLASS);
            }
            return false;
        }
        let src = cx.doc.attr(id, "src").map(str::trim).unwrap_or_default();
        if src.is_empty() || url::is_inline(src) {
            return false;
        }

        let placeholder = cx.options.iframe_placeholder.trim().to_string();
        let is_iframe = cx.doc.tag(id) == Some("iframe");
        let Some(attrs) = cx.doc.attrs_mut(id) else {
            return false;
        };
        attrs.rename("src", "data-src");
        if !self.is_embed && !placeholder.is_empty() {
            attrs.set_after("data-src", "src", placeholder);
        }
        if is_iframe && !attrs.has("loading") {
            attrs.set("loading", "lazy");
        }
        attrs.add_class(marker::LAZY_CLASS);
        true
    }
}
