//! Elements without a dedicated resolver that carry a `style` attribute.
//!
//! Background images are deferred by parking the declarations in
//! `data-style` until the runtime reveals the element.

use super::{Base, Context, Lazyable, Minifyable, impl_resolve, marker, url};
use crate::asset::minify::minify_style_attr;
use crate::config::Options;

#[derive(Debug)]
pub struct InlineStyleResolver {
    base: Base,
}

impl_resolve!(InlineStyleResolver);

impl InlineStyleResolver {
    pub fn new(base: Base) -> Self {
        Self { base }
    }
}

fn has_css_url(style: &str) -> bool {
    url::first_css_url(style).is_some_and(|u| !url::is_inline(u))
}

impl Lazyable for InlineStyleResolver {
    fn lazy_enabled(&self, options: &Options) -> bool {
        options.optimize_background
    }

    fn lazy_url(&self, cx: &Context<'_>) -> Option<String> {
        let style = cx.doc.attr(self.base.id, "style")?;
        url::first_css_url(style).map(str::to_string)
    }

    fn wants_fallback(&self) -> bool {
        false
    }

    fn lazyload(&mut self, cx: &mut Context<'_>) -> bool {
        let id = self.base.id;
        if cx.doc.has_attr(id, "data-style")
            || !cx.doc.attr(id, "style").is_some_and(has_css_url)
        {
            return false;
        }
        let Some(attrs) = cx.doc.attrs_mut(id) else {
            return false;
        };
        attrs.rename("style", "data-style");
        attrs.add_class(marker::LAZY_CLASS);
        true
    }
}

impl Minifyable for InlineStyleResolver {
    fn minify(&mut self, cx: &mut Context<'_>) {
        let id = self.base.id;
        for name in ["style", "data-style"] {
            let Some(source) = cx.doc.attr(id, name).map(str::to_string) else {
                continue;
            };
            let minified =
                minify_style_attr(&source).unwrap_or_else(|| source.trim().to_string());
            if minified.is_empty() {
                cx.doc.remove_attr(id, name);
            } else if minified != source {
                cx.doc.set_attr(id, name, minified);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_css_url() {
        assert!(has_css_url("background:url(/bg.jpg)"));
        assert!(!has_css_url("background:url(data:image/png;base64,AA)"));
        assert!(!has_css_url("color:red"));
    }
}
