//! `<style>`: default attributes dropped, moved to the end of `<head>`,
//! content minified.

use super::{Base, Context, Minifyable, Normalizable, Reorderable, impl_resolve};
use crate::asset::minify::minify_css;
use crate::debug;

#[derive(Debug)]
pub struct StyleResolver {
    base: Base,
}

impl_resolve!(StyleResolver);

impl StyleResolver {
    pub fn new(base: Base) -> Self {
        Self { base }
    }
}

impl Normalizable for StyleResolver {
    fn normalize(&mut self, cx: &mut Context<'_>) {
        let id = self.base.id;
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

impl Reorderable for StyleResolver {
    fn reposition(&mut self, cx: &mut Context<'_>) {
        if !cx.options.fix_render_blocking {
            return;
        }
        if let Some(head) = cx.doc.head() {
            cx.doc.append_child(head, self.base.id);
        }
    }
}

impl Minifyable for StyleResolver {
    fn minify(&mut self, cx: &mut Context<'_>) {
        let id = self.base.id;
        let source = cx.doc.text_content(id);
        let minified = minify_css(&source).unwrap_or_else(|| {
            debug!("minify"; "keeping unparsable stylesheet as is");
            source.trim().to_string()
        });
        if minified.is_empty() {
            cx.doc.detach(id);
        } else if minified != source {
            cx.doc.set_text_content(id, minified);
        }
    }
}
