//! `<meta>`: moved to the top of `<head>` with `charset` first.

use super::{Base, Context, Normalizable, Reorderable, impl_resolve};
use crate::dom::{Document, NodeId};

#[derive(Debug)]
pub struct MetaResolver {
    base: Base,
}

impl_resolve!(MetaResolver);

impl MetaResolver {
    pub fn new(base: Base) -> Self {
        Self { base }
    }
}

pub fn is_charset_meta(doc: &Document, id: NodeId) -> bool {
    doc.tag(id) == Some("meta") && doc.has_attr(id, "charset")
}

impl Normalizable for MetaResolver {
    fn normalize(&mut self, cx: &mut Context<'_>) {
        let id = self.base.id;
        if let Some(charset) = cx.doc.attr(id, "charset") {
            let lower = charset.trim().to_ascii_lowercase();
            if lower != charset {
                cx.doc.set_attr(id, "charset", lower);
            }
        }
    }
}

impl Reorderable for MetaResolver {
    /// Microdata metas (`itemprop`) belong to their item and stay put.
    fn reposition(&mut self, cx: &mut Context<'_>) {
        let id = self.base.id;
        if cx.doc.has_attr(id, "itemprop") {
            return;
        }
        let Some(head) = cx.doc.head() else {
            return;
        };

        if is_charset_meta(cx.doc, id) {
            cx.doc.prepend_child(head, id);
            if cx.meta_anchor.is_none() {
                cx.meta_anchor = Some(id);
            }
            return;
        }

        let anchor = cx
            .meta_anchor
            .filter(|&a| cx.doc.parent(a) == Some(head))
            .or_else(|| {
                cx.doc
                    .children(head)
                    .first()
                    .copied()
                    .filter(|&first| is_charset_meta(cx.doc, first))
            });
        match anchor {
            Some(anchor) => cx.doc.insert_after(anchor, id),
            None => cx.doc.prepend_child(head, id),
        }
        cx.meta_anchor = Some(id);
    }
}
