//! `<script>`: render-blocking fix, deferral through the runtime, hints and
//! inline minification.

use super::{
    Base, Context, Lazyable, Minifyable, Normalizable, Preloadable, Reorderable, impl_resolve,
    marker, url,
};
use crate::asset::minify::{minify_js, minify_json, minify_module_js};
use crate::config::Options;
use crate::debug;
use crate::dom::{Document, NodeId};

/// MIME types that mean "classic JavaScript".
const JS_TYPES: &[&str] = &[
    "text/javascript",
    "application/javascript",
    "application/x-javascript",
    "text/ecmascript",
    "application/ecmascript",
    "text/jscript",
];

/// Attributes serialized without a value when set to their own name.
const BOOLEAN_ATTRS: &[&str] = &["async", "defer", "nomodule"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    /// Executable classic script.
    Classic,
    Module,
    /// Already handed to the runtime (`type="deferjs"`).
    Deferred,
    /// JSON payload (JSON-LD, import maps, speculation rules).
    Json,
    /// Templates and other non-executable blocks.
    Inert,
}

pub fn script_kind(doc: &Document, id: NodeId) -> ScriptKind {
    let Some(raw) = doc.attr(id, "type") else {
        return ScriptKind::Classic;
    };
    let mime = raw.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    match mime.as_str() {
        "" => ScriptKind::Classic,
        m if JS_TYPES.contains(&m) => ScriptKind::Classic,
        "module" => ScriptKind::Module,
        marker::DEFERJS_TYPE => ScriptKind::Deferred,
        m if m.contains("json") || m == "importmap" || m == "speculationrules" => ScriptKind::Json,
        _ => ScriptKind::Inert,
    }
}

#[derive(Debug)]
pub struct ScriptResolver {
    base: Base,
    kind: ScriptKind,
}

impl_resolve!(ScriptResolver);

impl ScriptResolver {
    pub fn new(base: Base, doc: &Document) -> Self {
        let kind = script_kind(doc, base.id);
        Self { base, kind }
    }

    pub fn kind(&self) -> ScriptKind {
        self.kind
    }

    fn src<'d>(&self, doc: &'d Document) -> Option<&'d str> {
        doc.attr(self.base.id, "src")
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

impl Normalizable for ScriptResolver {
    fn normalize(&mut self, cx: &mut Context<'_>) {
        let id = self.base.id;
        self.base.canonicalize_url_attr(cx.doc, "src");

        let Some(attrs) = cx.doc.attrs_mut(id) else {
            return;
        };
        if self.kind == ScriptKind::Classic && attrs.has("type") {
            attrs.remove("type");
        }
        attrs.remove("language");
        for name in BOOLEAN_ATTRS {
            let canonical = attrs.get(name).is_some_and(|v| {
                let v = v.trim();
                !v.is_empty() && (v.eq_ignore_ascii_case(name) || v.eq_ignore_ascii_case("true"))
            });
            if canonical {
                attrs.set(name, "");
            }
        }
    }
}

impl Reorderable for ScriptResolver {
    /// Executable scripts go to the end of `<body>` in document order.
    fn reposition(&mut self, cx: &mut Context<'_>) {
        if !cx.options.fix_render_blocking
            || !matches!(self.kind, ScriptKind::Classic | ScriptKind::Deferred)
        {
            return;
        }
        if let Some(body) = cx.doc.body() {
            cx.doc.append_child(body, self.base.id);
        }
    }
}

impl Preloadable for ScriptResolver {
    fn resource_url(&self, cx: &Context<'_>) -> Option<String> {
        match self.kind {
            ScriptKind::Classic | ScriptKind::Module | ScriptKind::Deferred => {
                self.src(cx.doc).map(str::to_string)
            }
            _ => None,
        }
    }

    fn preconnect_node(&self, cx: &mut Context<'_>) -> Option<NodeId> {
        let src = self.resource_url(cx)?;
        if !cx.is_external(&src) {
            return None;
        }
        let origin = url::origin(&src)?;
        Some(cx.create_hint("preconnect", &origin, &[]))
    }

    /// Third-party scripts are left to the runtime and not preloaded.
    fn preload_node(&self, cx: &mut Context<'_>) -> Option<NodeId> {
        let src = self.resource_url(cx)?;
        if url::is_inline(&src) || cx.is_third_party(&src) {
            return None;
        }
        match self.kind {
            ScriptKind::Classic => Some(cx.create_hint("preload", &src, &[("as", "script")])),
            ScriptKind::Module => Some(cx.create_hint("modulepreload", &src, &[])),
            _ => None,
        }
    }
}

impl Lazyable for ScriptResolver {
    fn lazy_enabled(&self, options: &Options) -> bool {
        options.optimize_scripts && self.kind == ScriptKind::Classic
    }

    fn lazy_url(&self, cx: &Context<'_>) -> Option<String> {
        self.src(cx.doc).map(str::to_string)
    }

    fn wants_fallback(&self) -> bool {
        false
    }

    /// External scripts are deferred only when they match `defer_third_party`.
    fn lazyload(&mut self, cx: &mut Context<'_>) -> bool {
        if self.kind != ScriptKind::Classic {
            return false;
        }
        if let Some(src) = self.src(cx.doc)
            && cx.is_external(src)
            && !cx.is_third_party(src)
        {
            return false;
        }
        cx.doc.set_attr(self.base.id, "type", marker::DEFERJS_TYPE);
        self.kind = ScriptKind::Deferred;
        true
    }
}

impl Minifyable for ScriptResolver {
    fn minify(&mut self, cx: &mut Context<'_>) {
        let id = self.base.id;
        if self.src(cx.doc).is_some() {
            return;
        }
        let source = cx.doc.text_content(id);
        let minified = match self.kind {
            ScriptKind::Classic | ScriptKind::Deferred => minify_js(&source),
            ScriptKind::Module => minify_module_js(&source),
            ScriptKind::Json => minify_json(&source),
            ScriptKind::Inert => return,
        };
        let minified = match minified {
            Some(code) => code,
            None => {
                debug!("minify"; "keeping unparsable inline script as is");
                source.trim().to_string()
            }
        };
        if minified.is_empty() {
            // only blank scripts go; code that minifies away is kept verbatim
            if source.trim().is_empty() {
                cx.doc.detach(id);
            }
        } else if minified != source {
            cx.doc.set_text_content(id, minified);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_document;

    #[test]
    fn test_script_kind() {
        let doc = parse_document(concat!(
            "<html><body>",
            "<script>a()</script>",
            "<script type=\"Text/JavaScript; charset=utf-8\">b()</script>",
            "<script type=\"module\">c()</script>",
            "<script type=\"deferjs\">d()</script>",
            "<script type=\"application/ld+json\">{}</script>",
            "<script type=\"text/template\"><b></b></script>",
            "</body></html>"
        ))
        .unwrap();
        let kinds: Vec<_> = doc
            .elements_by_tag(&["script"])
            .into_iter()
            .map(|id| script_kind(&doc, id))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ScriptKind::Classic,
                ScriptKind::Classic,
                ScriptKind::Module,
                ScriptKind::Deferred,
                ScriptKind::Json,
                ScriptKind::Inert,
            ]
        );
    }
}
