//! Per-element optimization strategies.
//!
//! # Module Structure
//!
//! ```text
//! resolver/
//! ├── context       # per-document pass state (options, rules, hint registry)
//! ├── marker        # attribute / class / id names
//! ├── url           # resource URL helpers
//! ├── anchor        # <a>
//! ├── link          # <link> (hints, stylesheets, others)
//! ├── meta          # <meta>
//! ├── style         # <style>
//! ├── script        # <script>
//! ├── media         # <img> <picture> <video> <audio> <source> <input type=image>
//! ├── iframe        # <iframe> <frame> <embed>
//! └── inline_style  # any other element with a style attribute
//! ```
//!
//! [`classify`] maps an element to a [`ResolverKind`]. Each concrete resolver
//! implements a subset of the capability traits ([`Normalizable`],
//! [`Reorderable`], [`Lazyable`], [`Preloadable`], [`Minifyable`]) and
//! [`Resolver::optimize`] drives them through one fixed sequence, asking
//! for capabilities rather than concrete types.

mod anchor;
mod context;
mod iframe;
mod inline_style;
mod link;
mod media;
mod meta;
mod script;
mod style;

pub mod marker;
pub mod url;

pub use anchor::AnchorResolver;
pub use context::Context;
pub use iframe::IframeResolver;
pub use inline_style::InlineStyleResolver;
pub use link::LinkResolver;
pub use media::MediaResolver;
pub use meta::MetaResolver;
pub use script::ScriptResolver;
pub use style::StyleResolver;

use rustc_hash::FxHashMap;

use crate::config::Options;
use crate::dom::{Document, NodeId};
use crate::utils::html::escape_comment;

// =============================================================================
// Classification
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolverKind {
    Anchor,
    Link,
    Meta,
    Style,
    Script,
    Media,
    Iframe,
    InlineStyle,
    Generic,
}

/// Map an element to its resolver kind. Non-elements are `Generic`.
pub fn classify(doc: &Document, id: NodeId) -> ResolverKind {
    let Some(tag) = doc.tag(id) else {
        return ResolverKind::Generic;
    };
    match tag {
        "a" => ResolverKind::Anchor,
        "link" => ResolverKind::Link,
        "meta" => ResolverKind::Meta,
        "style" => ResolverKind::Style,
        "script" => ResolverKind::Script,
        "embed" | "frame" | "iframe" => ResolverKind::Iframe,
        "img" | "picture" | "video" | "audio" | "source" => ResolverKind::Media,
        "input"
            if doc
                .attr(id, "type")
                .is_some_and(|t| t.trim().eq_ignore_ascii_case("image")) =>
        {
            ResolverKind::Media
        }
        _ if doc.has_attr(id, "style") => ResolverKind::InlineStyle,
        _ => ResolverKind::Generic,
    }
}

// =============================================================================
// Shared state and capabilities
// =============================================================================

/// State every resolver carries for the element it wraps.
#[derive(Debug)]
pub struct Base {
    pub id: NodeId,
    /// Attribute values before synonym unification; first write wins.
    attr_backups: FxHashMap<String, String>,
    /// `<noscript>` holding a clone of the element before lazyloading.
    fallback: Option<NodeId>,
}

impl Base {
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            attr_backups: FxHashMap::default(),
            fallback: None,
        }
    }

    pub fn backup_attr(&mut self, name: &str, value: &str) {
        self.attr_backups
            .entry(name.to_string())
            .or_insert_with(|| value.to_string());
    }

    pub fn backup(&self, name: &str) -> Option<&str> {
        self.attr_backups.get(name).map(String::as_str)
    }

    /// Rename the first present synonym to `canonical`, dropping the rest.
    ///
    /// An existing `canonical` attribute is kept as is.
    pub fn unify_synonyms(&mut self, doc: &mut Document, canonical: &str, synonyms: &[&str]) {
        for name in synonyms {
            let Some(value) = doc.attr(self.id, name).map(str::to_string) else {
                continue;
            };
            self.backup_attr(name, &value);
            let Some(attrs) = doc.attrs_mut(self.id) else {
                return;
            };
            if attrs.has(canonical) {
                attrs.remove(name);
            } else {
                attrs.rename(name, canonical);
            }
        }
    }

    /// Rewrite a protocol-relative URL attribute to `https:`.
    pub fn canonicalize_url_attr(&mut self, doc: &mut Document, name: &str) {
        let Some(value) = doc.attr(self.id, name).map(str::to_string) else {
            return;
        };
        let fixed = url::canonical_protocol(&value).into_owned();
        if fixed != value {
            self.backup_attr(name, &value);
            doc.set_attr(self.id, name, fixed);
        }
    }

    /// Element, or an ancestor, is marked ignored, sits inside `<noscript>`,
    /// or belongs to the loader injection.
    pub fn should_ignore(&self, cx: &Context<'_>) -> bool {
        if cx.doc.has_attr(self.id, marker::IGNORE_ATTR) || cx.is_injected(self.id) {
            return true;
        }
        cx.doc.ancestors(self.id).any(|a| {
            cx.doc.has_attr(a, marker::IGNORE_ATTR) || cx.doc.tag(a) == Some("noscript")
        })
    }

    /// Fallback `<noscript>` wrapping a clone of the current element.
    pub fn resolve_noscript(&mut self, cx: &mut Context<'_>) -> NodeId {
        if let Some(fallback) = self.fallback {
            return fallback;
        }
        let noscript = cx.doc.create_element("noscript");
        let clone = cx.doc.deep_clone(self.id);
        cx.doc.append_child(noscript, clone);
        cx.doc.mark_optimized(noscript);
        self.fallback = Some(noscript);
        noscript
    }
}

pub trait Resolve {
    fn base(&self) -> &Base;
    fn base_mut(&mut self) -> &mut Base;

    fn id(&self) -> NodeId {
        self.base().id
    }
}

/// Attribute cleanup. Must be a fixed point.
pub trait Normalizable: Resolve {
    fn normalize(&mut self, cx: &mut Context<'_>);
}

/// Move the element to its canonical place.
pub trait Reorderable: Resolve {
    fn reposition(&mut self, cx: &mut Context<'_>);
}

pub trait Lazyable: Resolve {
    /// Per-category switch.
    fn lazy_enabled(&self, options: &Options) -> bool;

    /// URL checked against `ignore_lazyload_paths`.
    fn lazy_url(&self, _cx: &Context<'_>) -> Option<String> {
        None
    }

    fn wants_fallback(&self) -> bool {
        true
    }

    /// Rewrite the element for deferred loading. Returns whether it changed.
    fn lazyload(&mut self, cx: &mut Context<'_>) -> bool;

    fn should_lazyload(&self, cx: &Context<'_>) -> bool {
        let id = self.id();
        if !cx.options.enable_lazyloading
            || !self.lazy_enabled(cx.options)
            || cx.doc.has_attr(id, marker::NOLAZY_ATTR)
        {
            return false;
        }
        !self.skip_lazyloading(cx)
    }

    /// Blacklist check: skips on any class, path or text match.
    fn skip_lazyloading(&self, cx: &Context<'_>) -> bool {
        let id = self.id();
        if cx.doc.attr(id, "class").is_some_and(|c| cx.rules.matches_class(c)) {
            return true;
        }
        if self.lazy_url(cx).is_some_and(|u| cx.rules.matches_path(&u)) {
            return true;
        }
        cx.rules.has_text_rules() && cx.rules.matches_text(&cx.doc.outer_html(id))
    }
}

pub trait Preloadable: Resolve {
    /// The external resource the element loads, if any.
    fn resource_url(&self, cx: &Context<'_>) -> Option<String>;

    fn preconnect_node(&self, _cx: &mut Context<'_>) -> Option<NodeId> {
        None
    }

    /// `dns-prefetch` for resources on another host.
    fn dns_prefetch_node(&self, cx: &mut Context<'_>) -> Option<NodeId> {
        let src = self.resource_url(cx)?;
        if !cx.is_external(&src) {
            return None;
        }
        let origin = url::origin(&src)?;
        Some(cx.create_hint("dns-prefetch", &origin, &[]))
    }

    fn prefetch_node(&self, _cx: &mut Context<'_>) -> Option<NodeId> {
        None
    }

    fn preload_node(&self, _cx: &mut Context<'_>) -> Option<NodeId> {
        None
    }
}

pub trait Minifyable: Resolve {
    fn minify(&mut self, cx: &mut Context<'_>);
}

// =============================================================================
// Dispatch
// =============================================================================

/// Resolver for elements without a dedicated strategy.
#[derive(Debug)]
pub struct GenericResolver {
    base: Base,
}

macro_rules! impl_resolve {
    ($($ty:ident),* $(,)?) => {
        $(
            impl $crate::resolver::Resolve for $ty {
                fn base(&self) -> &$crate::resolver::Base {
                    &self.base
                }
                fn base_mut(&mut self) -> &mut $crate::resolver::Base {
                    &mut self.base
                }
            }
        )*
    };
}
pub(crate) use impl_resolve;

impl_resolve!(GenericResolver);

#[derive(Debug)]
pub enum Resolver {
    Anchor(AnchorResolver),
    Link(LinkResolver),
    Meta(MetaResolver),
    Style(StyleResolver),
    Script(ScriptResolver),
    Media(MediaResolver),
    Iframe(IframeResolver),
    InlineStyle(InlineStyleResolver),
    Generic(GenericResolver),
}

impl Resolver {
    pub fn new(doc: &Document, id: NodeId) -> Self {
        let base = Base::new(id);
        match classify(doc, id) {
            ResolverKind::Anchor => Self::Anchor(AnchorResolver::new(base)),
            ResolverKind::Link => Self::Link(LinkResolver::new(base, doc)),
            ResolverKind::Meta => Self::Meta(MetaResolver::new(base)),
            ResolverKind::Style => Self::Style(StyleResolver::new(base)),
            ResolverKind::Script => Self::Script(ScriptResolver::new(base, doc)),
            ResolverKind::Media => Self::Media(MediaResolver::new(base, doc)),
            ResolverKind::Iframe => Self::Iframe(IframeResolver::new(base, doc)),
            ResolverKind::InlineStyle => Self::InlineStyle(InlineStyleResolver::new(base)),
            ResolverKind::Generic => Self::Generic(GenericResolver { base }),
        }
    }

    pub fn kind(&self) -> ResolverKind {
        match self {
            Self::Anchor(_) => ResolverKind::Anchor,
            Self::Link(_) => ResolverKind::Link,
            Self::Meta(_) => ResolverKind::Meta,
            Self::Style(_) => ResolverKind::Style,
            Self::Script(_) => ResolverKind::Script,
            Self::Media(_) => ResolverKind::Media,
            Self::Iframe(_) => ResolverKind::Iframe,
            Self::InlineStyle(_) => ResolverKind::InlineStyle,
            Self::Generic(_) => ResolverKind::Generic,
        }
    }

    fn resolve(&self) -> &dyn Resolve {
        match self {
            Self::Anchor(r) => r,
            Self::Link(r) => r,
            Self::Meta(r) => r,
            Self::Style(r) => r,
            Self::Script(r) => r,
            Self::Media(r) => r,
            Self::Iframe(r) => r,
            Self::InlineStyle(r) => r,
            Self::Generic(r) => r,
        }
    }

    pub fn id(&self) -> NodeId {
        self.resolve().id()
    }

    pub fn as_normalizable(&mut self) -> Option<&mut dyn Normalizable> {
        match self {
            Self::Anchor(r) => Some(r),
            Self::Link(r) => Some(r),
            Self::Meta(r) => Some(r),
            Self::Style(r) => Some(r),
            Self::Script(r) => Some(r),
            Self::Media(r) => Some(r),
            Self::Iframe(r) => Some(r),
            Self::InlineStyle(_) | Self::Generic(_) => None,
        }
    }

    pub fn as_reorderable(&mut self) -> Option<&mut dyn Reorderable> {
        match self {
            Self::Link(r) => Some(r),
            Self::Meta(r) => Some(r),
            Self::Style(r) => Some(r),
            Self::Script(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_lazyable(&mut self) -> Option<&mut dyn Lazyable> {
        match self {
            Self::Link(r) => Some(r),
            Self::Script(r) => Some(r),
            Self::Media(r) => Some(r),
            Self::Iframe(r) => Some(r),
            Self::InlineStyle(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_preloadable(&mut self) -> Option<&mut dyn Preloadable> {
        match self {
            Self::Anchor(r) => Some(r),
            Self::Link(r) => Some(r),
            Self::Script(r) => Some(r),
            Self::Media(r) => Some(r),
            Self::Iframe(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_minifyable(&mut self) -> Option<&mut dyn Minifyable> {
        match self {
            Self::Style(r) => Some(r),
            Self::Script(r) => Some(r),
            Self::InlineStyle(r) => Some(r),
            _ => None,
        }
    }

    /// Run the element through every capability it has, in fixed order.
    ///
    /// Returns false when the element was skipped (already optimized or
    /// ignored).
    pub fn optimize(&mut self, cx: &mut Context<'_>) -> bool {
        let id = self.id();
        if cx.doc.element(id).is_none_or(|e| e.optimized) {
            return false;
        }

        if let Some(r) = self.as_normalizable() {
            r.normalize(cx);
        }

        if self.resolve().base().should_ignore(cx) {
            mark_element(cx.doc, id);
            return false;
        }

        let original = cx.options.debug_mode.then(|| cx.doc.outer_html(id));

        if cx.options.optimize_fallback
            && let Some(r) = self.as_lazyable()
            && r.wants_fallback()
        {
            r.base_mut().resolve_noscript(cx);
        }

        if let Some(r) = self.as_reorderable() {
            r.reposition(cx);
        }

        if cx.doc.is_attached(id)
            && let Some(r) = self.as_preloadable()
        {
            emit_hints(r, cx);
        }

        if cx.doc.is_attached(id)
            && let Some(r) = self.as_lazyable()
            && r.should_lazyload(cx)
            && r.lazyload(cx)
            && let Some(fallback) = r.base().fallback
        {
            cx.doc.insert_after(id, fallback);
            if let Some(attrs) = cx.doc.attrs_mut(id) {
                attrs.add_class(marker::FALLBACK_CLASS);
            }
        }

        if cx.doc.is_attached(id)
            && cx.options.minify_output_html
            && let Some(r) = self.as_minifyable()
        {
            r.minify(cx);
        }

        if let Some(original) = original
            && cx.doc.is_attached(id)
            && cx.doc.outer_html(id) != original
        {
            let seq = cx.next_debug_id();
            cx.doc.set_attr(id, marker::DEBUG_ATTR, seq.to_string());
            let comment = cx
                .doc
                .create_comment(format!(" [deferhtml #{seq}] {} ", escape_comment(&original)));
            cx.doc.insert_after(id, comment);
        }

        mark_element(cx.doc, id);
        true
    }
}

fn mark_element(doc: &mut Document, id: NodeId) {
    if let Some(e) = doc.element_mut(id) {
        e.optimized = true;
    }
}

/// Connection hints first, then fetch hints; self-references are skipped.
fn emit_hints(r: &mut dyn Preloadable, cx: &mut Context<'_>) {
    let id = r.id();
    let mut nodes = Vec::with_capacity(4);
    if cx.options.enable_dns_prefetch {
        nodes.push(r.preconnect_node(cx));
        nodes.push(r.dns_prefetch_node(cx));
    }
    if cx.options.enable_preloading {
        nodes.push(r.prefetch_node(cx));
        nodes.push(r.preload_node(cx));
    }
    for node in nodes.into_iter().flatten() {
        if node != id {
            cx.place_hint(node);
        }
    }
}
