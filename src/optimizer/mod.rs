//! Document optimization pipeline.
//!
//! # Module Structure
//!
//! ```text
//! optimizer/
//! ├── document   # structure repair, metas, splash screen, whitespace
//! ├── loader     # LoaderAssembler (cached / fetched / bundled loader)
//! ├── registry   # PreloadRegistry (hint dedup)
//! └── mod.rs     # Optimizer and the per-document pass (this file)
//! ```
//!
//! # Pass order
//!
//! ```text
//! parse ─► resolve loader ─► normalize ─► [AMP override] ─► ignore-by-selector
//!       ─► sweeps: hints, iframes, media, backgrounds, scripts, styles, anchors
//!       ─► loader injection ─► fade-in / splash ─► metas ─► whitespace
//!       ─► [AMP restore] ─► registry reset ─► serialize
//! ```
//!
//! One [`Optimizer`] serves many documents (and threads); everything that
//! belongs to a single document lives in the pass and is dropped with it.

mod document;
mod loader;
mod registry;

pub use document::Skeleton;
pub use loader::{LoaderAssembler, LoaderAssets};
pub use registry::{HINT_RELS, PreloadRegistry, is_hint_rel};

use thiserror::Error;

use crate::cache::{AssetCache, CacheError};
use crate::config::{LazyloadRules, Options, OptionsModel};
use crate::debug;
use crate::dom::{Document, DomError, NodeId, parse_document};
use crate::fetch::{Fetch, HttpFetcher, NoFetch};
use crate::resolver::{Context, Resolver, ResolverKind, classify, marker};

#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("input is not an html document (no <html> element)")]
    NotADocument,

    #[error("failed to parse html: {0}")]
    Parse(String),

    #[error("document has no resolvable <{0}>")]
    MissingStructure(&'static str),

    #[error("loader script `{0}` could not be fetched and has no bundled copy")]
    LoaderUnavailable(String),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl From<DomError> for OptimizeError {
    fn from(err: DomError) -> Self {
        match err {
            DomError::NotADocument => Self::NotADocument,
            DomError::Parse(msg) => Self::Parse(msg),
        }
    }
}

// =============================================================================
// Sweeps
// =============================================================================

/// Element categories, in the order they are processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sweep {
    Hints,
    Iframes,
    Media,
    Backgrounds,
    Scripts,
    Styles,
    Anchors,
}

const SWEEPS: [Sweep; 7] = [
    Sweep::Hints,
    Sweep::Iframes,
    Sweep::Media,
    Sweep::Backgrounds,
    Sweep::Scripts,
    Sweep::Styles,
    Sweep::Anchors,
];

impl Sweep {
    fn enabled(self, options: &Options) -> bool {
        match self {
            Self::Hints => options.enable_preloading || options.enable_dns_prefetch,
            Self::Iframes => options.optimize_iframes,
            Self::Media => options.optimize_images,
            Self::Backgrounds => options.optimize_background,
            Self::Scripts => options.optimize_scripts,
            Self::Styles => options.optimize_css,
            Self::Anchors => options.optimize_anchors,
        }
    }

    /// Snapshot of the elements this sweep visits, in document order.
    fn collect(self, doc: &Document) -> Vec<NodeId> {
        let is_hint = |id: NodeId| doc.attr(id, "rel").is_some_and(is_hint_rel);
        match self {
            Self::Hints => doc
                .elements_by_tag(&["link"])
                .into_iter()
                .filter(|&id| is_hint(id))
                .collect(),
            Self::Iframes => doc.elements_by_tag(&["iframe", "frame", "embed"]),
            Self::Media => doc
                .elements()
                .into_iter()
                .filter(|&id| classify(doc, id) == ResolverKind::Media)
                .collect(),
            Self::Backgrounds => doc
                .elements()
                .into_iter()
                .filter(|&id| classify(doc, id) == ResolverKind::InlineStyle)
                .collect(),
            Self::Scripts => doc.elements_by_tag(&["script"]),
            Self::Styles => doc
                .elements_by_tag(&["link", "style"])
                .into_iter()
                .filter(|&id| !is_hint(id))
                .collect(),
            Self::Anchors => doc.elements_by_tag(&["a"]),
        }
    }
}

// =============================================================================
// Optimizer
// =============================================================================

/// Long-lived optimizer: options, compiled rules and the loader assembler.
#[derive(Debug)]
pub struct Optimizer {
    options: Options,
    rules: LazyloadRules,
    loader: LoaderAssembler,
}

impl Optimizer {
    /// Optimizer fetching loader assets over HTTP.
    ///
    /// Fails when `offline_cache_path` is not a usable directory.
    pub fn new(options: Options) -> Result<Self, OptimizeError> {
        match HttpFetcher::new() {
            Some(fetcher) => Self::with_fetcher(options, fetcher),
            None => Self::with_fetcher(options, NoFetch),
        }
    }

    pub fn with_fetcher(options: Options, fetcher: impl Fetch + 'static) -> Result<Self, OptimizeError> {
        let cache = AssetCache::from_options(&options)?;
        Ok(Self::with_parts(options, cache, Box::new(fetcher)))
    }

    pub fn with_parts(options: Options, cache: AssetCache, fetcher: Box<dyn Fetch>) -> Self {
        Self {
            rules: LazyloadRules::from_options(&options),
            loader: LoaderAssembler::new(cache, fetcher),
            options,
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn loader(&self) -> &LoaderAssembler {
        &self.loader
    }

    /// Drop memoized loader payloads.
    pub fn reset(&self) {
        self.loader.reset();
    }

    pub fn optimize(&self, html: &str) -> Result<String, OptimizeError> {
        self.optimize_for_host(html, "")
    }

    /// Optimize a document served from `host` (used for cache keys and
    /// external-origin checks).
    pub fn optimize_for_host(&self, html: &str, host: &str) -> Result<String, OptimizeError> {
        let mut doc = parse_document(html)?;
        self.optimize_document(&mut doc, host)?;
        Ok(doc.serialize())
    }

    /// Run the full pass over a parsed document. No-op if already optimized.
    pub fn optimize_document(&self, doc: &mut Document, host: &str) -> Result<(), OptimizeError> {
        if doc.optimized {
            return Ok(());
        }
        let html = doc.html().ok_or(OptimizeError::NotADocument)?;
        let amp = document::is_amp(doc, html);

        // fatal loader errors surface while the tree is still untouched
        let assets = if amp {
            None
        } else {
            Some(self.loader.assets(&self.options, host)?)
        };

        let skeleton = document::normalize(doc)?;
        let mut model = OptionsModel::new(self.options.clone());
        if amp {
            debug!("optimize"; "AMP document, applying AMP profile");
            model.push_override(Options::apply_amp_profile);
        }

        self.run_pass(doc, skeleton, &model, assets.as_deref(), host);

        if amp {
            model.restore();
        }
        doc.optimized = true;
        Ok(())
    }

    fn run_pass(
        &self,
        doc: &mut Document,
        skeleton: Skeleton,
        options: &Options,
        assets: Option<&LoaderAssets>,
        host: &str,
    ) {
        mark_ignored_by_selector(doc, &self.rules);

        let mut cx = Context::new(doc, options, &self.rules, host);
        for sweep in SWEEPS {
            if !sweep.enabled(options) {
                continue;
            }
            for id in sweep.collect(cx.doc) {
                if cx.doc.is_attached(id) {
                    Resolver::new(cx.doc, id).optimize(&mut cx);
                }
            }
        }

        match assets {
            Some(assets) => LoaderAssembler::inject(cx.doc, skeleton.head, options, assets),
            None => {
                if let Some(attrs) = cx.doc.attrs_mut(skeleton.html) {
                    attrs.remove_class(marker::NO_LOADER_CLASS);
                }
            }
        }

        if options.use_css_fadein_effects
            && let Some(attrs) = cx.doc.attrs_mut(skeleton.html)
        {
            attrs.add_class(marker::FADEIN_CLASS);
        }
        document::add_splash_screen(cx.doc, skeleton.body, &options.custom_splash_screen);

        for id in cx.doc.elements_by_tag(&["meta"]) {
            if cx.doc.is_attached(id) {
                Resolver::new(cx.doc, id).optimize(&mut cx);
            }
        }
        if options.add_missing_meta_tags {
            document::add_missing_metas(cx.doc, skeleton.head);
        }

        if options.minify_output_html {
            document::minify_whitespace(cx.doc);
        }

        debug!("registry"; "{} hint(s) registered", cx.registry.len());
        cx.registry.reset();
    }
}

/// Give every element matched by an ignore selector the no-lazy marker.
fn mark_ignored_by_selector(doc: &mut Document, rules: &LazyloadRules) {
    for id in doc.select_all(&rules.selectors) {
        if !doc.has_attr(id, marker::NOLAZY_ATTR) {
            doc.set_attr(id, marker::NOLAZY_ATTR, "");
        }
    }
}

#[cfg(test)]
mod tests;
