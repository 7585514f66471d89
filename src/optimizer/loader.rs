//! Loader injection.
//!
//! The loader library is read from the asset cache, fetched when missing,
//! and falls back to the bundled copy when the configured source is the
//! default one. Assembled payloads are memoized per host for the lifetime of
//! the [`LoaderAssembler`]; [`LoaderAssembler::reset`] clears the memo.

use std::sync::Arc;

use dashmap::DashMap;

use super::OptimizeError;
use crate::asset::minify::{minify_css, minify_js};
use crate::cache::{AssetCache, asset_key};
use crate::config::{DEFAULT_DEFERJS_SRC, DEFERJS_VERSION, Options};
use crate::dom::{Attrs, Document, NodeId};
use crate::embed::{DEFER_JS, FADEIN_CSS, HELPER_JS, HelperVars, POLYFILL_GUARD_JS, PolyfillVars};
use crate::fetch::Fetch;
use crate::resolver::marker;
use crate::utils::hash::fingerprint;
use crate::{debug, log};

/// Assembled, minified loader payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderAssets {
    /// Polyfill guard followed by the library; `None` when only a `src`
    /// reference is injected.
    pub library: Option<String>,
    pub helper: String,
    pub style: String,
}

pub struct LoaderAssembler {
    cache: AssetCache,
    fetcher: Box<dyn Fetch>,
    memo: DashMap<String, Arc<LoaderAssets>>,
}

impl std::fmt::Debug for LoaderAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderAssembler")
            .field("cache", &self.cache)
            .field("memo", &self.memo.len())
            .finish_non_exhaustive()
    }
}

impl LoaderAssembler {
    pub fn new(cache: AssetCache, fetcher: Box<dyn Fetch>) -> Self {
        Self {
            cache,
            fetcher,
            memo: DashMap::new(),
        }
    }

    pub fn cache(&self) -> &AssetCache {
        &self.cache
    }

    /// Forget memoized payloads.
    pub fn reset(&self) {
        self.memo.clear();
    }

    /// Payloads for `host`, built on first use.
    pub fn assets(&self, options: &Options, host: &str) -> Result<Arc<LoaderAssets>, OptimizeError> {
        let memo_key = memo_key(options, host);
        if let Some(assets) = self.memo.get(&memo_key) {
            return Ok(Arc::clone(&assets));
        }
        let assets = Arc::new(self.build(options, host)?);
        self.memo.insert(memo_key, Arc::clone(&assets));
        Ok(assets)
    }

    fn build(&self, options: &Options, host: &str) -> Result<LoaderAssets, OptimizeError> {
        let guard = POLYFILL_GUARD_JS.render(&PolyfillVars {
            polyfill_src: options.polyfill_src.trim().to_string(),
        });
        let helper = HELPER_JS.render(&HelperVars { delay: 0 });

        let library = if options.inline_deferjs && !options.manually_add_deferjs {
            Some(self.inline_library(options, host, &guard)?)
        } else {
            None
        };
        // without an inline library the guard runs ahead of the helper
        let helper = match library {
            Some(_) => helper,
            None => format!("{guard}\n{helper}"),
        };

        Ok(LoaderAssets {
            library,
            helper: minify_js(&helper).unwrap_or(helper),
            style: minify_css(FADEIN_CSS).unwrap_or_else(|| FADEIN_CSS.trim().to_string()),
        })
    }

    /// Minified polyfill guard + library, through the asset cache.
    fn inline_library(&self, options: &Options, host: &str, guard: &str) -> Result<String, OptimizeError> {
        let src = options.deferjs_src.trim();
        let ttl = options.offline_cache_ttl;
        let combined_key = asset_key(
            "deferjs-inline",
            &format!("{src}|{}", options.polyfill_src.trim()),
            DEFERJS_VERSION,
            host,
        );
        if let Some(cached) = self.cache.get::<String>(&combined_key) {
            debug!("cache"; "loader hit for {}", host_label(host));
            return Ok(cached);
        }

        let source_key = asset_key("deferjs", src, DEFERJS_VERSION, host);
        let library = match self.cache.get::<String>(&source_key) {
            Some(library) => library,
            None => match self.fetch_text(src) {
                Some(library) => {
                    self.store(&source_key, &library, ttl);
                    library
                }
                None if src == DEFAULT_DEFERJS_SRC => {
                    debug!("loader"; "using bundled copy of {}", src);
                    DEFER_JS.to_string()
                }
                None => return Err(OptimizeError::LoaderUnavailable(src.to_string())),
            },
        };

        let combined = format!("{guard}\n{library}");
        let minified = minify_js(&combined).unwrap_or(combined);
        self.store(&combined_key, &minified, ttl);
        debug!(
            "loader"; "assembled loader {} for {}",
            fingerprint(&minified),
            host_label(host)
        );
        Ok(minified)
    }

    /// The cache is best-effort: a failed write only costs a refetch later.
    fn store(&self, key: &str, value: &str, ttl: u64) {
        if let Err(e) = self.cache.set(key, value, ttl) {
            debug!("cache"; "could not store {}: {}", key, e);
        }
    }

    fn fetch_text(&self, url: &str) -> Option<String> {
        let bytes = self.fetcher.fetch(url)?;
        match String::from_utf8(bytes) {
            Ok(text) if !text.trim().is_empty() => Some(text),
            _ => {
                log!("warning"; "loader at {} is not usable text", url);
                None
            }
        }
    }

    /// Insert the loader nodes before the first child of `<head>`.
    ///
    /// Earlier injections with the same ids are replaced.
    pub fn inject(doc: &mut Document, head: NodeId, options: &Options, assets: &LoaderAssets) {
        for id in marker::INJECTED_IDS {
            while let Some(node) = doc.element_by_id(id) {
                doc.detach(node);
            }
        }

        let mut nodes = Vec::with_capacity(3);
        if !options.manually_add_deferjs {
            let loader = match &assets.library {
                Some(code) => {
                    let node = script(doc, marker::LOADER_ID, &[]);
                    doc.set_text_content(node, code.as_str());
                    node
                }
                None => script(doc, marker::LOADER_ID, &[("src", options.deferjs_src.trim())]),
            };
            nodes.push(loader);
        }

        let helper = script(doc, marker::HELPER_ID, &[]);
        doc.set_text_content(helper, assets.helper.as_str());
        nodes.push(helper);

        if options.use_css_fadein_effects || options.use_color_placeholder || options.optimize_fallback {
            let style = doc.create_element_with("style", Attrs::from([("id", marker::STYLE_ID)]));
            doc.set_text_content(style, assets.style.as_str());
            nodes.push(style);
        }

        let first = doc.children(head).first().copied();
        for node in nodes {
            doc.mark_optimized(node);
            match first {
                Some(first) => doc.insert_before(first, node),
                None => doc.append_child(head, node),
            }
        }
    }
}

fn script(doc: &mut Document, id: &str, extra: &[(&str, &str)]) -> NodeId {
    let mut attrs = Attrs::from([("id", id)]);
    for (name, value) in extra {
        attrs.set(name, *value);
    }
    doc.create_element_with("script", attrs)
}

fn memo_key(options: &Options, host: &str) -> String {
    format!(
        "{}|{}|{}|{}|{}",
        host.to_ascii_lowercase(),
        options.deferjs_src.trim(),
        options.polyfill_src.trim(),
        options.inline_deferjs,
        options.manually_add_deferjs,
    )
}

fn host_label(host: &str) -> &str {
    if host.is_empty() { "<any host>" } else { host }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_document;
    use crate::fetch::NoFetch;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn head_of(doc: &Document) -> NodeId {
        doc.head().unwrap()
    }

    #[test]
    fn test_bundled_fallback_for_default_src() {
        let assembler = LoaderAssembler::new(AssetCache::memory(), Box::new(NoFetch));
        let assets = assembler.assets(&Options::default(), "").unwrap();
        let library = assets.library.as_deref().unwrap();
        assert!(library.contains("IntersectionObserver"));
        assert!(library.contains("Defer"));
    }

    #[test]
    fn test_custom_src_unavailable_is_fatal() {
        let assembler = LoaderAssembler::new(AssetCache::memory(), Box::new(NoFetch));
        let options = Options {
            deferjs_src: "https://cdn.test/custom.js".into(),
            ..Options::default()
        };
        assert!(matches!(
            assembler.assets(&options, ""),
            Err(OptimizeError::LoaderUnavailable(_))
        ));

        // a src reference needs no fetch
        let options = Options {
            inline_deferjs: false,
            ..options
        };
        let assets = assembler.assets(&options, "").unwrap();
        assert!(assets.library.is_none());
        assert!(assets.helper.contains("IntersectionObserver"));
    }

    #[test]
    fn test_fetch_is_cached_and_memoized() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let fetcher = move |_: &str| {
            counter.fetch_add(1, Ordering::SeqCst);
            Some(b"window.Defer=function(){};".to_vec())
        };
        let assembler = LoaderAssembler::new(AssetCache::memory(), Box::new(fetcher));
        let options = Options::default();

        assembler.assets(&options, "a.test").unwrap();
        assembler.assets(&options, "a.test").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // another host is keyed separately
        assembler.assets(&options, "b.test").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        // after a memo reset the cache answers
        assembler.reset();
        assembler.assets(&options, "a.test").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_failed_cache_writes_are_not_fatal() {
        let dir = tempfile::TempDir::new().unwrap();
        let cache_dir = dir.path().join("cache");
        let cache = AssetCache::on_disk(&cache_dir).unwrap();
        std::fs::remove_dir_all(&cache_dir).unwrap();

        let fetcher = |_: &str| Some(b"window.Defer=function(){};".to_vec());
        let assembler = LoaderAssembler::new(cache, Box::new(fetcher));
        assert!(assembler.cache().set("k", "v", 60).is_err());

        let assets = assembler.assets(&Options::default(), "a.test").unwrap();
        assert!(assets.library.as_deref().unwrap().contains("Defer"));
    }

    #[test]
    fn test_inject_order_and_replacement() {
        let assembler = LoaderAssembler::new(AssetCache::memory(), Box::new(NoFetch));
        let options = Options::default();
        let mut doc = parse_document(
            r#"<html><head><meta charset="utf-8"><script id="defer-js">old()</script></head><body></body></html>"#,
        )
        .unwrap();
        let head = head_of(&doc);
        let assets = assembler.assets(&options, "").unwrap();
        LoaderAssembler::inject(&mut doc, head, &options, &assets);

        let ids: Vec<_> = doc
            .child_elements(head)
            .map(|c| doc.attr(c, "id").unwrap_or_default().to_string())
            .collect();
        assert_eq!(ids, vec!["defer-js", "defer-script", "defer-css", ""]);
        assert!(!doc.inner_html(head).contains("old()"));
    }

    #[test]
    fn test_manual_loader() {
        let assembler = LoaderAssembler::new(AssetCache::memory(), Box::new(NoFetch));
        let options = Options {
            manually_add_deferjs: true,
            ..Options::default()
        };
        let mut doc = parse_document("<html><head></head><body></body></html>").unwrap();
        let head = head_of(&doc);
        let assets = assembler.assets(&options, "").unwrap();
        LoaderAssembler::inject(&mut doc, head, &options, &assets);
        assert!(doc.element_by_id("defer-js").is_none());
        assert!(doc.element_by_id("defer-script").is_some());
    }
}
