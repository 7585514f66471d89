//! Optimizer options.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── error        # ConfigError
//! ├── model        # OptionsModel (AMP override / restore)
//! ├── rules        # compiled ignore-lazyload rules
//! ├── third_party  # ThirdParty switch and well-known domain table
//! └── mod.rs       # Options (this file)
//! ```
//!
//! Options are a flat, snake_case record. Every key is optional; unknown keys
//! are reported as warnings and otherwise ignored.
//!
//! ```toml
//! enable_lazyloading = true
//! defer_third_party = ["widgets.example.net"]
//! ignore_lazyload_css_selectors = [".hero img"]
//! offline_cache_path = "~/.cache/deferhtml"
//! ```

mod error;
mod model;
mod rules;
mod third_party;

pub use error::ConfigError;
pub use model::OptionsModel;
pub use rules::LazyloadRules;
pub use third_party::{KNOWN_THIRD_PARTY, ThirdParty};

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::log;

/// Version of the bundled loader library; part of loader cache keys.
pub const DEFERJS_VERSION: &str = "3.9.0";

/// CDN location of the loader library matching [`DEFERJS_VERSION`].
pub const DEFAULT_DEFERJS_SRC: &str =
    "https://cdn.jsdelivr.net/npm/@shinsenter/defer.js@3.9.0/dist/defer_plus.min.js";

/// IntersectionObserver polyfill for old browsers.
pub const DEFAULT_POLYFILL_SRC: &str =
    "https://cdn.jsdelivr.net/npm/intersection-observer@0.12.2/intersection-observer.js";

// ============================================================================
// Options
// ============================================================================

/// Every switch consulted while optimizing a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    // global switches
    pub enable_lazyloading: bool,
    pub enable_preloading: bool,
    pub enable_dns_prefetch: bool,
    pub fix_render_blocking: bool,

    // per-category sweeps
    pub optimize_css: bool,
    pub optimize_scripts: bool,
    pub optimize_images: bool,
    pub optimize_iframes: bool,
    pub optimize_background: bool,
    pub optimize_anchors: bool,
    pub optimize_fallback: bool,

    // document level
    pub add_missing_meta_tags: bool,
    pub minify_output_html: bool,
    pub debug_mode: bool,
    pub use_css_fadein_effects: bool,
    pub use_color_placeholder: bool,
    pub custom_splash_screen: String,

    // lazyload blacklists
    pub ignore_lazyload_paths: Vec<String>,
    pub ignore_lazyload_texts: Vec<String>,
    pub ignore_lazyload_css_class: Vec<String>,
    pub ignore_lazyload_css_selectors: Vec<String>,

    pub defer_third_party: ThirdParty,

    // placeholders
    pub img_placeholder: String,
    pub iframe_placeholder: String,

    // loader
    pub deferjs_src: String,
    pub polyfill_src: String,
    pub offline_cache_path: String,
    pub offline_cache_ttl: u64,
    pub manually_add_deferjs: bool,
    pub inline_deferjs: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            enable_lazyloading: true,
            enable_preloading: true,
            enable_dns_prefetch: true,
            fix_render_blocking: true,

            optimize_css: true,
            optimize_scripts: true,
            optimize_images: true,
            optimize_iframes: true,
            optimize_background: true,
            optimize_anchors: true,
            optimize_fallback: true,

            add_missing_meta_tags: true,
            minify_output_html: true,
            debug_mode: false,
            use_css_fadein_effects: true,
            use_color_placeholder: false,
            custom_splash_screen: String::new(),

            ignore_lazyload_paths: Vec::new(),
            ignore_lazyload_texts: Vec::new(),
            ignore_lazyload_css_class: Vec::new(),
            ignore_lazyload_css_selectors: Vec::new(),

            defer_third_party: ThirdParty::Enabled(true),

            img_placeholder: String::new(),
            iframe_placeholder: "about:blank".to_string(),

            deferjs_src: DEFAULT_DEFERJS_SRC.to_string(),
            polyfill_src: DEFAULT_POLYFILL_SRC.to_string(),
            offline_cache_path: String::new(),
            offline_cache_ttl: 86_400,
            manually_add_deferjs: false,
            inline_deferjs: true,
        }
    }
}

impl Options {
    /// Parse options from TOML; unknown keys are logged and ignored.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let options = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        warn_unknown(&ignored, "options");
        Ok(options)
    }

    /// Load options from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_toml_str(&content)
    }

    /// Build options from a flat JSON-style map (e.g. embedding host settings).
    pub fn from_map(map: serde_json::Map<String, serde_json::Value>) -> Result<Self, ConfigError> {
        let mut ignored = Vec::new();
        let options = serde_ignored::deserialize(
            serde_json::Value::Object(map),
            |path: serde_ignored::Path| ignored.push(path.to_string()),
        )?;
        warn_unknown(&ignored, "options map");
        Ok(options)
    }

    /// Cache directory with `~` expanded; `None` selects the in-memory cache.
    pub fn cache_dir(&self) -> Option<PathBuf> {
        let raw = self.offline_cache_path.trim();
        if raw.is_empty() {
            return None;
        }
        Some(PathBuf::from(shellexpand::tilde(raw).into_owned()))
    }

    /// Switch off everything an AMP page does not allow.
    pub fn apply_amp_profile(&mut self) {
        self.enable_lazyloading = false;
        self.enable_preloading = false;
        self.enable_dns_prefetch = false;
        self.fix_render_blocking = false;
        self.defer_third_party = ThirdParty::Enabled(false);
        self.use_css_fadein_effects = false;
        self.use_color_placeholder = false;
        self.custom_splash_screen.clear();
    }
}

/// Print warning about unknown keys.
fn warn_unknown(fields: &[String], source: &str) {
    if fields.is_empty() {
        return;
    }
    log!("warning"; "unknown keys in {}, ignoring: {}", source, fields.join(", "));
}
