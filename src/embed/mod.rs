//! Bundled loader assets.
//!
//! - `DEFER_JS` - local copy of the loader library, used when the configured
//!   library cannot be fetched
//! - `POLYFILL_GUARD_JS` - loads the IntersectionObserver polyfill on demand
//! - `HELPER_JS` - starts lazy reveal and deferred script execution
//! - `FADEIN_CSS` - fade-in and fallback styles
//!
//! # Usage
//!
//! ```ignore
//! use embed::{HELPER_JS, HelperVars};
//!
//! let js = HELPER_JS.render(&HelperVars { delay: 0 });
//! ```

mod template;

pub use template::{Template, TemplateVars};

/// Bundled loader library.
pub const DEFER_JS: &str = include_str!("assets/defer.js");

/// Fade-in, color placeholder and no-script fallback styles.
pub const FADEIN_CSS: &str = include_str!("assets/fadein.css");

/// Variables for polyfill.js.
pub struct PolyfillVars {
    pub polyfill_src: String,
}

impl TemplateVars for PolyfillVars {
    fn placeholders(&self) -> Vec<(&'static str, String)> {
        // a JSON string is a valid JS string literal
        let quoted = serde_json::to_string(&self.polyfill_src).unwrap_or_else(|_| "\"\"".into());
        vec![("__DEFER_POLYFILL_SRC__", quoted)]
    }
}

/// Polyfill guard prepended to the loader library.
pub const POLYFILL_GUARD_JS: Template<PolyfillVars> =
    Template::new(include_str!("assets/polyfill.js"));

/// Variables for helpers.js.
pub struct HelperVars {
    /// Milliseconds after `load` before lazy work starts.
    pub delay: u32,
}

impl TemplateVars for HelperVars {
    fn placeholders(&self) -> Vec<(&'static str, String)> {
        vec![("__DEFER_DELAY__", self.delay.to_string())]
    }
}

/// Runtime helper injected as `#defer-script`.
pub const HELPER_JS: Template<HelperVars> = Template::new(include_str!("assets/helpers.js"));
