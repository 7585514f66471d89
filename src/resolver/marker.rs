//! Attribute, class and id names shared by the resolvers, the optimizer and
//! the bundled runtime (`embed/assets`).

/// Element (and its subtree) is left untouched.
pub const IGNORE_ATTR: &str = "data-ignore";

/// Element is never lazyloaded.
pub const NOLAZY_ATTR: &str = "data-nolazy";

/// Element waits for the runtime to reveal it.
pub const LAZY_CLASS: &str = "defer-loading";

/// Lazy element followed by a `<noscript>` fallback.
pub const FALLBACK_CLASS: &str = "defer-has-fallback";

/// Background tint for lazy images when color placeholders are on.
pub const COLOR_CLASS: &str = "defer-color";

/// `<html>` class removed by the runtime; styles key the no-script case on it.
pub const NO_LOADER_CLASS: &str = "no-deferjs";

/// `<html>` class enabling fade-in transitions.
pub const FADEIN_CLASS: &str = "defer-fading";

/// Wrapper around the custom splash screen.
pub const SPLASH_CLASS: &str = "defer-splash";

/// Debug sequence number of a rewritten element.
pub const DEBUG_ATTR: &str = "data-defer-debug";

/// Script type executed by the runtime after page load.
pub const DEFERJS_TYPE: &str = "deferjs";

pub const LOADER_ID: &str = "defer-js";
pub const HELPER_ID: &str = "defer-script";
pub const STYLE_ID: &str = "defer-css";

/// Ids of every node the loader injection owns.
pub const INJECTED_IDS: [&str; 3] = [LOADER_ID, HELPER_ID, STYLE_ID];
