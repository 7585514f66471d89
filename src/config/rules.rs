//! Compiled `ignore_lazyload_*` rules.
//!
//! Rules are compiled once per optimizer. A pattern that fails to compile is
//! dropped with a debug message, which makes it behave as a rule that never
//! matches.

use regex::Regex;
use scraper::Selector;

use super::Options;
use crate::debug;
use crate::dom::parse_selector;

#[derive(Debug, Clone, Default)]
pub struct LazyloadRules {
    /// Regexes tested against resource URLs.
    paths: Vec<Regex>,
    /// Substrings tested against the element's markup.
    texts: Vec<String>,
    /// Class names that opt an element out.
    classes: Vec<String>,
    /// Selectors whose matches get the no-lazy marker before the sweeps.
    pub selectors: Vec<Selector>,
}

impl LazyloadRules {
    pub fn from_options(options: &Options) -> Self {
        let paths = options
            .ignore_lazyload_paths
            .iter()
            .filter(|p| !p.trim().is_empty())
            .filter_map(|p| match Regex::new(p) {
                Ok(re) => Some(re),
                Err(e) => {
                    debug!("rules"; "skipping invalid path pattern `{}`: {}", p, e);
                    None
                }
            })
            .collect();

        let selectors = options
            .ignore_lazyload_css_selectors
            .iter()
            .filter(|s| !s.trim().is_empty())
            .filter_map(|s| match parse_selector(s) {
                Ok(selector) => Some(selector),
                Err(e) => {
                    debug!("rules"; "skipping invalid selector `{}`: {}", s, e);
                    None
                }
            })
            .collect();

        Self {
            paths,
            texts: non_empty(&options.ignore_lazyload_texts),
            classes: non_empty(&options.ignore_lazyload_css_class),
            selectors,
        }
    }

    /// True when a URL matches any path rule.
    pub fn matches_path(&self, url: &str) -> bool {
        !url.is_empty() && self.paths.iter().any(|re| re.is_match(url))
    }

    /// True when the markup contains any configured text.
    pub fn matches_text(&self, markup: &str) -> bool {
        self.texts.iter().any(|t| markup.contains(t.as_str()))
    }

    /// True when any class in a `class` attribute value is blacklisted.
    pub fn matches_class(&self, class_attr: &str) -> bool {
        class_attr
            .split_ascii_whitespace()
            .any(|c| self.classes.iter().any(|b| b == c))
    }

    pub fn has_text_rules(&self) -> bool {
        !self.texts.is_empty()
    }
}

fn non_empty(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
