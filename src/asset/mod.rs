//! Inline asset processing.

pub mod minify;
