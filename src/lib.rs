//! deferhtml - rewrite server-rendered HTML for faster first paint.
//!
//! Media, iframes, backgrounds, scripts and third-party stylesheets are
//! handed to a small client-side loader, resource hints are gathered and
//! deduplicated, render-blocking elements are moved out of the way and
//! inline assets are minified.
//!
//! ```ignore
//! use deferhtml::{Optimizer, Options};
//!
//! let optimizer = Optimizer::new(Options::default())?;
//! let html = optimizer.optimize_for_host(&source, "example.com")?;
//! ```

pub mod logger;

pub mod asset;
pub mod cache;
pub mod cli;
pub mod config;
pub mod dom;
pub mod embed;
pub mod fetch;
pub mod optimizer;
pub mod resolver;
pub mod utils;

pub use config::{ConfigError, Options};
pub use optimizer::{OptimizeError, Optimizer};
