//! Logging with colored module prefixes.
//!
//! - `log!` prints `[module] message` to stderr
//! - `debug!` prints only when verbose mode is enabled
//!
//! # Example
//!
//! ```ignore
//! log!("cache"; "invalid cache directory {}", path.display());
//! debug!("registry"; "dropped duplicate hint {}", name);
//! ```
//!
//! Everything goes to stderr so optimized HTML on stdout stays clean.

use owo_colors::OwoColorize;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

/// Set by `--verbose`.
static VERBOSE: AtomicBool = AtomicBool::new(false);

pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

/// Log a message with a colored module prefix
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {
        $crate::logger::log($module, &format!($($arg)*))
    };
}

/// Like `log!`, but only with `--verbose`. Arguments are not evaluated
/// otherwise.
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    };
}

pub fn log(module: &str, message: &str) {
    // one locked write per line keeps parallel output whole
    let mut err = io::stderr().lock();
    write_line(&mut err, module, message).ok();
}

fn write_line(out: &mut impl Write, module: &str, message: &str) -> io::Result<()> {
    writeln!(out, "{} {message}", prefix(module))?;
    out.flush()
}

/// Color by module family; unknown modules are yellow.
fn prefix(module: &str) -> String {
    let tag = format!("[{module}]");
    match module.to_ascii_lowercase().as_str() {
        "error" => tag.bright_red().bold().to_string(),
        "warning" => tag.bright_magenta().bold().to_string(),
        "optimize" => tag.bright_blue().bold().to_string(),
        "cache" | "loader" | "fetch" => tag.bright_green().bold().to_string(),
        _ => tag.bright_yellow().bold().to_string(),
    }
}
