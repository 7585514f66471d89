//! Command-line interface definitions.

use clap::{ColorChoice, Parser};
use std::path::PathBuf;

/// Rewrite HTML documents for faster first paint
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// HTML files to optimize (`-` reads stdin)
    #[arg(required = true, value_hint = clap::ValueHint::FilePath)]
    pub inputs: Vec<PathBuf>,

    /// Output file, or directory when several inputs are given (default: stdout)
    #[arg(short, long, value_hint = clap::ValueHint::AnyPath)]
    pub output: Option<PathBuf>,

    /// Options file (TOML)
    #[arg(short = 'C', long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Host the documents are served from, used to tell external resources apart
    #[arg(long)]
    pub host: Option<String>,

    /// Print debug messages
    #[arg(short, long)]
    pub verbose: bool,

    /// Control colored output (auto, always, never)
    #[arg(long, default_value = "auto")]
    pub color: ColorChoice,
}

impl Cli {
    pub fn host(&self) -> &str {
        self.host.as_deref().map(str::trim).unwrap_or_default()
    }

    /// Read from stdin instead of files.
    pub fn is_stdin(&self) -> bool {
        matches!(self.inputs.as_slice(), [only] if only.as_os_str() == "-")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() {
        let cli = Cli::try_parse_from([
            "deferhtml",
            "a.html",
            "b.html",
            "-o",
            "out",
            "-C",
            "defer.toml",
            "--host",
            " example.com ",
            "--verbose",
        ])
        .unwrap();
        assert_eq!(cli.inputs.len(), 2);
        assert_eq!(cli.output, Some(PathBuf::from("out")));
        assert_eq!(cli.config, Some(PathBuf::from("defer.toml")));
        assert_eq!(cli.host(), "example.com");
        assert!(cli.verbose);
        assert!(!cli.is_stdin());
    }

    #[test]
    fn test_inputs_required() {
        assert!(Cli::try_parse_from(["deferhtml"]).is_err());
        let cli = Cli::try_parse_from(["deferhtml", "-"]).unwrap();
        assert!(cli.is_stdin());
        assert_eq!(cli.host(), "");
    }
}
