//! The `deferhtml` command: optimize files in parallel.
//!
//! Each document is optimized on one thread; rayon spreads the documents.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use rayon::prelude::*;

use super::Cli;
use crate::config::Options;
use crate::optimizer::Optimizer;
use crate::{debug, log};

/// Where an optimized document goes.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Stdout,
    File(PathBuf),
}

pub fn run(cli: &Cli) -> Result<()> {
    let options = match &cli.config {
        Some(path) => Options::load(path)?,
        None => Options::default(),
    };
    let optimizer = Optimizer::new(options)?;
    let host = cli.host();

    if cli.is_stdin() {
        let mut html = String::new();
        io::stdin()
            .read_to_string(&mut html)
            .context("failed to read stdin")?;
        let out = optimizer.optimize_for_host(&html, host)?;
        return write_target(&target_for_stdin(cli.output.as_deref()), &out);
    }

    let jobs = plan(&cli.inputs, cli.output.as_deref())?;
    let failed: Vec<(PathBuf, anyhow::Error)> = jobs
        .par_iter()
        .filter_map(|(input, target)| {
            optimize_file(&optimizer, input, target, host)
                .err()
                .map(|e| (input.clone(), e))
        })
        .collect();

    for (input, err) in &failed {
        log!("error"; "{}: {:#}", input.display(), err);
    }
    let done = jobs.len() - failed.len();
    if jobs.len() > 1 {
        log!("optimize"; "{} of {} file(s) optimized", done, jobs.len());
    }
    if !failed.is_empty() {
        bail!("{} file(s) failed", failed.len());
    }
    Ok(())
}

fn optimize_file(optimizer: &Optimizer, input: &Path, target: &Target, host: &str) -> Result<()> {
    let html = fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let out = optimizer.optimize_for_host(&html, host)?;
    debug!(
        "optimize"; "{}: {} -> {} bytes",
        input.display(),
        html.len(),
        out.len()
    );
    write_target(target, &out)
}

/// Pair every input with its target.
///
/// One input writes to stdout or to `output`; several inputs need `output`
/// as a directory and keep their file names.
fn plan(inputs: &[PathBuf], output: Option<&Path>) -> Result<Vec<(PathBuf, Target)>> {
    match (inputs, output) {
        ([input], None) => Ok(vec![(input.clone(), Target::Stdout)]),
        ([input], Some(out)) if !out.is_dir() => {
            Ok(vec![(input.clone(), Target::File(out.to_path_buf()))])
        }
        (_, None) => bail!("{} inputs given, pass an output directory with -o", inputs.len()),
        (_, Some(dir)) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
            inputs
                .iter()
                .map(|input| {
                    let name = input
                        .file_name()
                        .with_context(|| format!("{} has no file name", input.display()))?;
                    Ok((input.clone(), Target::File(dir.join(name))))
                })
                .collect()
        }
    }
}

fn target_for_stdin(output: Option<&Path>) -> Target {
    match output {
        Some(path) => Target::File(path.to_path_buf()),
        None => Target::Stdout,
    }
}

fn write_target(target: &Target, html: &str) -> Result<()> {
    match target {
        Target::Stdout => {
            let mut out = io::stdout().lock();
            out.write_all(html.as_bytes())?;
            out.flush()?;
        }
        Target::File(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, html).with_context(|| format!("failed to write {}", path.display()))?;
        }
    }
    Ok(())
}
