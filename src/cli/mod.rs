/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Command-line interface structs, functions, and methods.

use crate::tables::*;
use anyhow::{Context, Result};
use clap::{Args, Parser};
use jiff::fmt::friendly::{Designator, Spacing, SpanPrinter};
use jiff::SpanRound;
use log::info;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Shared CLI arguments for commands that specify a number of threads.
#[derive(Args, Debug)]
pub struct NumThreadsArg {
    #[arg(short = 'j', long, default_value_t = rayon::current_num_threads().max(1))]
    /// The number of threads to use
    pub num_threads: usize,
}

#[derive(Parser, Debug)]
#[command(
    name = "ens-compress",
    version,
    about = "Compiles ENS normalization tables into compact binary blobs.",
    long_about = None,
    after_help = "Environment (noteworthy environment variables used):
RUST_LOG: configuration for env_logger, pass `info` to see the sizes of the
  blobs and the progress of the optimizer, `debug` to see all the details."
)]
pub struct CliArgs {
    /// The JSON document describing the Unicode normalization tables.
    pub nf: PathBuf,
    /// The JSON document describing the name normalization specification.
    pub spec: PathBuf,
    /// The directory where nf.bin and spec.bin will be written.
    pub out_dir: PathBuf,

    #[arg(long)]
    /// Search for the code family yielding the shortest blobs instead of
    /// using the tuned ones (slow).
    pub optimize: bool,

    #[clap(flatten)]
    pub num_threads: NumThreadsArg,
}

/// Creates a threadpool with the given number of threads
pub fn get_thread_pool(num_threads: usize) -> Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .context("Failed to create thread pool")
}

/// Writes a blob, padded to [`ALIGN`] bytes, to `path`.
pub fn write_blob(path: impl AsRef<Path>, blob: &Blob) -> Result<()> {
    let path = path.as_ref();
    let bytes = blob.aligned();
    std::fs::write(path, &bytes)
        .with_context(|| format!("Could not write {}", path.display()))?;
    info!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// Loads both source documents, builds and verifies both blobs and writes
/// them to `out_dir`.
pub fn compile_files(
    nf: impl AsRef<Path>,
    spec: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
    optimize: bool,
) -> Result<()> {
    let nf = NfTables::try_from(load_json::<NfDocument>(nf)?)?;
    let spec = SpecTables::try_from(load_json::<SpecDocument>(spec)?)?;
    let nf_blob = nf.build(optimize)?;
    let spec_blob = spec.build(optimize)?;

    let out_dir = out_dir.as_ref();
    std::fs::create_dir_all(out_dir).with_context(|| {
        format!(
            "Failed to create the directory {:?}",
            out_dir.to_string_lossy()
        )
    })?;
    write_blob(out_dir.join("nf.bin"), &nf_blob)?;
    write_blob(out_dir.join("spec.bin"), &spec_blob)?;
    Ok(())
}

/// Initializes the `env_logger` logger, at level `info` unless `RUST_LOG`
/// says otherwise, with a format including timestamps and the time elapsed
/// since initialization.
pub fn init_env_logger() -> Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));

    let start = std::time::Instant::now();
    let printer = SpanPrinter::new()
        .spacing(Spacing::None)
        .designator(Designator::Compact);
    let span_round = SpanRound::new()
        .largest(jiff::Unit::Day)
        .smallest(jiff::Unit::Millisecond)
        .days_are_24_hours();

    builder.format(move |buf, record| {
        let Ok(ts) = jiff::Timestamp::try_from(SystemTime::now()) else {
            return Err(std::io::Error::other("Failed to get timestamp"));
        };
        let style = buf.default_level_style(record.level());
        let elapsed = start.elapsed();
        let span = jiff::Span::new()
            .seconds(elapsed.as_secs() as i64)
            .milliseconds(elapsed.subsec_millis() as i64);
        let span = span.round(span_round).map_err(std::io::Error::other)?;
        writeln!(
            buf,
            "{} {} {style}{}{style:#} [{:?}] {} - {}",
            ts.strftime("%F %T%.3f"),
            printer.span_to_string(&span),
            record.level(),
            std::thread::current().id(),
            record.target(),
            record.args()
        )
    });
    builder.try_init()?;
    Ok(())
}

/// The entry point of the command-line interface.
pub fn main<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let start = std::time::Instant::now();
    let args = CliArgs::parse_from(args);

    let thread_pool = get_thread_pool(args.num_threads.num_threads)?;
    thread_pool.install(|| compile_files(&args.nf, &args.spec, &args.out_dir, args.optimize))?;

    info!(
        "The compilation took {}",
        pretty_print_elapsed(start.elapsed().as_secs_f64())
    );
    Ok(())
}

/// Pretty prints seconds in a humanly readable format.
fn pretty_print_elapsed(elapsed: f64) -> String {
    let mut result = String::new();
    let mut elapsed_seconds = elapsed as u64;
    let hours = elapsed_seconds / (60 * 60);
    elapsed_seconds %= 60 * 60;
    let minutes = elapsed_seconds / 60;

    match hours {
        0 => {}
        1 => result.push_str("1 hour "),
        _ => result.push_str(&format!("{} hours ", hours)),
    }
    match minutes {
        0 => {}
        1 => result.push_str("1 minute "),
        _ => result.push_str(&format!("{} minutes ", minutes)),
    }

    result.push_str(&format!("{:.3} seconds ({}s)", elapsed % 60.0, elapsed));
    result
}
