//! Command-line front end: argument parsing, list files and progress bars.

mod progress;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use console::style;
use indicatif::MultiProgress;

use crate::{AppConfig, DownloadProgress, Error, Orchestrator, Result, is_list_path};

pub use progress::BarProgress;

const BANNER: &str = r"
     _____ _____     ____  __
    |__   |   __|___|    \|  |
    |   __|__   |___|  |  |  |__
    |_____|_____|   |____/|_____|
";

/// Options given on the command line. Unset values fall back to the
/// configuration file.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CliArgs {
    /// Share URLs, container paths, or a single `.txt` list file first.
    pub urls: Vec<String>,
    /// Directory that receives the downloads.
    pub output_path: Option<PathBuf>,
    /// Replace files that already exist.
    pub overwrite: bool,
    /// `<host>:<port>` used for https traffic.
    pub proxy: Option<String>,
}

impl CliArgs {
    /// Applies these options on top of `config`.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(dir) = &self.output_path {
            config.paths.output_dir.clone_from(dir);
        }
        if self.overwrite {
            config.download.force_overwrite = true;
        }
        if self.proxy.is_some() {
            config.download.proxy.clone_from(&self.proxy);
        }
    }
}

/// What the command line asked for.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    /// Download the given URLs.
    Run(CliArgs),
    /// Print usage and exit.
    Help,
}

/// Parses arguments (without the program name).
///
/// `-u/--urls` takes every following value up to the next option. Bare
/// values outside `-u` are treated as URLs as well.
///
/// # Errors
///
/// Returns [`Error::Config`] for unknown options, options missing their
/// value, or when no URL was given.
pub fn parse_args<I>(args: I) -> Result<Command>
where
    I: IntoIterator<Item = String>,
{
    let args: Vec<String> = args.into_iter().collect();
    let mut parsed = CliArgs::default();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-u" | "--urls" => {
                let start = i + 1;
                while i + 1 < args.len() && !args[i + 1].starts_with('-') {
                    i += 1;
                }
                if start > i {
                    return Err(Error::Config(format!("{} expects at least one value", args[i])));
                }
                parsed.urls.extend_from_slice(&args[start..=i]);
            }
            "-o" | "--output-path" => {
                parsed.output_path = Some(PathBuf::from(option_value(&args, &mut i)?));
            }
            "-ov" | "--overwrite" => {
                parsed.overwrite = true;
            }
            "-p" | "--proxy" => {
                parsed.proxy = Some(option_value(&args, &mut i)?.to_string());
            }
            "-h" | "--help" => return Ok(Command::Help),
            arg if !arg.starts_with('-') => parsed.urls.push(arg.to_string()),
            other => return Err(Error::Config(format!("Unknown option: {other}"))),
        }
        i += 1;
    }

    if parsed.urls.is_empty() {
        return Err(Error::Config("the following arguments are required: -u/--urls".into()));
    }
    Ok(Command::Run(parsed))
}

fn option_value<'a>(args: &'a [String], i: &mut usize) -> Result<&'a str> {
    let flag = &args[*i];
    *i += 1;
    args.get(*i)
        .filter(|v| !v.starts_with('-'))
        .map(String::as_str)
        .ok_or_else(|| Error::Config(format!("{flag} expects a value")))
}

/// Reads a newline-delimited URL list, trimming lines and dropping blank ones.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read.
pub async fn read_url_list(path: &Path) -> Result<Vec<String>> {
    let text = tokio::fs::read_to_string(path).await?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect())
}

/// Replaces the candidates with the contents of a list file when the first
/// one names a `.txt` file.
///
/// # Errors
///
/// Returns [`Error::Io`] if the list file cannot be read.
pub async fn resolve_candidates(urls: Vec<String>) -> Result<Vec<String>> {
    match urls.first() {
        Some(first) if is_list_path(first) => {
            log::info!("Reading URLs from {first}");
            read_url_list(Path::new(first)).await
        }
        _ => Ok(urls),
    }
}

fn print_usage() {
    eprintln!("Usage: zs-dl -u <url|dlc|txt>... [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -u, --urls <URL>...        Share URLs or .dlc containers, or a .txt list file");
    eprintln!("  -o, --output-path <DIR>    Output directory (default: current directory)");
    eprintln!("  -ov, --overwrite           Overwrite files that already exist");
    eprintln!("  -p, --proxy <HOST:PORT>    HTTPS proxy");
    eprintln!("  -h, --help                 Show this help");
}

/// Runs the command-line downloader.
///
/// # Errors
///
/// Returns an error for bad arguments, an unreadable configuration or list
/// file, or an output directory that cannot be created. Failures of single
/// URLs are reported on the terminal and do not end the run.
pub async fn run() -> Result<()> {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(Command::Run(args)) => args,
        Ok(Command::Help) => {
            print_usage();
            return Ok(());
        }
        Err(e) => {
            print_usage();
            return Err(e);
        }
    };

    println!("{}", style(BANNER).cyan());

    let mut config = AppConfig::load()?;
    args.apply(&mut config);

    let candidates = resolve_candidates(args.urls).await?;
    if candidates.is_empty() {
        log::info!("No URLs to download");
        return Ok(());
    }

    let orchestrator = Orchestrator::from_config(&config)?;
    let progress: Arc<dyn DownloadProgress> = Arc::new(BarProgress::new(MultiProgress::new()));
    let report = orchestrator
        .run(candidates, &config.paths.output_dir, &progress)
        .await?;

    log::debug!("{} of {} URL(s) failed", report.failed.len(), report.total());
    Ok(())
}
