use crate::config::ResolvedConfig;
use crate::constants::{APP_ABOUT, APP_AUTHOR, APP_NAME, APP_VERSION};
use crate::downloader::{
    compile_selector, download_all, plan_targets, scrape_links, split_extensions, DownloadTarget,
    LinkFilter,
};
use crate::errors::{AppError, AppResult};
use crate::manifest::Manifest;
use crate::models::Mode;
use crate::ui;
use crate::utils::{format_bytes, format_duration};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::collections::HashSet;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};
use url::Url;

/// Everything the command line asked for, before it is merged with the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOptions {
    pub urls: Vec<String>,
    pub links: bool,
    pub pattern: Option<String>,
    pub extensions: Vec<String>,
    pub same_host: bool,
    pub selector: Option<String>,
    pub dry_run: bool,
    pub output_dir: Option<PathBuf>,
    pub jobs: Option<usize>,
    pub retries: Option<u32>,
    pub force: bool,
    pub config: Option<PathBuf>,
    pub verbosity: u8,
    pub show_manifest: bool,
}

/// Builds the `dl` command definition.
pub fn build_command() -> Command {
    Command::new(APP_NAME)
        .version(APP_VERSION)
        .author(APP_AUTHOR)
        .about(APP_ABOUT)
        .after_help(
            "Examples:\n  dl https://example.com/file.iso\n  dl -l -x zip -j 8 https://example.com/releases/",
        )
        .arg(
            Arg::new("url")
                .help("URLs to download, or pages to scrape with --links")
                .num_args(1..)
                .required_unless_present("manifest")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("links")
                .short('l')
                .long("links")
                .help("Treat each URL as an HTML page and download the files it links to")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("pattern")
                .short('p')
                .long("pattern")
                .help("Only follow links whose absolute URL matches this regex")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("ext")
                .short('x')
                .long("ext")
                .help("Only follow links with this file extension (repeatable, comma separated)")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("same_host")
                .long("same-host")
                .help("Only follow links on the same host as the page")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("selector")
                .long("selector")
                .help("CSS selector for link elements (default: a[href])")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("dry_run")
                .short('n')
                .long("dry-run")
                .help("Print the URL and filename of every planned download and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("output_dir")
                .short('o')
                .long("output-dir")
                .help("Directory to save files in")
                .value_parser(clap::value_parser!(PathBuf))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("jobs")
                .short('j')
                .long("jobs")
                .help("Number of downloads run in parallel")
                .value_parser(clap::value_parser!(usize))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("retries")
                .short('r')
                .long("retries")
                .help("Retry attempts for transient failures")
                .value_parser(clap::value_parser!(u32))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("force")
                .short('f')
                .long("force")
                .help("Overwrite files that already exist")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Path to a TOML config file")
                .value_parser(clap::value_parser!(PathBuf))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("More log output (repeatable)")
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("manifest")
                .long("manifest")
                .help("Print the package manifest and exit")
                .action(ArgAction::SetTrue),
        )
}

impl CliOptions {
    pub fn from_matches(matches: &ArgMatches) -> AppResult<Self> {
        let strings = |id: &str| -> Vec<String> {
            matches
                .get_many::<String>(id)
                .map(|values| values.cloned().collect())
                .unwrap_or_default()
        };

        let options = Self {
            urls: strings("url"),
            links: matches.get_flag("links"),
            pattern: matches.get_one::<String>("pattern").cloned(),
            extensions: split_extensions(&strings("ext")),
            same_host: matches.get_flag("same_host"),
            selector: matches.get_one::<String>("selector").cloned(),
            dry_run: matches.get_flag("dry_run"),
            output_dir: matches.get_one::<PathBuf>("output_dir").cloned(),
            jobs: matches.get_one::<usize>("jobs").copied(),
            retries: matches.get_one::<u32>("retries").copied(),
            force: matches.get_flag("force"),
            config: matches.get_one::<PathBuf>("config").cloned(),
            verbosity: matches.get_count("verbose"),
            show_manifest: matches.get_flag("manifest"),
        };
        options.validate()?;
        Ok(options)
    }

    fn validate(&self) -> AppResult<()> {
        let filter_flags = self.pattern.is_some()
            || !self.extensions.is_empty()
            || self.same_host
            || self.selector.is_some();
        if filter_flags && !self.links {
            return Err(AppError::InvalidInput(
                "--pattern, --ext, --same-host and --selector require --links".into(),
            ));
        }
        if self.jobs == Some(0) {
            return Err(AppError::InvalidInput(
                "--jobs must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    pub fn mode(&self) -> Mode {
        if self.links {
            Mode::Links
        } else {
            Mode::Direct
        }
    }

    /// Merges defaults, the config file and command-line overrides, in that order.
    pub fn resolve_config(&self) -> AppResult<ResolvedConfig> {
        let mut config = match &self.config {
            Some(path) => ResolvedConfig::from_toml_file(path)?,
            None => ResolvedConfig::default(),
        };
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(jobs) = self.jobs {
            config.concurrent_downloads = jobs;
        }
        if let Some(retries) = self.retries {
            config.max_retries = retries;
        }
        if let Some(selector) = &self.selector {
            config.link_selector = selector.clone();
        }
        if self.force {
            config.overwrite = true;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn link_filter(&self) -> AppResult<LinkFilter> {
        LinkFilter::new(self.pattern.as_deref(), &self.extensions, self.same_host)
    }
}

/// Parses an absolute http(s) URL given on the command line.
pub fn parse_input_url(raw: &str) -> AppResult<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| AppError::UrlError(format!("'{raw}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(AppError::UrlError(format!(
            "'{raw}': unsupported scheme '{scheme}'"
        ))),
    }
}

/// Parses the process arguments.
pub fn parse_args() -> AppResult<CliOptions> {
    let matches = build_command().get_matches();
    CliOptions::from_matches(&matches)
}

/// Resolves the URLs to download: the inputs themselves, or the links scraped from them.
///
/// Links found on several pages are kept once, in first-seen order.
async fn collect_urls(
    client: &reqwest::Client,
    options: &CliOptions,
    config: &ResolvedConfig,
) -> AppResult<Vec<Url>> {
    let inputs = options
        .urls
        .iter()
        .map(|raw| parse_input_url(raw))
        .collect::<AppResult<Vec<_>>>()?;

    if options.mode() == Mode::Direct {
        return Ok(inputs);
    }

    let selector = compile_selector(&config.link_selector)?;
    let filter = options.link_filter()?;
    let mut seen = HashSet::new();
    let mut urls = Vec::new();
    for page in &inputs {
        let spinner = ui::create_spinner(format!("Fetching {page}"))?;
        let links = scrape_links(client, page, &selector, &filter, config.timeout()).await;
        spinner.finish_and_clear();
        for link in links? {
            if seen.insert(link.clone()) {
                urls.push(link);
            }
        }
    }
    Ok(urls)
}

fn print_plan<W: Write>(out: &mut W, targets: &[DownloadTarget]) -> AppResult<()> {
    for target in targets {
        writeln!(out, "{}\t{}", target.url, target.filename)?;
    }
    Ok(())
}

/// Runs `dl` with already parsed options, printing to stdout.
///
/// # Errors
///
/// Returns an error when the options or config are invalid, a page cannot be scraped,
/// the output directory cannot be created, or any download fails after retries.
pub async fn run(options: &CliOptions) -> AppResult<()> {
    run_to(options, &mut std::io::stdout()).await
}

/// Same as [`run`], but writes the manifest and `--dry-run` plan to `out`.
///
/// Logs and progress still go to stderr.
pub async fn run_to<W: Write>(options: &CliOptions, out: &mut W) -> AppResult<()> {
    if options.show_manifest {
        write!(out, "{}", Manifest::current().to_toml()?)?;
        return Ok(());
    }

    let config = options.resolve_config()?;
    let client = config.http_client()?;
    let started = Instant::now();

    info!(
        mode = options.mode().display_name(),
        inputs = options.urls.len(),
        output_dir = %config.output_dir.display(),
        "Starting dl"
    );

    let urls = collect_urls(&client, options, &config).await?;
    let targets = plan_targets(urls);

    if options.dry_run {
        print_plan(out, &targets)?;
        return Ok(());
    }
    if targets.is_empty() {
        warn!("Nothing to download");
        return Ok(());
    }

    let report = download_all(&client, &targets, &config).await?;

    info!(
        downloaded = report.downloaded(),
        skipped = report.skipped(),
        failed = report.failed(),
        size = %format_bytes(report.total_bytes()),
        elapsed = %format_duration(started.elapsed()),
        "All operations completed"
    );

    report.into_result().map(|_| ())
}
