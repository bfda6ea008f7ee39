//! Part-Scout main entry point
//!
//! This is the command-line interface for the Part-Scout product scraper.

use anyhow::{bail, Context};
use clap::Parser;
use part_scout::config::{build_registry, load_settings, ScraperSettings, Settings};
use part_scout::crawler::{
    BatchOptions, BatchScheduler, Fetcher, ItemEvent, ItemPipeline, RunObserver,
};
use part_scout::input::{count_identifiers, read_identifiers_in_chunks, validate_input_schema};
use part_scout::logging::{init_logging, SecretMask};
use part_scout::notify::{notify_run_complete, NotifyOutcome};
use part_scout::output::{
    generate_summary_report, load_prior_results, print_summary, sink_for, validate_output_schema,
    OutputFormat, PriorResults,
};
use part_scout::state::IN_STOCK_COLUMN;
use part_scout::{ScoutError, SiteConfig, SiteRegistry};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Part-Scout: a configurable two-stage product scraper
///
/// Part-Scout searches a vendor website for each part number in the input
/// file, follows the first product link, extracts the configured fields and
/// writes the results as CSV, JSON or Excel.
#[derive(Parser, Debug)]
#[command(name = "part-scout")]
#[command(version = "1.0.0")]
#[command(about = "A configurable two-stage product scraper", long_about = None)]
struct Cli {
    /// Path to TOML settings file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Site to scrape (see --list-sites)
    #[arg(long, value_name = "ID")]
    site: Option<String>,

    /// Input CSV; part numbers are read from the first column
    #[arg(
        short,
        long,
        value_name = "FILE",
        required_unless_present_any = ["list_sites", "check_proxy"]
    )]
    input: Option<PathBuf>,

    /// Output file
    #[arg(
        short,
        long,
        value_name = "FILE",
        required_unless_present_any = ["list_sites", "check_proxy"]
    )]
    output: Option<PathBuf>,

    /// Output format: csv, json or excel
    #[arg(long, default_value = "csv")]
    format: OutputFormat,

    /// Skip part numbers already processed in the existing output file
    #[arg(long)]
    resume: bool,

    /// Process everything but never write the output file
    #[arg(long)]
    dry_run: bool,

    /// List the registered sites and exit
    #[arg(long, conflicts_with_all = ["resume", "dry_run"])]
    list_sites: bool,

    /// Check connectivity through the configured proxy
    #[arg(long)]
    check_proxy: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Log level for Part-Scout diagnostics (overrides LOG_LEVEL)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Settings first: they may name the log level and log file
    let (settings, config_hash) =
        load_settings(cli.config.as_deref()).context("Failed to load configuration")?;

    let level = cli
        .log_level
        .as_deref()
        .or(settings.logging.level.as_deref());
    init_logging(cli.verbose, cli.quiet, level, settings.logging.file.as_deref())
        .context("Failed to initialize logging")?;

    if let (Some(path), Some(hash)) = (&cli.config, &config_hash) {
        tracing::info!(
            "Configuration loaded from {} (hash: {})",
            path.display(),
            hash
        );
    }

    let registry = build_registry(&settings).context("Invalid site configuration")?;

    if cli.list_sites {
        print_sites(&registry);
        return Ok(());
    }

    let mask = SecretMask::with_env_secrets(settings.secrets());

    if cli.check_proxy {
        handle_proxy_check(&settings, &mask).await;
    }

    let (Some(input), Some(output)) = (cli.input.as_deref(), cli.output.as_deref()) else {
        return Ok(());
    };

    let site = select_site(&registry, cli.site.as_deref())?;
    println!("Selected site: {} ({})", site.name, site.id);

    let fetcher = Fetcher::from_settings(&settings.scraper, &settings.proxy, mask.clone())
        .context("Failed to build HTTP client")?;
    handle_scrape(&cli, &settings, site, fetcher, mask, input, output).await
}

/// Prints the registered sites
fn print_sites(registry: &SiteRegistry) {
    println!("Registered sites ({}):", registry.len());
    for site in registry.list() {
        println!("  {:<12} {} ({})", site.id, site.name, site.search_url());
        if !site.description.is_empty() {
            println!("  {:<12} {}", "", site.description);
        }
    }
}

/// Picks the site named on the command line, or the only registered one
fn select_site(
    registry: &SiteRegistry,
    requested: Option<&str>,
) -> anyhow::Result<Arc<SiteConfig>> {
    match requested {
        Some(id) => registry.get(id).ok_or_else(|| {
            ScoutError::UnknownSite {
                id: id.to_string(),
                available: registry.ids().join(", "),
            }
            .into()
        }),
        None => match registry.list() {
            [only] => Ok(Arc::clone(only)),
            _ => bail!(
                "Several sites are registered; choose one with --site ({})",
                registry.ids().join(", ")
            ),
        },
    }
}

/// Handles --check-proxy: reports the public address seen through the proxy
async fn handle_proxy_check(settings: &Settings, mask: &SecretMask) {
    if !settings.proxy.is_enabled() {
        println!("Skipping proxy test - no proxy credentials configured");
        return;
    }

    println!("Testing proxy connection: {}", settings.proxy.host);
    let check_settings = ScraperSettings {
        max_retries: 3,
        request_delay_ms: 0,
        ..settings.scraper.clone()
    };
    let fetcher = match Fetcher::from_settings(&check_settings, &settings.proxy, mask.clone()) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            println!("Proxy test failed: {}", mask.mask(&e.to_string()));
            return;
        }
    };

    match fetcher.check_proxy().await {
        Ok(check) => println!(
            "Proxy OK - public IP {} ({})",
            check.ip,
            check.country.as_deref().unwrap_or("unknown country")
        ),
        Err(e) => {
            let message = mask.mask(&e.to_string());
            tracing::warn!("Proxy test failed: {}", message);
            println!("Proxy test failed: {}", message);
        }
    }
}

/// Handles the main scrape operation
async fn handle_scrape(
    cli: &Cli,
    settings: &Settings,
    site: Arc<SiteConfig>,
    fetcher: Fetcher,
    mask: SecretMask,
    input: &Path,
    output: &Path,
) -> anyhow::Result<()> {
    if !input.is_file() {
        bail!("Input file not found: {}", input.display());
    }
    if output.exists() && !output.is_file() {
        bail!("Output path is not a file: {}", output.display());
    }
    validate_input_schema(input).context("Input schema validation failed")?;
    validate_output_schema(output, cli.format, &site.output_columns)
        .context("Output schema validation failed")?;

    let prior = if cli.resume {
        load_prior_results(output, cli.format).unwrap_or_else(|e| {
            tracing::warn!(
                "Resume warning: failed to load existing output for resume: {}",
                mask.mask(&e.to_string())
            );
            PriorResults::default()
        })
    } else {
        PriorResults::default()
    };

    let total = match count_identifiers(input) {
        Ok(total) => Some(total),
        Err(e) => {
            tracing::debug!("Could not count input rows: {}", e);
            None
        }
    };

    if cli.dry_run {
        println!("Dry run: results will not be written to {}", output.display());
    }
    tracing::info!(
        "Starting scrape: site={}, concurrency={}, chunk size={}, delay={}ms",
        site.id,
        settings.scraper.concurrency_limit,
        settings.scraper.chunk_size,
        settings.scraper.request_delay_ms
    );

    let options = BatchOptions::from_settings(&settings.scraper, cli.dry_run);
    let chunks = read_identifiers_in_chunks(input, options.chunk_size)?;
    let observer = ConsoleObserver::new(Arc::clone(&site), mask.clone(), cli.quiet);
    let pipeline = ItemPipeline::new(Arc::new(fetcher), Arc::clone(&site), mask.clone());

    let scheduler = BatchScheduler::new(
        pipeline,
        settings.scraper.concurrency_limit as usize,
        options,
        sink_for(cli.format, output),
    )
    .with_prior_results(prior)
    .with_observer(Box::new(observer))
    .with_total(total)
    .with_mask(mask.clone());

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Unable to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let report = scheduler.run(chunks, shutdown).await?;

    if report.interrupted {
        tracing::warn!(
            "Run interrupted; {} results saved to {}",
            report.results.len(),
            output.display()
        );
    }
    if report.skipped_invalid > 0 {
        tracing::warn!("Skipped {} invalid part numbers", report.skipped_invalid);
    }
    if report.safety_net_failures > 0 {
        tracing::warn!(
            "{} items failed outside the pipeline",
            report.safety_net_failures
        );
    }

    let summary = mask.mask(&generate_summary_report(
        &report.summary,
        Some(input),
        Some(output),
    ));
    tracing::info!("{}", summary);
    if !cli.quiet {
        println!();
        print_summary(&report.summary);
    }

    // Only completed runs are announced
    if !report.interrupted {
        let outcome = notify_run_complete(&settings.email, &summary, cli.dry_run, &mask).await;
        if outcome == NotifyOutcome::Sent && !cli.quiet {
            println!("Notification email sent.");
        }
    }

    Ok(())
}

/// Prints one line per completed item
struct ConsoleObserver {
    site: Arc<SiteConfig>,
    mask: SecretMask,
    quiet: bool,
}

impl ConsoleObserver {
    fn new(site: Arc<SiteConfig>, mask: SecretMask, quiet: bool) -> Self {
        Self { site, mask, quiet }
    }
}

impl RunObserver for ConsoleObserver {
    fn chunk_started(&mut self, chunk_index: usize, chunk_len: usize) {
        tracing::debug!("Chunk {}: {} part numbers", chunk_index + 1, chunk_len);
    }

    fn item_completed(&mut self, event: &ItemEvent<'_>) {
        if self.quiet {
            return;
        }

        let record = event.record;
        let total = event
            .total
            .map(|total| total.to_string())
            .unwrap_or_else(|| "?".to_string());
        let mut line = format!(
            "[{}/{}][{}/{}] Processed: {} Status: {}",
            event.chunk_position,
            event.chunk_len,
            event.completed,
            total,
            record.identifier(),
            record.status()
        );

        let columns = std::iter::once(self.site.success_field.as_str())
            .chain(self.site.stock_locations.iter().map(String::as_str))
            .chain(std::iter::once(IN_STOCK_COLUMN));
        for column in columns {
            line.push_str(&format!(" {}: {}", column, record.get(column).unwrap_or("N/A")));
        }

        println!("{}", self.mask.mask(&line));
    }

    fn item_failed(&mut self, message: &str) {
        if !self.quiet {
            println!("Error processing part: {}", message);
        }
    }

    fn chunk_finished(&mut self, chunk_index: usize, completed: usize, elapsed: Duration) {
        tracing::debug!(
            "Chunk {} done; {} items in {:.2}s",
            chunk_index + 1,
            completed,
            elapsed.as_secs_f64()
        );
    }
}
