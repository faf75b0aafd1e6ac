//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use circex_resolver::{CacheStore, HttpClient, ReferenceResolver, process_department, save_report};
use circex_shared::{AppConfig, ScrapeConfig, init_config, load_config};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// circex — resolve regulatory circular citations into content graphs.
#[derive(Parser)]
#[command(
    name = "circex",
    version,
    about = "Extract regulatory circulars and resolve the citation graph between them.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Resolve one citation title into its document content.
    Resolve {
        /// Citation title, e.g. "AC&MFD Circular No. 01 of 2014".
        title: String,

        /// Cache file (defaults to the configured path).
        #[arg(long)]
        cache: Option<PathBuf>,

        /// Write the result JSON here instead of stdout.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Walk department archives and extract every listed circular.
    Department {
        /// Department name from config (omit to process all).
        name: Option<String>,

        /// Department index URL (overrides the configured one).
        #[arg(long)]
        url: Option<String>,

        /// Limit how many years of the archive to process.
        #[arg(long)]
        max_years: Option<u32>,

        /// Recursively resolve citations found in each document.
        #[arg(long)]
        follow_references: bool,

        /// Output directory for report JSON files.
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "circex=info",
        1 => "circex=debug",
        _ => "circex=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Resolve { title, cache, out } => cmd_resolve(&title, cache, out).await,
        Command::Department {
            name,
            url,
            max_years,
            follow_references,
            out,
        } => cmd_department(name.as_deref(), url.as_deref(), max_years, follow_references, &out)
            .await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_resolve(title: &str, cache: Option<PathBuf>, out: Option<PathBuf>) -> Result<()> {
    let config = load_config()?;

    let mut scrape_config = ScrapeConfig::from(&config);
    // Resolving one citation implies following what it cites.
    scrape_config.follow_references = true;

    let cache_path = cache.unwrap_or_else(|| PathBuf::from(&config.cache.file));
    let client = HttpClient::new(scrape_config.request_timeout_secs)?;
    let resolver = ReferenceResolver::new(client, scrape_config, CacheStore::load(cache_path));

    let spinner = spinner();
    spinner.set_message(format!("Resolving {title}"));

    let result_json = match resolver.resolve(title).await {
        Ok(resolved) => serde_json::json!({
            "title": title,
            "url": resolved.url,
            "content": resolved.content,
        }),
        Err(failure) => {
            spinner.finish_and_clear();
            info!(title, reason = ?failure.reason, "resolution failed");
            serde_json::to_value(&failure)?
        }
    };
    spinner.finish_and_clear();

    let rendered = serde_json::to_string_pretty(&result_json)?;
    match out {
        Some(path) => {
            std::fs::write(&path, rendered)?;
            println!("Result written to {}", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

async fn cmd_department(
    name: Option<&str>,
    url: Option<&str>,
    max_years: Option<u32>,
    follow_references: bool,
    out: &PathBuf,
) -> Result<()> {
    let config = load_config()?;

    let mut scrape_config = ScrapeConfig::from(&config);
    if max_years.is_some() {
        scrape_config.max_years = max_years;
    }
    if follow_references {
        scrape_config.follow_references = true;
    }

    // A bare URL gets a generic name; a bare name must exist in config.
    let targets: Vec<(String, String)> = match (name, url) {
        (Some(name), Some(url)) => vec![(name.to_string(), url.to_string())],
        (Some(name), None) => {
            let entry = config
                .departments
                .iter()
                .find(|d| d.name.eq_ignore_ascii_case(name))
                .ok_or_else(|| eyre!("department '{name}' not found in config"))?;
            vec![(entry.name.clone(), entry.url.clone())]
        }
        (None, Some(_)) => return Err(eyre!("--url requires a department name")),
        (None, None) => config
            .departments
            .iter()
            .map(|d| (d.name.clone(), d.url.clone()))
            .collect(),
    };

    std::fs::create_dir_all(out)?;

    let client = HttpClient::new(scrape_config.request_timeout_secs)?;
    let resolver_client = HttpClient::new(scrape_config.request_timeout_secs)?;
    let resolver = ReferenceResolver::new(
        resolver_client,
        scrape_config.clone(),
        CacheStore::load(&config.cache.file),
    );

    let spinner = spinner();
    for (dept_name, dept_url) in targets {
        spinner.set_message(format!("Processing {dept_name}"));
        info!(department = %dept_name, url = %dept_url, "processing department");

        let report =
            match process_department(&client, &resolver, &scrape_config, &dept_name, &dept_url)
                .await
            {
                Ok(report) => report,
                Err(e) => {
                    // One failed department must not abort the run.
                    tracing::warn!(department = %dept_name, error = %e, "department failed");
                    continue;
                }
            };

        let path = out.join(format!("{}_circulars.json", dept_name.to_lowercase()));
        save_report(&report, &path)?;

        let (circulars, letters) = report.years.values().fold((0, 0), |(c, l), year| {
            (
                c + year.summary.total_circulars,
                l + year.summary.total_circular_letters,
            )
        });
        spinner.suspend(|| {
            println!();
            println!("  {dept_name}");
            println!("  Years:            {}", report.total_years_processed);
            println!("  Circulars:        {circulars}");
            println!("  Circular letters: {letters}");
            println!("  Report:           {}", path.display());
        });
    }
    spinner.finish_and_clear();

    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

fn spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .expect("valid template")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}
