// tariffscrape: run one tariff comparison from the command line.
//
// Prints the run report as JSON on stdout; logs go to stderr (RUST_LOG,
// default info).

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tariffscrape::{
    ExtractionProfile, ScrapeConfig, ScrapeRequest, SqliteTariffStore, TariffScraper,
};

#[derive(Debug, Parser)]
#[command(name = "tariffscrape")]
#[command(about = "Run an energy tariff comparison and extract the offered tariffs")]
struct Cli {
    /// UK postcode to quote for
    #[arg(long)]
    postcode: String,

    /// Position of the address in the address dropdown
    #[arg(long, default_value_t = 0)]
    address_index: usize,

    /// gas, electricity or dual; anything else means dual
    #[arg(long, default_value = "dual")]
    fuel: String,

    /// Current supplier name
    #[arg(long)]
    supplier: Option<String>,

    /// Payment method, e.g. "monthly direct debit" or "prepayment"
    #[arg(long, default_value = "monthly direct debit")]
    payment: String,

    /// Electric vehicle: yes, no or interested
    #[arg(long, default_value = "no")]
    ev: String,

    #[arg(long)]
    email: Option<String>,

    /// SQLite database to store the extracted tariffs in
    #[arg(long, env = "TARIFFSCRAPE_DATABASE")]
    database: Option<PathBuf>,

    /// JSON step plan template; the built-in comparison plan when omitted
    #[arg(long)]
    plan: Option<PathBuf>,

    /// JSON extraction profile replacing the default result-card selectors
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    #[arg(long, env = "TARIFFSCRAPE_START_URL", default_value = tariffscrape::utils::DEFAULT_START_URL)]
    start_url: String,

    #[arg(long, env = "TARIFFSCRAPE_ARTIFACT_DIR", default_value = "./artifacts")]
    artifact_dir: PathBuf,

    #[arg(long, env = "TARIFFSCRAPE_LOOKUP_URL", default_value = tariffscrape::utils::DEFAULT_LOOKUP_BASE_URL)]
    lookup_url: String,

    /// Upper bound on the whole run
    #[arg(long, default_value_t = tariffscrape::utils::DEFAULT_RUN_TIMEOUT_SECS)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut builder = ScrapeConfig::builder()
        .artifact_dir(&cli.artifact_dir)
        .start_url(&cli.start_url)
        .headless(!cli.headed)
        .lookup_base_url(&cli.lookup_url)
        .run_timeout_secs(cli.timeout_secs)
        .plan_path(cli.plan.clone());
    if let Some(path) = &cli.profile {
        let json = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read extraction profile {}", path.display()))?;
        let profile = ExtractionProfile::from_json(&json)
            .with_context(|| format!("Invalid extraction profile {}", path.display()))?;
        builder = builder.extraction_profile(profile);
    }
    let config = builder.build().context("Invalid configuration")?;

    let mut request = ScrapeRequest::from_raw(&cli.postcode, &cli.fuel, &cli.payment, &cli.ev)
        .with_address_index(cli.address_index);
    if let Some(supplier) = &cli.supplier {
        request = request.with_supplier(supplier.as_str());
    }
    if let Some(email) = &cli.email {
        request = request.with_email(email.as_str());
    }

    let scraper = TariffScraper::new(config)?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, cancelling run");
                cancel.cancel();
            }
        });
    }

    let report = match &cli.database {
        Some(path) => {
            let store = SqliteTariffStore::open(path)
                .await
                .with_context(|| format!("Failed to open database {}", path.display()))?;
            let (report, persisted) = scraper.run_and_persist(&request, &store, &cancel).await?;
            tracing::info!(
                "Saved {} record(s), {} failed, to {}",
                persisted.saved_ids.len(),
                persisted.failed,
                path.display()
            );
            store.close().await;
            report
        }
        None => scraper.run(&request, &cancel).await?,
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("Failed to serialize report")?
    );
    Ok(())
}
