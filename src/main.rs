use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Datelike;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use spot_cost::loaders::{load_consumption, load_spot_prices};
use spot_cost::{
    Config, MonthlyProductionSummary, Report, compute, monthly_production, net_consumption,
};

#[derive(Parser)]
#[command(name = "spot-cost")]
#[command(about = "Compare household electricity cost at spot and flat rates", long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "spot-cost.toml")]
    config: PathBuf,

    /// Report window start, replaces the configured windows (repeatable)
    #[arg(short, long)]
    since: Vec<String>,

    /// List hours priced above this rate (cents/kWh)
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Print spot price statistics per hour of day
    #[arg(long)]
    hourly: bool,
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install tracing subscriber")?;

    let cli = Cli::parse();
    let mut config = Config::load(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    if !cli.since.is_empty() {
        config.report.since = cli.since.clone();
    }
    if cli.threshold.is_some() {
        config.rates.threshold_cents = cli.threshold;
    }
    config.report.hourly_breakdown |= cli.hourly;

    let windows = config.since_timestamps()?;
    let settings = config.report_settings();

    let spot_prices = load_spot_prices(
        &config.sources.spot_prices,
        &config.sources.spot_price_format,
    )
    .context("Failed to load spot prices")?;
    let consumption = load_consumption(
        &config.sources.consumption,
        &config.sources.consumption_format,
    )
    .context("Failed to load consumption")?;

    let solar = config.solar.build().context("Failed to set up solar production")?;
    let summary_year = config
        .solar
        .year()
        .or_else(|| windows.first().map(|t| t.year()))
        .unwrap_or(2022);
    match monthly_production(&solar, summary_year) {
        Ok(summary) => print_monthly_production(&summary),
        Err(e) => warn!("Skipping monthly production stats: {}", e),
    }

    let net = net_consumption(&consumption, &solar).context("Failed to apply solar production")?;
    info!(hours = net.len(), "net consumption ready");

    if spot_prices.is_empty() {
        warn!("No spot prices loaded");
    }
    if let Some(avg) = spot_prices.average() {
        println!("Avg spot price: {:.2}c/kWh\n", avg);
    }

    let mut failed = 0;
    for since in windows {
        match compute(&net, &spot_prices, since, &settings) {
            Ok(report) => print_report(&report),
            Err(e) => {
                error!("Report since {} failed: {}", since, e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} report(s) failed", failed);
    }
    Ok(())
}

fn print_monthly_production(summary: &MonthlyProductionSummary) {
    println!("Monthly Solar Production ({}):", summary.year);
    for &(month, kwh) in &summary.months {
        println!("   {}-{:02}: {:.2} kWh", summary.year, month, kwh);
    }
    println!("   Total: {:.2} kWh\n", summary.total_kwh);
}

fn print_report(report: &Report) {
    println!(
        "== Range {} .. {} ({} hours) ==========================================",
        report.first, report.last, report.hours
    );
    println!("   Total consumption: {:.2} kWh", report.total_kwh);
    println!(
        "   Min consumption: {:.2} kWh at {}",
        report.min.kwh, report.min.at
    );
    println!(
        "   Max consumption: {:.2} kWh at {}",
        report.max.kwh, report.max.at
    );
    println!("   Avg hourly consumption: {:.2} kWh", report.average_kwh);
    println!("   Median hourly consumption: {:.2} kWh\n", report.median_kwh);

    for flat in &report.flat_costs {
        println!(
            "   Electricity price at flat {}c/kWh: {:.2} EUR",
            flat.rate_cents, flat.cost
        );
    }
    println!("   Electricity price at spot prices: {:.2} EUR", report.spot_cost);
    println!(
        "   Spot price = flat price at {:.2}c/kWh\n",
        report.effective_spot_rate_cents
    );

    if !report.hourly_prices.is_empty() {
        println!("   Spot price by hour of day (min / max / avg / median, c/kWh):");
        for h in &report.hourly_prices {
            println!(
                "     {:02}:00  raw {:.2} / {:.2} / {:.2} / {:.2}   rounded {:.0} / {:.0} / {:.2} / {:.0}   ({} days)",
                h.hour,
                h.raw.min,
                h.raw.max,
                h.raw.avg,
                h.raw.median,
                h.rounded.min,
                h.rounded.max,
                h.rounded.avg,
                h.rounded.median,
                h.samples
            );
        }
        println!();
    }

    if !report.expensive_hours.is_empty() {
        println!("   Grid hours above threshold:");
        for e in &report.expensive_hours {
            println!(
                "     {}: {:.2} kWh @ {:.2}c/kWh",
                e.at, e.net_kwh, e.price_cents
            );
        }
        println!();
    }
}
