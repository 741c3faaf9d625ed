use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Password, Text};
use raining_core::{
    Config, Precipitation, Report, ReportCache, SystemClock, WeatherProvider,
    config::DEFAULT_DARKSKY_URL, retriever_from_config,
};
use std::{sync::Arc, time::Duration};
use tracing::warn;

use crate::coords;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "raining", version, about = "Is it raining where you are?")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the Dark Sky API key (and optionally a different API URL).
    Configure,

    /// Show a rain report for a location.
    Show {
        /// Latitude in decimal degrees, -90..=90.
        #[arg(allow_negative_numbers = true)]
        latitude: f64,

        /// Longitude in decimal degrees, -180..=180.
        #[arg(allow_negative_numbers = true)]
        longitude: f64,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Keep printing rain reports for a location until interrupted.
    Watch {
        #[arg(allow_negative_numbers = true)]
        latitude: f64,

        #[arg(allow_negative_numbers = true)]
        longitude: f64,

        /// Seconds between reports.
        #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
        every: u64,

        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show {
                latitude,
                longitude,
                json,
            } => {
                let (latitude, longitude) = coords::prepare(latitude, longitude)?;
                let config = Config::load()?;
                let retriever = retriever_from_config(&config)?;

                let report = retriever.fetch(latitude, longitude).await?;
                println!("{}", render(&report, json)?);
                Ok(())
            }
            Command::Watch {
                latitude,
                longitude,
                every,
                json,
            } => {
                let (latitude, longitude) = coords::prepare(latitude, longitude)?;
                let config = Config::load()?;
                let provider = ReportCache::new(
                    retriever_from_config(&config)?,
                    config.cache_ttl(),
                    Arc::new(SystemClock),
                );
                watch(
                    &provider,
                    latitude,
                    longitude,
                    Duration::from_secs(every),
                    json,
                    ctrl_c(),
                )
                .await
            }
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let path = Config::config_file_path()?;
    let mut config = Config::load_from(&path)?;

    let api_key = Password::new("Dark Sky API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    let api_url = Text::new("Dark Sky API URL:")
        .with_default(config.api_url())
        .prompt()
        .context("Failed to read API URL")?;

    apply_answers(&mut config, &api_key, &api_url);
    config.save_to(&path)?;

    println!("Configuration saved to {}", path.display());
    Ok(())
}

/// Store the answers from `configure`. Entering the default URL clears any
/// custom one so the file keeps following the default.
fn apply_answers(config: &mut Config, api_key: &str, api_url: &str) {
    config.set_api_key(api_key.trim().to_string());

    let api_url = api_url.trim();
    config.darksky.api_url = if api_url.is_empty() || api_url == DEFAULT_DARKSKY_URL {
        None
    } else {
        Some(api_url.to_string())
    };
}

/// Resolves on Ctrl-C. If the handler cannot be installed it never resolves.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}

async fn watch<P, S>(
    provider: &P,
    latitude: f64,
    longitude: f64,
    every: Duration,
    json: bool,
    shutdown: S,
) -> anyhow::Result<()>
where
    P: WeatherProvider,
    S: Future<Output = ()>,
{
    // One listener for the whole loop, raced against both the ticker and
    // any fetch in flight.
    tokio::pin!(shutdown);
    let mut ticker = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                tokio::select! {
                    result = provider.fetch(latitude, longitude) => match result {
                        Ok(report) => println!("{}\n", render(&report, json)?),
                        Err(e) => {
                            warn!("{e}");
                            eprintln!("{e}");
                        }
                    },
                    _ = &mut shutdown => return Ok(()),
                }
            }
            _ = &mut shutdown => return Ok(()),
        }
    }
}

fn render(report: &Report, json: bool) -> anyhow::Result<String> {
    if json {
        return serde_json::to_string_pretty(report).context("Failed to serialize report");
    }

    Ok(format!(
        "{} {}\n\n{}",
        headline(report),
        outlook(report),
        report
    ))
}

fn headline(report: &Report) -> String {
    match report.current_precipitation_type {
        Precipitation::Rain => "Yes, it is raining.".to_string(),
        Precipitation::Unknown => "Nobody knows if it is raining.".to_string(),
        Precipitation::None => "No, it is not raining.".to_string(),
        other => format!("No, but there is {other}."),
    }
}

fn outlook(report: &Report) -> String {
    let chance = report.today_chance_of_precipitation;
    if chance < 0.0 {
        return "The chance of precipitation today is unknown.".to_string();
    }

    let percent = (chance * 100.0).round();
    match report.today_precipitation_type {
        Precipitation::None => "No precipitation expected today.".to_string(),
        Precipitation::Unknown => format!("{percent}% chance of precipitation today."),
        kind => format!("{percent}% chance of {kind} today."),
    }
}
