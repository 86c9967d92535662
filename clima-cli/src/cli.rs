use std::{io::Write, sync::Arc};

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use clima_core::{
    ClockStatus, Config, Coordinates, DayCount, ForecastProvider, LocationQuery, NormalizedForecast,
    QueryController, QueryOutcome, provider_from_config,
};
use tokio::sync::watch;

use crate::render::{render_forecast, today_line};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "clima",
    version,
    about = "Daily forecast with a live clock in the location's own time"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key (and optionally the default day count).
    Configure {
        /// Days to request when --days is not given.
        #[arg(long)]
        days: Option<DayCount>,
    },

    /// Show the forecast for a city by name.
    City {
        /// City name, e.g. "São Paulo".
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show the forecast for a latitude/longitude.
    Coords {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Number of forecast days (positive whole number, default 7).
    #[arg(long)]
    days: Option<DayCount>,

    /// Print the normalized forecast as JSON.
    #[arg(long, conflicts_with = "watch")]
    json: bool,

    /// Keep the local clock ticking until Ctrl-C.
    #[arg(long)]
    watch: bool,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { days } => configure(days),
            Command::City { name, output } => {
                let query = LocationQuery::city(&name.join(" "))?;
                show(query, output).await
            }
            Command::Coords { lat, lon, output } => {
                let query = LocationQuery::Coordinates(Coordinates::new(lat, lon)?);
                show(query, output).await
            }
        }
    }
}

fn configure(days: Option<DayCount>) -> anyhow::Result<()> {
    let mut config = Config::load_file()?;

    let api_key = inquire::Password::new("OpenWeather API key:")
        .without_confirmation()
        .with_display_mode(inquire::PasswordDisplayMode::Masked)
        .prompt()
        .context("Failed to read API key")?;
    config.set_api_key(api_key.trim().to_string());

    if let Some(days) = days {
        config.default_days = Some(days.get());
    }

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(query: LocationQuery, output: OutputArgs) -> anyhow::Result<()> {
    let config = Config::load()?;
    let days = match output.days {
        Some(days) => days,
        None => config.default_days()?,
    };
    let provider: Arc<dyn ForecastProvider> = Arc::from(provider_from_config(&config)?);

    let (clock_tx, clock_rx) = watch::channel(String::new());
    let controller = QueryController::new(provider, Arc::new(clock_tx));

    let result = present(&controller, query, days, &output, clock_rx).await;
    controller.shutdown();
    result
}

async fn present(
    controller: &QueryController,
    query: LocationQuery,
    days: DayCount,
    output: &OutputArgs,
    mut clock_rx: watch::Receiver<String>,
) -> anyhow::Result<()> {
    let outcome = controller
        .query(query.clone(), days)
        .await
        .with_context(|| format!("Could not get the forecast for {query}"))?;

    let (forecast, clock) = match outcome {
        QueryOutcome::Applied { forecast, clock } => (forecast, clock),
        QueryOutcome::Stale { .. } => bail!("Forecast for {query} was superseded"),
    };

    if output.json {
        println!("{}", serde_json::to_string_pretty(&*forecast)?);
        return Ok(());
    }

    let local_time = match &clock {
        ClockStatus::Live(_) => {
            clock_rx.changed().await.context("Live clock stopped unexpectedly")?;
            Some(clock_rx.borrow_and_update().clone())
        }
        ClockStatus::Degraded(e) => {
            eprintln!("warning: {e}");
            None
        }
    };

    print!("{}", render_forecast(&forecast, local_time.as_deref()));

    if output.watch && matches!(clock, ClockStatus::Live(_)) {
        watch_clock(&forecast, clock_rx).await?;
    }

    Ok(())
}

/// Redraw the "today" line on every tick until Ctrl-C.
async fn watch_clock(
    forecast: &NormalizedForecast,
    mut clock_rx: watch::Receiver<String>,
) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout();
    loop {
        tokio::select! {
            changed = clock_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let time = clock_rx.borrow_and_update().clone();
                write!(stdout, "\r{}", today_line(forecast, Some(&time)))?;
                stdout.flush()?;
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl-C")?;
                break;
            }
        }
    }
    writeln!(stdout)?;
    Ok(())
}
