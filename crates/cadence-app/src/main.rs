use anyhow::Context;
use cadence_app::cli::Cli;
use cadence_app::document::SeriesDocument;
use cadence_core::config::load_config;
use cadence_rfc::rfc::ical::build::serialize;
use cadence_service::caldav::filter::OutputFilter;
use cadence_service::caldav::limit::RecurrenceSetLimiter;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    let (filter_layer, filter_handle) = reload::Layer::new(EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    let cli = Cli::parse();
    let mut config = load_config()?;

    tracing::debug!(config = ?config, "Configuration loaded");

    if let Ok(filter) = EnvFilter::try_new(config.logging.level.as_str()) {
        if let Err(e) = filter_handle.modify(|current| *current = filter) {
            tracing::warn!(error = %e, "Failed to update log filter from config");
        }
    } else {
        tracing::warn!(level = %config.logging.level, "Invalid log level in config, keeping info");
    }

    if let Some(zone) = cli.floating_zone.clone() {
        config.limiter.floating_zone = Some(zone);
    }

    let text = std::fs::read_to_string(&cli.document)
        .with_context(|| format!("reading {}", cli.document.display()))?;
    let document: SeriesDocument = serde_json::from_str(&text)
        .with_context(|| format!("parsing {}", cli.document.display()))?;
    let series = document.into_series()?;

    let window = cli.window()?;
    let limiter = RecurrenceSetLimiter::from_config(&config.limiter)?;
    let set = limiter.limit(&series.master, &window)?;

    tracing::info!(window = %window, occurrences = set.len(), "Series limited");

    println!("{}", series.master.fingerprint());
    if !cli.fingerprint_only {
        let calendar = OutputFilter::from_config(&config.output)
            .with_timezones(series.timezones)
            .filter(&set);
        print!("{}", serialize(&calendar));
    }

    Ok(())
}
