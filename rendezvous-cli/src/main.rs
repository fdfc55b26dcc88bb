use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use rendezvous_session::{
    ClockOffsetEstimator, HttpTimeSource, LocalClock, SessionConfig, SystemClock,
};
use std::fs;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cargo-rendezvous")]
#[command(bin_name = "cargo-rendezvous")]
enum Cli {
    Rendezvous(RendezvousArgs),
}

#[derive(clap::Args)]
struct RendezvousArgs {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate the local clock offset against a server's Date header.
    Probe {
        /// Any resource on the signaling origin.
        #[arg(long)]
        url: String,

        /// Session config (JSON) supplying the warm-up settings.
        #[arg(long)]
        config: Option<String>,

        /// Keep tracking drift on the configured interval.
        #[arg(long, default_value_t = false)]
        watch: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let Cli::Rendezvous(args) = Cli::parse();

    match args.command {
        Commands::Probe { url, config, watch } => {
            let config = load_config(config.as_deref())?;
            run_probe(url, config, watch).await?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&str>) -> Result<SessionConfig> {
    let Some(path) = path else {
        return Ok(SessionConfig::default());
    };
    let json = fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))?;
    SessionConfig::from_json(&json).with_context(|| format!("Invalid session config in {path}"))
}

async fn run_probe(url: String, config: SessionConfig, watch: bool) -> Result<()> {
    println!("{} {}", "Probing".cyan().bold(), url);
    info!("Warming up clock estimate against {}", url);

    let estimator = Arc::new(ClockOffsetEstimator::new(
        Arc::new(HttpTimeSource::new(url)),
        Arc::new(SystemClock),
        &config,
    ));

    estimator
        .warm_up()
        .await
        .context("Clock warm-up failed")?;
    info!("Warm-up finished after {} probes", estimator.probe_count());

    print_estimate(&estimator);

    if watch {
        println!(
            "{}",
            format!("Reprobing every {:?}, Ctrl-C to stop", config.probe_interval()).dimmed()
        );
        let task = tokio::spawn({
            let estimator = Arc::clone(&estimator);
            async move { estimator.run_periodic().await }
        });
        tokio::signal::ctrl_c().await?;
        task.abort();
        info!("Stopped reprobing after {} probes", estimator.probe_count());
        print_estimate(&estimator);
    }

    Ok(())
}

fn print_estimate(estimator: &ClockOffsetEstimator) {
    let window = estimator.window();
    println!(
        "   offset:    {}",
        format!("{:+.1} ms", estimator.average_offset()).green().bold()
    );
    println!(
        "   samples:   {} of {} ({} probes)",
        window.len(),
        window.capacity(),
        estimator.probe_count()
    );
    println!("   local:     {}", SystemClock.now_ms());
    println!("   estimated: {}", estimator.estimated_time());
}
