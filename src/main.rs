use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use video_dispatch::DispatchConfig;
use video_dispatch::cli::{Cli, Command};
use video_dispatch::runner;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let loaded = DispatchConfig::load(cli.config.as_deref()).map(|mut config| {
        if let Some(cap) = cli.max_concurrent {
            config.max_concurrent = cap;
        }
        config
    });

    match cli.command {
        Command::Tick => {
            let response = runner::tick_from(loaded).await;
            println!("{}", serde_json::to_string_pretty(&response)?);
            if !response.is_ok() {
                std::process::exit(1);
            }
        }
        Command::Watch {
            interval_secs,
            background_archive,
        } => {
            let mut config = loaded?;
            if let Some(secs) = interval_secs {
                config.tick_interval_secs = secs;
            }
            config.archive_in_background |= background_archive;
            runner::watch(config, async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %e, "failed to listen for ctrl-c");
                }
            })
            .await?;
        }
        Command::Status => {
            let summary = runner::summarize(loaded?).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "video_dispatch=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so stdout stays a clean JSON payload.
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
