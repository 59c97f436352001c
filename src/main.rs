use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ufm_streamer::config::{Args, Settings};
use ufm_streamer::{ApiStore, FileCache, Streamer};
use ufm_streamer_adapters::ufm::UfmClient;
use ufm_streamer_sdk::{Emitter, Output};

fn main() -> Result<()> {
    let args = Args::parse();
    let settings = Settings::from_args(&args).context("failed to resolve configuration")?;

    init_tracing(settings.log_level);

    let client = build_client(&settings)?;

    let emitter = Emitter::builder()
        .output(Output::forward_with_timeout(
            settings.fluentd.addr(),
            settings.fluentd.timeout,
        ))
        .tag(&settings.fluentd.tag)
        .message_type(&settings.streaming.message_type)
        .server_name(&settings.ufm.server_name)
        .toggles(settings.streaming.toggles)
        .initial_sequence(settings.streaming.initial_sequence)
        .build();

    let store = ApiStore::new(FileCache::new(&settings.streaming.cache_dir));
    let mut streamer = Streamer::new(client, store, emitter, settings.streaming.interval);

    info!(
        ufm = %settings.ufm.host,
        local = settings.ufm.local_streaming,
        fluentd = %settings.fluentd.addr(),
        tag = %settings.fluentd.tag,
        "ufm-streamer starting"
    );

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        if settings.once {
            streamer.warm_up();
            let report = streamer.tick().await;
            info!(refreshed = report.refreshed, emitted = ?report.emitted, "single tick complete");
            Ok(())
        } else {
            streamer.run().await
        }
    })
}

/// Log to stderr. `RUST_LOG` wins over the configured level.
fn init_tracing(level: tracing::Level) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::from_default_env().add_directive(level.into()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_client(settings: &Settings) -> Result<UfmClient> {
    let ufm = &settings.ufm;
    let builder = UfmClient::builder()
        .credentials(&ufm.username, &ufm.password)
        .timeout(settings.streaming.request_timeout);

    let builder = if ufm.local_streaming {
        builder.local_streaming(ufm.internal_port)
    } else {
        builder.protocol(&ufm.protocol).host(&ufm.host)
    };

    builder.build().context("failed to build UFM client")
}
