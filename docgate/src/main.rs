mod config;

use clap::Parser;
use metrics_exporter_statsd::StatsdBuilder;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "docgate", about = "Versioned documentation gateway")]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, default_value = "docgate.yaml")]
    config: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = match config::Config::from_file(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("could not load configuration: {err}");
            process::exit(1);
        }
    };

    // Keep the guard alive for the lifetime of the process
    let _sentry_guard = config.common.logging.as_ref().map(|logging| {
        sentry::init((
            logging.sentry_dsn.clone(),
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    if let Some(metrics_config) = &config.common.metrics {
        install_statsd_recorder(metrics_config);
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("could not start tokio runtime: {err}");
            process::exit(1);
        }
    };

    if let Err(err) = runtime.block_on(gateway::run(config.gateway)) {
        tracing::error!(error = %err, "gateway exited with error");
        process::exit(1);
    }
}

fn install_statsd_recorder(metrics_config: &config::MetricsConfig) {
    let recorder =
        match StatsdBuilder::from(&metrics_config.statsd_host, metrics_config.statsd_port)
            .build(Some("docgate"))
        {
            Ok(recorder) => recorder,
            Err(err) => {
                tracing::warn!(error = %err, "could not build statsd recorder, metrics disabled");
                return;
            }
        };

    if let Err(err) = metrics::set_global_recorder(recorder) {
        tracing::warn!(error = %err, "could not install metrics recorder");
    }
}
