//! Aegis - entry point for the `aegis` command.

use std::io::Write;
use std::process::ExitCode;

use aegis_cli::{check, describe, generate, validate, Cli, Command, EXIT_FAILURE, EXIT_REJECTED};
use aegis_config::{AegisConfig, ConfigLoader, LogFormat, DEFAULT_CONFIG_FILE, ENV_PREFIX};
use aegis_telemetry::{init_telemetry, render_metrics, LogConfig, MetricsConfig};
use anyhow::Context;
use clap::Parser;
use tracing::warn;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli).await {
        Ok(code) => {
            if cli.metrics {
                if let Some(text) = render_metrics() {
                    let _ = write!(std::io::stderr(), "{text}");
                }
            }
            code
        }
        Err(err) => {
            let _ = writeln!(std::io::stderr(), "error: {err:#}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<ExitCode> {
    let config = load_config(cli)?;

    let logging = LogConfig {
        json_format: config.logging.format == LogFormat::Json,
        ..LogConfig::default()
    }
    .with_level(config.logging.level.to_lowercase());
    let metrics = MetricsConfig {
        enabled: cli.metrics,
        ..MetricsConfig::default()
    };
    init_telemetry(&logging, &metrics).context("failed to initialize telemetry")?;

    match &cli.command {
        Command::Generate { .. } => {
            let report = generate(&config.generator).await?;
            print!("{report}");
            Ok(exit_code(!report.has_failures(), EXIT_FAILURE))
        }
        Command::Check { .. } => {
            let report = check(&config.generator).await?;
            print!("{report}");
            Ok(exit_code(report.is_clean(), EXIT_FAILURE))
        }
        Command::Validate {
            endpoint, request, ..
        } => {
            let result = validate(&config.runtime, endpoint, request).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            if let Some(rejection) = result.rejection() {
                warn!(
                    endpoint = %endpoint,
                    status = rejection.status().as_u16(),
                    "request rejected"
                );
            }
            Ok(exit_code(result.valid, EXIT_REJECTED))
        }
        Command::Describe { endpoint, .. } => {
            let description = describe(&config.generator, endpoint).await?;
            println!("{}", serde_json::to_string_pretty(&description)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<AegisConfig> {
    let loader = match &cli.config {
        Some(path) => ConfigLoader::new()
            .with_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => ConfigLoader::new()
            .with_optional_file(DEFAULT_CONFIG_FILE)
            .context("failed to load configuration")?,
    };
    loader
        .with_dotenv()?
        .with_env_prefix(ENV_PREFIX)
        .load_with(|config| cli.apply_overrides(config))
        .context("invalid configuration")
}

fn exit_code(success: bool, failure: u8) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(failure)
    }
}
