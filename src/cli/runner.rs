//! CLI runner - executes commands

use crate::auth::AccessKeyTokenProvider;
use crate::cli::commands::{Cli, Commands, RunArgs};
use crate::config::ExportConfig;
use crate::engine::{EngineConfig, EnvironmentReport, ExportEngine};
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpClientConfig};
use crate::output::JsonLinesExporter;
use crate::pagination::{CursorCodec, LinkEnumerator};
use std::io::Write;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Run(args) => {
                let cancel = CancellationToken::new();
                let on_signal = cancel.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        warn!("Interrupt received, cancelling run");
                        on_signal.cancel();
                    }
                });

                let reports = self.export(args, &cancel).await?;
                print_reports(&reports);
                if !reports.is_empty() && reports.iter().all(|r| r.outcome.is_skipped()) {
                    return Err(Error::Other("every environment was skipped".to_string()));
                }
                Ok(())
            }
            Commands::Decode { link } => decode(link),
            Commands::Links {
                link,
                base_url,
                stride,
            } => links(link, base_url, *stride),
        }
    }

    /// Load the config, apply overrides and export every selected environment
    pub async fn export(
        &self,
        args: &RunArgs,
        cancel: &CancellationToken,
    ) -> Result<Vec<EnvironmentReport>> {
        let config = load_config(args)?;
        let engine = build_engine(&config, !self.cli.verbose)?;

        println!("--- Exporting {} environment(s) ---", config.environments.len());
        let start = Instant::now();
        let reports = engine.run_all(&config.environments, cancel).await;
        info!("Export finished in {:.1}s", start.elapsed().as_secs_f64());

        Ok(reports)
    }
}

/// Read the config file and apply command-line overrides
fn load_config(args: &RunArgs) -> Result<ExportConfig> {
    let mut config = ExportConfig::from_file(&args.config)?;

    if let Some(concurrency) = args.concurrency {
        config.max_concurrency = concurrency;
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir.clone_from(dir);
    }
    config.select_environments(&args.environments)?;
    config.validate()?;

    Ok(config)
}

fn build_engine(config: &ExportConfig, show_progress: bool) -> Result<ExportEngine> {
    let mut http = HttpClientConfig::builder()
        .timeout(config.request_timeout())
        .max_retries(config.retry.max_retries)
        .backoff(
            config.retry.backoff,
            config.retry.initial_backoff(),
            config.retry.max_backoff(),
        );
    if let Some(rate_limit) = config.rate_limit.clone() {
        http = http.rate_limit(rate_limit);
    }
    let client = HttpClient::with_config(http.build())?;

    let tokens = AccessKeyTokenProvider::new(client.clone(), &config.api_base_url()?)
        .with_expiry(config.token_expiry_secs);
    let mut engine = ExportEngine::new(
        Arc::new(client),
        Arc::new(tokens),
        EngineConfig::from_export_config(config)?,
    )?
    .with_exporter(Arc::new(JsonLinesExporter::new(&config.output_dir)));

    if show_progress {
        engine = engine.with_progress(|progress| {
            let mut stderr = std::io::stderr().lock();
            let _ = write!(
                stderr,
                "\r{:03} of {:03} pages returned",
                progress.completed, progress.total
            );
            if progress.is_finished() {
                let _ = writeln!(stderr);
            }
        });
    }

    Ok(engine)
}

fn print_reports(reports: &[EnvironmentReport]) {
    for report in reports {
        println!("{}", report.summary());
        if let Some(path) = &report.output {
            println!("  written to {}", path.display());
        }
    }
}

fn decode(link: &str) -> Result<()> {
    let cursor = CursorCodec::decode(link)?;
    println!("{}", serde_json::to_string_pretty(&cursor)?);
    Ok(())
}

fn links(link: &str, base_url: &str, stride: u64) -> Result<()> {
    let cursor = CursorCodec::decode(link)?;
    let enumerator = LinkEnumerator::new(base_url, stride)?;
    for request in enumerator.enumerate(&cursor)? {
        println!("{}", request.url);
    }
    Ok(())
}
