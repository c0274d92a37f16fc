//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::cli::server::{serve, ServerConfig};
use crate::config::AppConfig;
use crate::directory::StaticDirectory;
use crate::error::Result;
use crate::pipeline::{prepare_output_dir, prepare_staging_dir, Pipeline, RunReport};
use crate::sink::ObjectStoreSink;
use crate::source::{ObjectStoreSource, ReportSource, REPORT_PREFIX};
use crate::window::months_lookback;
use serde_json::json;
use std::path::Path;
use std::time::Instant;

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
            Commands::Run {
                config,
                temp_dir,
                output_dir,
                lookback_months,
                destination,
            } => {
                self.run_drop(
                    config,
                    temp_dir,
                    output_dir,
                    *lookback_months,
                    destination.as_deref(),
                )
                .await
            }
            Commands::Check {
                config,
                lookback_months,
            } => self.check(config, *lookback_months).await,
            Commands::Serve {
                port,
                params_path,
                params_file,
            } => {
                let config = ServerConfig::new(params_path.clone(), params_file.as_ref())?;
                serve(config, *port).await
            }
        }
    }

    /// Build a drop and optionally upload it
    async fn run_drop(
        &self,
        config_path: &Path,
        temp_dir: &Path,
        output_dir: &Path,
        lookback_months: i32,
        destination: Option<&str>,
    ) -> Result<()> {
        let start = Instant::now();
        let config = AppConfig::load(config_path)?;
        let window = months_lookback(lookback_months)?;

        let staging_dir = prepare_staging_dir(temp_dir)?;
        prepare_output_dir(output_dir)?;

        let source = ObjectStoreSource::oci(&config.source)?;
        let directory = StaticDirectory::from_map(config.tenancy_names.clone());
        let sink = destination
            .map(str::to_string)
            .or_else(|| config.sink.as_ref().map(|s| s.url.clone()))
            .map(|url| ObjectStoreSink::parse(&url))
            .transpose()?;

        let mut pipeline = Pipeline::new(&source, &directory);
        if let Some(sink) = &sink {
            pipeline = pipeline.with_sink(sink);
        }
        let report = pipeline.run(&window, &staging_dir, output_dir).await?;

        if self.cli.verbose {
            eprintln!("Completed in {:.2}s", start.elapsed().as_secs_f64());
        }
        self.print_report(&report)
    }

    /// Validate the configuration and count reports in the window
    async fn check(&self, config_path: &Path, lookback_months: i32) -> Result<()> {
        let config = AppConfig::load(config_path)?;
        let window = months_lookback(lookback_months)?;
        let source = ObjectStoreSource::oci(&config.source)?;

        let objects = source.list_objects(REPORT_PREFIX).await?;
        let in_window = objects
            .iter()
            .filter(|o| window.accepts_report_created(o.created_at.date_naive()))
            .count();

        match self.cli.format {
            OutputFormat::Json => {
                let status = json!({
                    "status": "SUCCEEDED",
                    "tenancy": config.source.tenancy,
                    "window_start": window.start_date(),
                    "window_end": window.end_date(),
                    "reports": objects.len(),
                    "reports_in_window": in_window,
                });
                println!("{}", serde_json::to_string(&status)?);
            }
            OutputFormat::Pretty => {
                println!("Configuration OK for tenancy {}", config.source.tenancy);
                println!(
                    "Window {} to {}: {} of {} reports eligible",
                    window.start_date(),
                    window.end_date(),
                    in_window,
                    objects.len()
                );
            }
        }
        Ok(())
    }

    fn print_report(&self, report: &RunReport) -> Result<()> {
        match self.cli.format {
            OutputFormat::Json => println!("{}", serde_json::to_string(report)?),
            OutputFormat::Pretty => {
                println!(
                    "Window {} to {}: {} reports downloaded",
                    report.window_start, report.window_end, report.downloaded
                );
                println!(
                    "Drop {}: {} rows from {} files ({} skipped)",
                    report.drop.drop_id,
                    report.drop.rows_written,
                    report.drop.files_processed,
                    report.drop.files_skipped
                );
                for path in &report.drop.drop_paths {
                    println!("  {}", path.display());
                }
                if report.uploaded > 0 {
                    println!("Uploaded {} files", report.uploaded);
                }
            }
        }
        Ok(())
    }
}
