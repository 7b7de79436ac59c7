// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pagescan: render document pages and harvest barcodes.
//
// Entry point. Initialises logging, loads settings, and dispatches to the
// decode, export or init-config command.

mod args;
mod output;
mod settings;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use pagescan_core::ScanError;
use pagescan_core::error::Result;
use pagescan_core::human_errors::{Severity, humanize_error};
use pagescan_document::{ExportOptions, export_pages, source_for_path};
use pagescan_engine::{CommandDecoder, DecodeSession};

use args::{Cli, Command, DecodeArgs, ExportArgs};
use settings::CliSettings;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "pagescan starting");

    let outcome = match cli.command {
        Command::Decode(args) => decode(cli.config.as_deref(), args).await,
        Command::Export(args) => export(cli.config.as_deref(), args).await,
        Command::InitConfig { path, force } => init_config(&path, force),
    };

    match outcome {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            let human = humanize_error(&err);
            eprintln!(
                "{}: {}\n{}",
                severity_label(human.severity),
                human.message,
                human.suggestion
            );
            ExitCode::from(failure_code(human.severity))
        }
    }
}

async fn decode(config: Option<&Path>, args: DecodeArgs) -> Result<ExitCode> {
    let mut settings = CliSettings::load(config)?;
    args.apply(&mut settings);
    settings.scan.validate()?;

    let source = source_for_path(&args.input)?;
    let decoder = Arc::new(CommandDecoder::new(settings.tools.clone())?);
    let session = DecodeSession::new(source, decoder);

    let report = session.decode(&args.input, &settings.scan).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", output::format_report(&report));
    }

    Ok(if report.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}

async fn export(config: Option<&Path>, args: ExportArgs) -> Result<ExitCode> {
    let settings = CliSettings::load(config)?;
    let (range, quality) = args.render.resolve(&settings.scan);

    let base_name = match args.base_name {
        Some(name) => name,
        None => args
            .input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .ok_or_else(|| {
                ScanError::Export(format!("{} has no file name", args.input.display()))
            })?,
    };
    let options = ExportOptions {
        range,
        quality,
        format: args.format.into(),
        ..ExportOptions::new(&args.output, base_name)
    };

    let source = source_for_path(&args.input)?;
    let input = args.input.clone();
    let written =
        tokio::task::spawn_blocking(move || export_pages(source.as_ref(), &input, &options))
            .await
            .map_err(|err| ScanError::Task(format!("export stage: {err}")))??;

    for path in &written {
        println!("{}", path.display());
    }
    Ok(if written.is_empty() {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    })
}

fn init_config(path: &Path, force: bool) -> Result<ExitCode> {
    if path.exists() && !force {
        return Err(ScanError::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    CliSettings::starter().persist(path)?;
    println!("wrote {}", path.display());
    Ok(ExitCode::SUCCESS)
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Transient => "temporary error",
        Severity::ActionRequired => "error",
        Severity::Permanent => "fatal",
    }
}

/// Exit status for a failed command. A report that decoded but failed its
/// checks exits with 2; hard failures use the sysexits-style codes below.
fn failure_code(severity: Severity) -> u8 {
    match severity {
        // EX_TEMPFAIL
        Severity::Transient => 75,
        Severity::ActionRequired => 1,
        // EX_DATAERR
        Severity::Permanent => 65,
    }
}
