//! albedo-config-op: Run a configuration file operation.
//!
//! Part of the albedo-snmp CLI utilities.

use albedo_snmp::cli::args::{CommonArgs, OutputArgs, parse_seconds};
use albedo_snmp::cli::output::{OutputContext, write_error};
use albedo_snmp::row::{CleanupPolicy, ConfigFileAction, PollOutcome, PollPolicy, RowOperation, RowWrite};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

const MODULE: &str = "ATSL-CONFIG-FILES-MIB";
const TABLE: &str = "configFilesOps";

/// Run a configuration file operation through the operations table.
///
/// The row is created with createAndWait, populated (FileName, Device,
/// optional Args, Action), activated, polled until the result leaves
/// inProgress, and destroyed.
///
/// Actions: delete, rename, import, export, load, save
#[derive(Debug, Parser)]
#[command(name = "albedo-config-op", version, about, verbatim_doc_comment)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    #[command(flatten)]
    output: OutputArgs,

    /// Row index in the operations table; pick a free one.
    #[arg(short = 'i', long = "index", default_value = "1")]
    index: u32,

    /// Storage device holding the file.
    #[arg(long = "device", default_value = "internal")]
    device: String,

    /// Extra argument (new name for rename, URL for import/export).
    #[arg(long = "args")]
    extra: Option<String>,

    /// Seconds between result polls.
    #[arg(long = "poll-interval", default_value = "0.5", value_parser = parse_seconds)]
    poll_interval: Duration,

    /// Seconds to wait for the operation to finish.
    #[arg(long = "poll-timeout", default_value = "30", value_parser = parse_seconds)]
    poll_timeout: Duration,

    /// Leave the row on the device when done.
    #[arg(long = "keep-row")]
    keep_row: bool,

    /// Destroy the row if populating it fails.
    #[arg(long = "cleanup-on-failure")]
    cleanup_on_failure: bool,

    /// Operation to run.
    #[arg(value_name = "ACTION", value_parser = parse_action)]
    action: ConfigFileAction,

    /// Configuration file name.
    #[arg(value_name = "FILE")]
    file: String,
}

fn parse_action(s: &str) -> Result<ConfigFileAction, String> {
    s.parse().map_err(|e: Box<albedo_snmp::Error>| e.to_string())
}

enum Report {
    Finished(PollOutcome),
    Aborted {
        column: String,
        attempted: usize,
        error: Box<albedo_snmp::Error>,
        destroyed: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    args.output.init_tracing();

    let cleanup = if args.cleanup_on_failure {
        CleanupPolicy::DestroyOnFailure
    } else {
        CleanupPolicy::Manual
    };
    let session = args
        .common
        .session_builder()
        .row_poll(PollPolicy::new(args.poll_interval, args.poll_timeout))
        .cleanup(cleanup)
        .build();
    let resolver = Arc::clone(session.resolver());

    let mut op = RowOperation::create_and_wait(MODULE, TABLE, [args.index])
        .column("FileName", args.file.as_str())
        .column("Device", args.device.as_str());
    if let Some(extra) = &args.extra {
        op = op.column("Args", extra.as_str());
    }
    let op = op.column("Action", args.action);

    let keep_row = args.keep_row;
    let result = session
        .run(async |s| {
            let device = s.device().await?;
            if let RowWrite::Aborted {
                column,
                attempted,
                error,
                destroyed,
            } = device.perform_row_operation(&op).await?
            {
                return Ok(Report::Aborted {
                    column,
                    attempted,
                    error,
                    destroyed,
                });
            }
            device.activate_row(&op).await?;
            let outcome = device.poll_row_result(&op).await?;
            if !keep_row {
                device.destroy_row(&op).await?;
            }
            Ok(Report::Finished(outcome))
        })
        .await;

    let output = OutputContext::new(&args.output, &resolver);
    let (fields, code) = match result {
        Ok(Report::Finished(PollOutcome::Finished(result))) => {
            let code = if result.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            };
            (vec![("action", args.action.to_string()), ("result", result.to_string())], code)
        }
        Ok(Report::Finished(PollOutcome::Timeout)) => (
            vec![("action", args.action.to_string()), ("result", "timeout".to_string())],
            ExitCode::FAILURE,
        ),
        Ok(Report::Aborted {
            column,
            attempted,
            error,
            destroyed,
        }) => (
            vec![
                ("action", args.action.to_string()),
                ("result", "aborted".to_string()),
                ("column", op.column_symbol(&column)),
                ("writes", attempted.to_string()),
                ("error", error.to_string()),
                ("row_destroyed", destroyed.to_string()),
            ],
            ExitCode::FAILURE,
        ),
        Err(e) => {
            write_error(&e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = output.write_fields(&fields) {
        eprintln!("Error writing output: {e}");
        return ExitCode::FAILURE;
    }
    code
}
