//! albedo-function: Show or change the active function of a multifunction
//! device.
//!
//! Part of the albedo-snmp CLI utilities.

use albedo_snmp::cli::args::{CommonArgs, OutputArgs, parse_seconds};
use albedo_snmp::cli::output::{OutputContext, write_error};
use albedo_snmp::multifunction::{ActiveFunction, FunctionType, SwitchOutcome};
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

/// Show or change the active function.
///
/// Changing the function stops any test or monitoring activity running on
/// the device.
#[derive(Debug, Parser)]
#[command(name = "albedo-function", version, about, verbatim_doc_comment)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    #[command(flatten)]
    output: OutputArgs,

    /// Seconds to wait after a switch before re-reading the device.
    #[arg(long = "settle", default_value = "3", value_parser = parse_seconds)]
    settle: Duration,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the active function (default).
    Show,
    /// Switch to FUNCTION unless it is already active.
    Ensure {
        #[arg(value_name = "FUNCTION", value_parser = parse_function)]
        function: FunctionType,
    },
    /// Switch to FUNCTION, re-checking even if it is already active.
    Switch {
        #[arg(value_name = "FUNCTION", value_parser = parse_function)]
        function: FunctionType,
    },
    /// List known function names.
    List,
}

fn parse_function(s: &str) -> Result<FunctionType, String> {
    s.parse().map_err(|e: Box<albedo_snmp::Error>| e.to_string())
}

enum Report {
    Active(ActiveFunction),
    Switch(SwitchOutcome),
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    args.output.init_tracing();

    let command = args.command.as_ref().unwrap_or(&Command::Show);
    if let Command::List = command {
        for ft in FunctionType::all() {
            let (class, mode) = ft.pair();
            println!("{:<18} class={class} mode={mode}", ft.name());
        }
        return ExitCode::SUCCESS;
    }

    let session = args
        .common
        .session_builder()
        .settle_time(args.settle)
        .build();
    let resolver = Arc::clone(session.resolver());

    let result = session
        .run(async |s| {
            let device = s.device().await?;
            Ok(match command {
                Command::Ensure { function } => Report::Switch(device.ensure_function(*function).await?),
                Command::Switch { function } => Report::Switch(device.switch_function(*function).await?),
                Command::Show | Command::List => Report::Active(device.active_function().await?),
            })
        })
        .await;

    let output = OutputContext::new(&args.output, &resolver);
    let (fields, code) = match result {
        Ok(Report::Active(active)) => {
            let code = match active {
                ActiveFunction::Function(_) => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
            (vec![("active", active.to_string())], code)
        }
        Ok(Report::Switch(SwitchOutcome::AlreadyActive(ft))) => {
            (vec![("active", ft.to_string()), ("switched", "false".to_string())], ExitCode::SUCCESS)
        }
        Ok(Report::Switch(SwitchOutcome::Switched { from, to })) => (
            vec![
                ("active", to.to_string()),
                ("previous", from.to_string()),
                ("switched", "true".to_string()),
            ],
            ExitCode::SUCCESS,
        ),
        Ok(Report::Switch(SwitchOutcome::NotMultifunction)) => (
            vec![("active", ActiveFunction::NotMultifunction.to_string())],
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
