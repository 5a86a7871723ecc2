//! albedo-walk: Enumerate a subtree by symbolic name.
//!
//! Part of the albedo-snmp CLI utilities.

use albedo_snmp::cli::args::{CommonArgs, OutputArgs};
use albedo_snmp::cli::output::{OutputContext, write_error};
use albedo_snmp::walk::WalkEnd;
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;

/// Walk everything under a name (e.g. ATSL-MULTIFUNCTION-MIB::mfFuncTable).
#[derive(Debug, Parser)]
#[command(name = "albedo-walk", version, about)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    #[command(flatten)]
    output: OutputArgs,

    /// Subtree root.
    #[arg(value_name = "NAME")]
    root: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    args.output.init_tracing();

    let session = args.common.session_builder().build();
    let resolver = Arc::clone(session.resolver());

    let root = match resolver.resolve_name(&args.root) {
        Ok(oid) => oid,
        Err(e) => {
            write_error(&e);
            return ExitCode::FAILURE;
        }
    };

    let result = session
        .run(async |s| Ok(s.device().await?.walk_oid(&root).await))
        .await;

    let walk = match result {
        Ok(walk) => walk,
        Err(e) => {
            write_error(&e);
            return ExitCode::FAILURE;
        }
    };

    let output = OutputContext::new(&args.output, &resolver);
    if let Err(e) = output.write_varbinds(&walk.varbinds) {
        eprintln!("Error writing output: {e}");
        return ExitCode::FAILURE;
    }

    match &walk.end {
        WalkEnd::Failed(e) => {
            eprintln!("Walk stopped after {} results", walk.len());
            write_error(e);
            ExitCode::FAILURE
        }
        WalkEnd::NonIncreasing => {
            eprintln!("Walk stopped: agent returned OIDs out of order");
            ExitCode::FAILURE
        }
        _ => ExitCode::SUCCESS,
    }
}
