//! albedo-get: Read values by symbolic name.
//!
//! Part of the albedo-snmp CLI utilities.

use albedo_snmp::cli::args::{CommonArgs, OutputArgs};
use albedo_snmp::cli::output::{OutputContext, write_error};
use albedo_snmp::{Oid, VarBind};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;

/// Read one or more values.
///
/// Names are MODULE::symbol with optional index arcs
/// (e.g. SNMPv2-MIB::sysName.0) or dotted numeric OIDs.
#[derive(Debug, Parser)]
#[command(name = "albedo-get", version, about, verbatim_doc_comment)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    #[command(flatten)]
    output: OutputArgs,

    /// Names to read.
    #[arg(required = true, value_name = "NAME")]
    names: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    args.output.init_tracing();

    let session = args.common.session_builder().build();
    let resolver = Arc::clone(session.resolver());

    let oids = match args
        .names
        .iter()
        .map(|name| resolver.resolve_name(name))
        .collect::<albedo_snmp::Result<Vec<Oid>>>()
    {
        Ok(oids) => oids,
        Err(e) => {
            write_error(&e);
            return ExitCode::FAILURE;
        }
    };

    let result = session
        .run(async |s| {
            let device = s.device().await?;
            let mut varbinds: Vec<VarBind> = Vec::with_capacity(oids.len());
            for oid in &oids {
                varbinds.push(device.get_oid(oid).await?);
            }
            Ok(varbinds)
        })
        .await;

    match result {
        Ok(varbinds) => {
            let output = OutputContext::new(&args.output, &resolver);
            if let Err(e) = output.write_varbinds(&varbinds) {
                eprintln!("Error writing output: {e}");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            write_error(&e);
            ExitCode::FAILURE
        }
    }
}
