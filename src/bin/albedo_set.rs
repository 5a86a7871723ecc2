//! albedo-set: Write a value by symbolic name.
//!
//! Part of the albedo-snmp CLI utilities.

use albedo_snmp::cli::args::{CommonArgs, OutputArgs, ValueType, parse_seconds};
use albedo_snmp::cli::output::{OutputContext, write_error};
use albedo_snmp::row::{PollPolicy, Verification};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

/// Write one value, optionally reading it back until the device applies it.
///
/// Type specifiers:
///   i = INTEGER
///   u = Unsigned32 (Gauge32)
///   s = STRING (OctetString)
///   x = Hex-STRING (OctetString from hex)
///   o = OBJECT IDENTIFIER
///   a = IpAddress
///   t = TimeTicks
///   b = TruthValue (true/false)
#[derive(Debug, Parser)]
#[command(name = "albedo-set", version, about, verbatim_doc_comment)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    #[command(flatten)]
    output: OutputArgs,

    /// Read the value back until it matches.
    #[arg(long = "verify")]
    verify: bool,

    /// Read-back deadline in seconds.
    #[arg(long = "verify-timeout", default_value = "5", requires = "verify", value_parser = parse_seconds)]
    verify_timeout: Duration,

    /// Name to write (e.g. ATSL-TDM-MONITOR-MIB::tdmMonEnable.0).
    #[arg(value_name = "NAME")]
    name: String,

    /// Value type.
    #[arg(value_name = "TYPE")]
    value_type: ValueType,

    /// Value.
    #[arg(value_name = "VALUE", allow_hyphen_values = true)]
    value: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    args.output.init_tracing();

    let value = match args.value_type.parse_value(&args.value) {
        Ok(value) => value,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let session = args
        .common
        .session_builder()
        .verify_poll(PollPolicy::new(
            Duration::from_millis(100),
            args.verify_timeout,
        ))
        .build();
    let resolver = Arc::clone(session.resolver());

    let oid = match resolver.resolve_name(&args.name) {
        Ok(oid) => oid,
        Err(e) => {
            write_error(&e);
            return ExitCode::FAILURE;
        }
    };

    let verify = args.verify;
    let result = session
        .run(async |s| {
            let device = s.device().await?;
            if verify {
                device.set_oid_verified(&oid, value.clone()).await.map(Some)
            } else {
                device.set_oid(&oid, value.clone()).await.map(|()| None)
            }
        })
        .await;

    let output = OutputContext::new(&args.output, &resolver);
    let name = output.name(&oid);
    let (status, code) = match result {
        Ok(None) => ("written".to_string(), ExitCode::SUCCESS),
        Ok(Some(Verification::Confirmed)) => ("verified".to_string(), ExitCode::SUCCESS),
        Ok(Some(Verification::TimedOut { last })) => {
            let last = last.map_or_else(|| "no value".to_string(), |v| v.to_string());
            (format!("not verified (last read: {last})"), ExitCode::FAILURE)
        }
        Err(e) => {
            write_error(&e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = output.write_fields(&[("name", name), ("status", status)]) {
        eprintln!("Error writing output: {e}");
        return ExitCode::FAILURE;
    }
    code
}
