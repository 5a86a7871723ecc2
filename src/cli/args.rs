//! Command-line argument structures for the albedo-snmp CLI tools.
//!
//! This module provides reusable clap argument structures for the `albedo-*`
//! tools.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

use crate::client::{Backoff, Retry};
use crate::engine::UdpConnector;
use crate::oid::Oid;
use crate::session::{DEFAULT_PORT, SessionBuilder};
use crate::value::Value;

/// Environment variable naming the schema module directory.
pub const MIB_DIR_ENV: &str = "ALBEDO_MIB_DIR";

/// Output format for CLI tools.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output with symbolic names.
    #[default]
    Human,
    /// JSON output for scripting.
    Json,
}

/// Backoff strategy for CLI argument parsing.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum BackoffStrategy {
    /// No delay between retries (immediate retry on timeout).
    #[default]
    None,
    /// Fixed delay between each retry.
    Fixed,
    /// Exponential backoff: delay doubles after each attempt.
    Exponential,
}

/// Common arguments shared across all CLI tools.
#[derive(Debug, Parser)]
pub struct CommonArgs {
    /// Device host name or address.
    #[arg(value_name = "HOST")]
    pub host: String,

    /// Agent UDP port.
    #[arg(short = 'p', long = "port", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Read community (GET, GETNEXT).
    #[arg(short = 'c', long = "community", default_value = "public")]
    pub read_community: String,

    /// Write community (SET).
    #[arg(short = 'w', long = "write-community", default_value = "private")]
    pub write_community: String,

    /// Request timeout in seconds.
    #[arg(short = 't', long = "timeout", default_value = "5", value_parser = parse_seconds)]
    pub timeout: Duration,

    /// Retry count.
    #[arg(short = 'r', long = "retries", default_value = "3")]
    pub retries: u32,

    /// Backoff strategy between retries: none, fixed, or exponential.
    #[arg(long = "backoff", default_value = "none")]
    pub backoff: BackoffStrategy,

    /// Backoff delay in milliseconds (initial delay for exponential, fixed delay otherwise).
    #[arg(long = "backoff-delay", default_value = "1000")]
    pub backoff_delay: u64,

    /// Maximum backoff delay in milliseconds (exponential only).
    #[arg(long = "backoff-max", default_value = "5000")]
    pub backoff_max: u64,

    /// Directory of compiled schema modules (`<MODULE>.json`).
    #[arg(long = "mib-dir", env = MIB_DIR_ENV, value_name = "DIR")]
    pub mib_dir: Option<PathBuf>,
}

impl CommonArgs {
    /// Get the timeout as a Duration.
    pub fn timeout_duration(&self) -> Duration {
        self.timeout
    }

    /// Build a Retry configuration from the CLI arguments.
    pub fn retry_config(&self) -> Retry {
        let backoff = match self.backoff {
            BackoffStrategy::None => Backoff::None,
            BackoffStrategy::Fixed => Backoff::Fixed {
                delay: Duration::from_millis(self.backoff_delay),
            },
            BackoffStrategy::Exponential => Backoff::Exponential {
                initial: Duration::from_millis(self.backoff_delay),
                max: Duration::from_millis(self.backoff_max),
            },
        };
        Retry {
            max_attempts: self.retries,
            backoff,
        }
    }

    /// Schema directory: `--mib-dir`, `$ALBEDO_MIB_DIR`, or the per-user
    /// data directory.
    pub fn mib_dir(&self) -> Option<PathBuf> {
        self.mib_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|dir| dir.join("albedo-snmp").join("mibs")))
    }

    /// A session builder carrying every connection setting.
    pub fn session_builder(&self) -> SessionBuilder<UdpConnector> {
        let builder = SessionBuilder::new(self.host.clone())
            .port(self.port)
            .read_community(self.read_community.clone())
            .write_community(self.write_community.clone())
            .timeout(self.timeout_duration())
            .retry(self.retry_config());
        match self.mib_dir() {
            Some(dir) => builder.mib_dir(dir),
            None => builder,
        }
    }
}

/// Output control arguments.
#[derive(Debug, Parser)]
pub struct OutputArgs {
    /// Output format: human or json.
    #[arg(short = 'O', long = "output", default_value = "human")]
    pub format: OutputFormat,

    /// Print numeric OIDs instead of symbolic names.
    #[arg(short = 'n', long = "numeric")]
    pub numeric: bool,

    /// Enable debug logging (albedo_snmp=debug).
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,

    /// Enable trace logging (albedo_snmp=trace).
    #[arg(short = 'D', long = "trace")]
    pub trace: bool,
}

impl OutputArgs {
    /// Initialize tracing based on debug/trace flags.
    pub fn init_tracing(&self) {
        use tracing_subscriber::EnvFilter;

        let filter = if self.trace {
            "albedo_snmp=trace"
        } else if self.debug {
            "albedo_snmp=debug"
        } else {
            "albedo_snmp=warn"
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(filter))
            .with_writer(std::io::stderr)
            .try_init();
    }
}

/// Set-specific type specifier for values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ValueType {
    /// INTEGER (i32)
    #[value(name = "i")]
    Integer,
    /// Unsigned32/Gauge32 (u32)
    #[value(name = "u")]
    Unsigned,
    /// STRING (OctetString from UTF-8)
    #[value(name = "s")]
    String,
    /// Hex-STRING (OctetString from hex)
    #[value(name = "x")]
    HexString,
    /// OBJECT IDENTIFIER
    #[value(name = "o")]
    Oid,
    /// IpAddress
    #[value(name = "a")]
    IpAddress,
    /// TimeTicks
    #[value(name = "t")]
    TimeTicks,
    /// TruthValue: true/false, yes/no, 1/2
    #[value(name = "b")]
    Truth,
}

impl ValueType {
    /// Parse a string value into an SNMP Value according to the type specifier.
    pub fn parse_value(&self, s: &str) -> Result<Value, String> {
        match self {
            ValueType::Integer => s
                .parse()
                .map(Value::Integer)
                .map_err(|_| format!("invalid integer value: {s}")),
            ValueType::Unsigned => s
                .parse()
                .map(Value::Gauge32)
                .map_err(|_| format!("invalid unsigned value: {s}")),
            ValueType::String => Ok(Value::from(s)),
            ValueType::HexString => Ok(Value::OctetString(parse_hex_string(s)?.into())),
            ValueType::Oid => Oid::parse(s)
                .map(Value::ObjectIdentifier)
                .map_err(|e| format!("invalid OID value: {e}")),
            ValueType::IpAddress => s
                .parse::<std::net::Ipv4Addr>()
                .map(Value::from)
                .map_err(|_| format!("invalid IP address: {s}")),
            ValueType::TimeTicks => s
                .parse()
                .map(Value::TimeTicks)
                .map_err(|_| format!("invalid timeticks value: {s}")),
            ValueType::Truth => {
                let truth = match s.to_ascii_lowercase().as_str() {
                    "true" | "yes" | "on" | "1" => crate::row::TruthValue::True,
                    "false" | "no" | "off" | "2" => crate::row::TruthValue::False,
                    _ => return Err(format!("invalid truth value: {s}")),
                };
                Ok(truth.into())
            }
        }
    }
}

/// Parse a non-negative, finite number of seconds (`0.5`, `30`).
pub fn parse_seconds(s: &str) -> Result<Duration, String> {
    let secs: f64 = s
        .parse()
        .map_err(|_| format!("invalid number of seconds: {s}"))?;
    Duration::try_from_secs_f64(secs).map_err(|e| format!("invalid duration {s}: {e}"))
}

/// Parse a hex string (with or without spaces/separators) into bytes.
fn parse_hex_string(s: &str) -> Result<Vec<u8>, String> {
    let digits: Vec<u8> = s
        .chars()
        .filter(|c| !matches!(c, ' ' | ':' | '-'))
        .map(|c| {
            c.to_digit(16)
                .map(|d| d as u8)
                .ok_or_else(|| format!("invalid hex digit: {c}"))
        })
        .collect::<Result<_, _>>()?;

    if !digits.len().is_multiple_of(2) {
        return Err("hex string must have even number of digits".into());
    }
    Ok(digits.chunks(2).map(|pair| pair[0] << 4 | pair[1]).collect())
}
