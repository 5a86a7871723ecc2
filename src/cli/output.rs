//! Result printing for the CLI tools.

use std::io::{self, Write};

use serde_json::json;

use super::args::{OutputArgs, OutputFormat};
use crate::error::Error;
use crate::oid::Oid;
use crate::resolver::Resolver;
use crate::value::Value;
use crate::varbind::VarBind;

/// How to print results.
pub struct OutputContext<'a> {
    pub format: OutputFormat,
    pub numeric: bool,
    pub resolver: &'a Resolver,
}

impl<'a> OutputContext<'a> {
    pub fn new(args: &OutputArgs, resolver: &'a Resolver) -> Self {
        Self {
            format: args.format,
            numeric: args.numeric,
            resolver,
        }
    }

    /// Symbolic name of `oid`, or the dotted form with `--numeric`.
    pub fn name(&self, oid: &Oid) -> String {
        if self.numeric {
            oid.to_string()
        } else {
            self.resolver.reverse(oid).to_string()
        }
    }

    pub fn write_varbinds(&self, varbinds: &[VarBind]) -> io::Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        match self.format {
            OutputFormat::Human => {
                for vb in varbinds {
                    writeln!(out, "{} = {}: {}", self.name(&vb.oid), vb.value.type_name(), vb.value)?;
                }
            }
            OutputFormat::Json => {
                let rows: Vec<_> = varbinds.iter().map(|vb| self.varbind_json(vb)).collect();
                serde_json::to_writer_pretty(&mut out, &rows)?;
                writeln!(out)?;
            }
        }
        Ok(())
    }

    /// Print a single labelled value (`key: value`, or a JSON object).
    pub fn write_fields(&self, fields: &[(&str, String)]) -> io::Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        match self.format {
            OutputFormat::Human => {
                for (key, value) in fields {
                    writeln!(out, "{key}: {value}")?;
                }
            }
            OutputFormat::Json => {
                let object: serde_json::Map<_, _> = fields
                    .iter()
                    .map(|(key, value)| (key.to_string(), json!(value)))
                    .collect();
                serde_json::to_writer_pretty(&mut out, &object)?;
                writeln!(out)?;
            }
        }
        Ok(())
    }

    pub fn varbind_json(&self, vb: &VarBind) -> serde_json::Value {
        json!({
            "oid": vb.oid.to_string(),
            "name": self.name(&vb.oid),
            "type": vb.value.type_name(),
            "value": value_json(&vb.value),
        })
    }
}

/// JSON rendition of a value: numbers stay numbers, exceptions are null.
pub fn value_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Integer(v) => json!(v),
        Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => json!(v),
        Value::Counter64(v) => json!(v),
        Value::OctetString(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) => json!(text),
            Err(_) => json!(value.to_string()),
        },
        Value::Null | Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView => {
            serde_json::Value::Null
        }
        other => json!(other.to_string()),
    }
}

/// Print an error to stderr.
pub fn write_error(error: &Error) {
    eprintln!("Error: {error}");
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        eprintln!("  caused by: {cause}");
        source = cause.source();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_values() {
        assert_eq!(value_json(&Value::Integer(-4)), json!(-4));
        assert_eq!(value_json(&Value::from("internal")), json!("internal"));
        assert_eq!(value_json(&Value::NoSuchInstance), serde_json::Value::Null);
        assert_eq!(value_json(&Value::Counter64(1 << 40)), json!(1u64 << 40));
    }

    #[test]
    fn names_numeric_or_symbolic() {
        let resolver = Resolver::builtin();
        resolver.module("SNMPv2-MIB").unwrap();
        let oid = Oid::parse("1.3.6.1.2.1.1.5.0").unwrap();

        let ctx = OutputContext {
            format: OutputFormat::Json,
            numeric: false,
            resolver: &resolver,
        };
        assert_eq!(ctx.name(&oid), "SNMPv2-MIB::sysName.0");
        let row = ctx.varbind_json(&VarBind::new(oid.clone(), Value::from("mux-7")));
        assert_eq!(row["value"], json!("mux-7"));
        assert_eq!(row["type"], json!("STRING"));

        let ctx = OutputContext { numeric: true, ..ctx };
        assert_eq!(ctx.name(&oid), "1.3.6.1.2.1.1.5.0");
    }
}
