//! Built-in `SNMPv2-MIB` system group.

use super::{SchemaError, SchemaSource, Symbol, SymbolKind, SymbolTable};
use crate::oid::Oid;

pub const SNMPV2_MIB: &str = "SNMPv2-MIB";

const SYSTEM: [u32; 7] = [1, 3, 6, 1, 2, 1, 1];

const SCALARS: &[(&str, u32)] = &[
    ("sysDescr", 1),
    ("sysObjectID", 2),
    ("sysUpTime", 3),
    ("sysContact", 4),
    ("sysName", 5),
    ("sysLocation", 6),
    ("sysServices", 7),
    ("sysORLastChange", 8),
];

const OR_COLUMNS: &[(&str, u32)] = &[
    ("sysORIndex", 1),
    ("sysORID", 2),
    ("sysORDescr", 3),
    ("sysORUpTime", 4),
];

/// Always answers for `SNMPv2-MIB`, so `sysDescr` and friends resolve
/// without any schema files installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinSchema;

impl BuiltinSchema {
    fn snmpv2_mib() -> SymbolTable {
        let system = Oid::from_slice(&SYSTEM);
        let or_table = system.child(9);
        let or_entry = or_table.child(1);

        let mut table = SymbolTable::new(SNMPV2_MIB)
            .with(Symbol::new(SNMPV2_MIB, None, SymbolKind::Definition))
            .with(Symbol::new("system", Some(system.clone()), SymbolKind::Node))
            .with(Symbol::new("sysORTable", Some(or_table), SymbolKind::Table))
            .with(Symbol::new("sysOREntry", Some(or_entry.clone()), SymbolKind::Entry));

        for &(name, arc) in SCALARS {
            table.insert(Symbol::new(name, Some(system.child(arc)), SymbolKind::Scalar));
        }
        for &(name, column) in OR_COLUMNS {
            table.insert(Symbol::new(
                name,
                Some(or_entry.child(column)),
                SymbolKind::Column {
                    table: "sysORTable".into(),
                    column,
                },
            ));
        }
        table
    }
}

impl SchemaSource for BuiltinSchema {
    fn load_module(&self, module: &str) -> Result<SymbolTable, SchemaError> {
        if module == SNMPV2_MIB {
            Ok(Self::snmpv2_mib())
        } else {
            Err(SchemaError::NotFound {
                module: module.to_string(),
            })
        }
    }

    fn describe(&self) -> String {
        format!("builtin [{SNMPV2_MIB}]")
    }
}
