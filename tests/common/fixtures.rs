//! Schema fixtures and well-known addresses.

use albedo_snmp::mib::{BuiltinSchema, ChainedSchema, MemorySchema, Symbol, SymbolKind, SymbolTable};
use albedo_snmp::{Oid, Resolver, oid};

/// `ATSL-MULTIFUNCTION-MIB::mfActiveFunc`
pub const MF_ACTIVE: [u32; 11] = [1, 3, 6, 1, 4, 1, 39412, 1, 12, 1, 1];
/// `ATSL-MULTIFUNCTION-MIB::mfFuncTable`
pub const MF_TABLE: [u32; 11] = [1, 3, 6, 1, 4, 1, 39412, 1, 12, 1, 2];
/// `ATSL-MULTIFUNCTION-MIB::mfFuncType`
pub const MF_TYPE: [u32; 13] = [1, 3, 6, 1, 4, 1, 39412, 1, 12, 1, 2, 1, 2];
/// `ATSL-MULTIFUNCTION-MIB::mfFuncMode`
pub const MF_MODE: [u32; 13] = [1, 3, 6, 1, 4, 1, 39412, 1, 12, 1, 2, 1, 3];
/// `ATSL-CONFIG-FILES-MIB::configFilesOps`
pub const CF_TABLE: [u32; 10] = [1, 3, 6, 1, 4, 1, 39412, 1, 5, 2];

const CF_COLUMNS: [(&str, u32); 6] = [
    ("FileName", 2),
    ("Device", 3),
    ("Args", 4),
    ("Action", 5),
    ("Status", 6),
    ("Result", 7),
];

fn column(name: &str, table: &str, base: &Oid, number: u32) -> Symbol {
    Symbol::new(
        name,
        Some(base.join(&[1, number])),
        SymbolKind::Column {
            table: table.into(),
            column: number,
        },
    )
}

/// Instance address of a `configFilesOps` column for row `index`.
pub fn config_files_column(name: &str, index: u32) -> Oid {
    let (_, number) = CF_COLUMNS
        .iter()
        .find(|(column, _)| *column == name)
        .expect("unknown configFilesOps column");
    Oid::from_slice(&CF_TABLE).join(&[1, *number, index])
}

fn multifunction_mib() -> SymbolTable {
    let table = Oid::from_slice(&MF_TABLE);
    SymbolTable::new("ATSL-MULTIFUNCTION-MIB")
        .with(Symbol::new("atslMultifunctionMIB", None, SymbolKind::Definition))
        .with(Symbol::new(
            "mfActiveFunc",
            Some(Oid::from_slice(&MF_ACTIVE)),
            SymbolKind::Scalar,
        ))
        .with(Symbol::new("mfFuncTable", Some(table.clone()), SymbolKind::Table))
        .with(Symbol::new("mfFuncEntry", Some(table.child(1)), SymbolKind::Entry))
        .with(column("mfFuncIndex", "mfFuncTable", &table, 1))
        .with(column("mfFuncType", "mfFuncTable", &table, 2))
        .with(column("mfFuncMode", "mfFuncTable", &table, 3))
}

fn config_files_mib() -> SymbolTable {
    let table = Oid::from_slice(&CF_TABLE);
    let mut mib = SymbolTable::new("ATSL-CONFIG-FILES-MIB")
        .with(Symbol::new("configFilesOps", Some(table.clone()), SymbolKind::Table))
        .with(Symbol::new("configFilesOpsEntry", Some(table.child(1)), SymbolKind::Entry));
    for (name, number) in CF_COLUMNS {
        mib.insert(column(&format!("configFilesOps{name}"), "configFilesOps", &table, number));
    }
    mib
}

fn demo_mib() -> SymbolTable {
    SymbolTable::new("ALBEDO-DEMO-MIB")
        .with(Symbol::new("demoRoot", Some(oid!(1, 3, 6, 1, 4, 1, 39412, 9)), SymbolKind::Node))
        .with(Symbol::new(
            "demoLabel",
            Some(oid!(1, 3, 6, 1, 4, 1, 39412, 9, 1)),
            SymbolKind::Scalar,
        ))
        .with(Symbol::new(
            "demoEnable",
            Some(oid!(1, 3, 6, 1, 4, 1, 39412, 9, 2)),
            SymbolKind::Scalar,
        ))
        .with(Symbol::new("DemoMode", None, SymbolKind::Definition))
}

pub fn fixture_schema() -> ChainedSchema {
    ChainedSchema::new()
        .with_source(
            MemorySchema::new()
                .with_module(multifunction_mib())
                .with_module(config_files_mib())
                .with_module(demo_mib()),
        )
        .with_source(BuiltinSchema)
}

pub fn fixture_resolver() -> Resolver {
    Resolver::new(fixture_schema())
}
