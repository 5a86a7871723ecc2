//! Compiled schema modules.
//!
//! A [`SymbolTable`] is the compiled form of one MIB module: every named
//! node with its address and kind. Tables come from a [`SchemaSource`]:
//!
//! - [`JsonSchemaDir`] reads one `<MODULE>.json` file per module
//! - [`BuiltinSchema`] always provides the `SNMPv2-MIB` system group
//! - [`MemorySchema`] holds tables built in code
//! - [`ChainedSchema`] asks several sources in order, first hit wins
//!
//! Sources do no caching; the [`Resolver`](crate::resolver::Resolver) keeps
//! each module once it has been loaded.

mod builtin;
mod json;

pub use builtin::{BuiltinSchema, SNMPV2_MIB};
pub use json::JsonSchemaDir;

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::oid::Oid;

/// What a symbol names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SymbolKind {
    /// Interior node of the registration tree.
    Node,
    /// A single-instance object, addressed with index `0`.
    Scalar,
    /// A conceptual table.
    Table,
    /// The row type of a table.
    Entry,
    /// A table column; instances are addressed by appending the row index.
    Column { table: String, column: u32 },
    /// A definition without an address (module identity, textual convention).
    Definition,
}

/// A named node from a schema module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    /// `None` for definitions that carry no address.
    pub oid: Option<Oid>,
    pub kind: SymbolKind,
}

impl Symbol {
    pub fn new(name: impl Into<String>, oid: Option<Oid>, kind: SymbolKind) -> Self {
        Self {
            name: name.into(),
            oid,
            kind,
        }
    }
}

/// The symbols of one module, searchable by name and by address.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    module: String,
    by_name: HashMap<String, Symbol>,
    by_oid: BTreeMap<Oid, String>,
}

impl SymbolTable {
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            ..Self::default()
        }
    }

    /// Add a symbol, replacing any previous symbol with the same name.
    pub fn insert(&mut self, symbol: Symbol) {
        if let Some(previous) = self.by_name.get(&symbol.name)
            && let Some(oid) = &previous.oid
        {
            self.by_oid.remove(oid);
        }
        if let Some(oid) = &symbol.oid {
            self.by_oid.insert(oid.clone(), symbol.name.clone());
        }
        self.by_name.insert(symbol.name.clone(), symbol);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, symbol: Symbol) -> Self {
        self.insert(symbol);
        self
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.by_name.get(name)
    }

    /// Find the symbol with the longest address that prefixes `oid`.
    ///
    /// Returns the symbol and the remaining arcs of `oid` after its address.
    pub fn locate<'a>(&self, oid: &'a Oid) -> Option<(&Symbol, &'a [u32])> {
        let arcs = oid.arcs();
        (1..=arcs.len()).rev().find_map(|n| {
            let name = self.by_oid.get(&Oid::from_slice(&arcs[..n]))?;
            let symbol = self.by_name.get(name)?;
            Some((symbol, &arcs[n..]))
        })
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Symbols in address order; definitions without an address are skipped.
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.by_oid.values().filter_map(|name| self.by_name.get(name))
    }
}

/// Why a schema module could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("module {module} not found")]
    NotFound { module: String },

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{module}::{symbol} has invalid address {value:?}")]
    InvalidOid {
        module: String,
        symbol: String,
        value: String,
    },
}

/// Loads compiled schema modules by name.
pub trait SchemaSource: Send + Sync {
    fn load_module(&self, module: &str) -> Result<SymbolTable, SchemaError>;

    /// One-line description for diagnostics.
    fn describe(&self) -> String;
}

/// Modules held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySchema {
    modules: HashMap<String, SymbolTable>,
}

impl MemorySchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module(mut self, table: SymbolTable) -> Self {
        self.modules.insert(table.module().to_string(), table);
        self
    }
}

impl SchemaSource for MemorySchema {
    fn load_module(&self, module: &str) -> Result<SymbolTable, SchemaError> {
        self.modules
            .get(module)
            .cloned()
            .ok_or_else(|| SchemaError::NotFound {
                module: module.to_string(),
            })
    }

    fn describe(&self) -> String {
        let mut names: Vec<_> = self.modules.keys().map(String::as_str).collect();
        names.sort_unstable();
        format!("memory [{}]", names.join(", "))
    }
}

/// Several sources asked in order.
///
/// A `NotFound` from one source falls through to the next; any other error
/// stops the search.
#[derive(Default)]
pub struct ChainedSchema {
    sources: Vec<Box<dyn SchemaSource>>,
}

impl ChainedSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: impl SchemaSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }
}

impl SchemaSource for ChainedSchema {
    fn load_module(&self, module: &str) -> Result<SymbolTable, SchemaError> {
        for source in &self.sources {
            match source.load_module(module) {
                Err(SchemaError::NotFound { .. }) => continue,
                other => return other,
            }
        }
        Err(SchemaError::NotFound {
            module: module.to_string(),
        })
    }

    fn describe(&self) -> String {
        self.sources
            .iter()
            .map(|s| s.describe())
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}
