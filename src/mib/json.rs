//! Directory of compiled modules, one JSON file per module.
//!
//! ```json
//! {
//!   "module": "ATSL-MULTIFUNCTION-MIB",
//!   "symbols": {
//!     "mfActiveFunc": { "oid": "1.3.6.1.4.1.39412.1.12.1.1", "kind": "scalar" },
//!     "mfFuncType":   { "oid": "1.3.6.1.4.1.39412.1.12.1.2.1.2", "kind": "column",
//!                       "table": "mfFuncTable", "column": 2 }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::{SchemaError, SchemaSource, Symbol, SymbolKind, SymbolTable};
use crate::oid::Oid;

#[derive(Deserialize)]
struct ModuleFile {
    #[serde(default)]
    module: Option<String>,
    #[serde(default)]
    symbols: BTreeMap<String, SymbolEntry>,
}

#[derive(Deserialize)]
struct SymbolEntry {
    #[serde(default)]
    oid: Option<String>,
    #[serde(flatten)]
    kind: SymbolKind,
}

/// Reads `<dir>/<MODULE>.json`.
#[derive(Debug, Clone)]
pub struct JsonSchemaDir {
    root: PathBuf,
}

impl JsonSchemaDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn module_path(&self, module: &str) -> Option<PathBuf> {
        let valid = !module.is_empty()
            && module
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        valid.then(|| self.root.join(format!("{module}.json")))
    }
}

impl SchemaSource for JsonSchemaDir {
    fn load_module(&self, module: &str) -> Result<SymbolTable, SchemaError> {
        let not_found = || SchemaError::NotFound {
            module: module.to_string(),
        };
        let path = self.module_path(module).ok_or_else(not_found)?;

        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_found()),
            Err(source) => return Err(SchemaError::Io { path, source }),
        };
        let file: ModuleFile =
            serde_json::from_str(&text).map_err(|source| SchemaError::Parse {
                path: path.clone(),
                source,
            })?;

        if let Some(declared) = &file.module
            && declared != module
        {
            tracing::warn!(target: "albedo_snmp::mib", { path = %path.display(), declared, snmp.module = module }, "module name in file does not match file name");
        }

        let mut table = SymbolTable::new(module);
        for (name, entry) in file.symbols {
            let oid = match entry.oid {
                Some(text) => Some(Oid::parse(&text).map_err(|_| SchemaError::InvalidOid {
                    module: module.to_string(),
                    symbol: name.clone(),
                    value: text.clone(),
                })?),
                None => None,
            };
            table.insert(Symbol::new(name, oid, entry.kind));
        }

        tracing::debug!(target: "albedo_snmp::mib", { path = %path.display(), symbols = table.len() }, "loaded module {}", module);
        Ok(table)
    }

    fn describe(&self) -> String {
        format!("json dir {}", self.root.display())
    }
}
