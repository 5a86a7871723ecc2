//! Symbolic address resolution.
//!
//! [`Resolver`] turns `(module, symbol, indices)` into an [`Oid`] and back.
//! Modules are loaded from a [`SchemaSource`] the first time they are
//! referenced and kept for the lifetime of the resolver.
//!
//! ```
//! use albedo_snmp::resolver::Resolver;
//!
//! let resolver = Resolver::builtin();
//! let oid = resolver.resolve("SNMPv2-MIB", "sysName", &[0]).unwrap();
//! assert_eq!(oid.to_string(), "1.3.6.1.2.1.1.5.0");
//! assert_eq!(resolver.reverse(&oid).to_string(), "SNMPv2-MIB::sysName.0");
//!
//! // Numeric input passes through untouched.
//! let raw = resolver.resolve_name("1.3.6.1.2.1.1.5.0").unwrap();
//! assert_eq!(raw, oid);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{Error, ResolutionErrorKind, Result};
use crate::mib::{
    BuiltinSchema, ChainedSchema, JsonSchemaDir, SchemaError, SchemaSource, Symbol, SymbolTable,
};
use crate::oid::Oid;

/// Separator between module and symbol in a qualified name.
pub const MODULE_SEPARATOR: &str = "::";

/// Lazily loading, caching name resolver.
pub struct Resolver {
    source: Box<dyn SchemaSource>,
    modules: RwLock<HashMap<String, Arc<SymbolTable>>>,
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("source", &self.source.describe())
            .field("loaded", &self.loaded_modules())
            .finish()
    }
}

impl Resolver {
    pub fn new(source: impl SchemaSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            modules: RwLock::new(HashMap::new()),
        }
    }

    /// Only the built-in `SNMPv2-MIB`.
    pub fn builtin() -> Self {
        Self::new(BuiltinSchema)
    }

    /// JSON modules from `dir`, falling back to the built-in modules.
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(
            ChainedSchema::new()
                .with_source(JsonSchemaDir::new(dir))
                .with_source(BuiltinSchema),
        )
    }

    /// Names of the modules loaded so far, sorted.
    pub fn loaded_modules(&self) -> Vec<String> {
        let modules = self.modules.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<_> = modules.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// The symbol table for `module`, loading it on first use.
    pub fn module(&self, module: &str) -> Result<Arc<SymbolTable>> {
        if let Some(table) = self
            .modules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(module)
        {
            return Ok(Arc::clone(table));
        }

        let table = match self.source.load_module(module) {
            Ok(table) => Arc::new(table),
            Err(e) => {
                match &e {
                    SchemaError::NotFound { .. } => {
                        tracing::debug!(target: "albedo_snmp::resolver", { snmp.module = module }, "{}", e)
                    }
                    _ => {
                        tracing::warn!(target: "albedo_snmp::resolver", { snmp.module = module, error = %e }, "failed to load module")
                    }
                }
                return Err(Error::resolution(module, "", ResolutionErrorKind::ModuleNotFound));
            }
        };

        tracing::debug!(target: "albedo_snmp::resolver", { snmp.module = module, symbols = table.len() }, "module loaded");
        let mut modules = self.modules.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(
            modules.entry(module.to_string()).or_insert(table),
        ))
    }

    /// Look up a symbol definition.
    pub fn symbol(&self, module: &str, symbol: &str) -> Result<Symbol> {
        let table = self.module(module).map_err(|_| {
            Error::resolution(module, symbol, ResolutionErrorKind::ModuleNotFound)
        })?;
        table
            .lookup(symbol)
            .cloned()
            .ok_or_else(|| Error::resolution(module, symbol, ResolutionErrorKind::SymbolNotFound))
    }

    /// Resolve `module::symbol` and append `indices` verbatim.
    ///
    /// A numeric `symbol` is parsed and returned as-is (plus indices) without
    /// consulting any module. The number and range of indices are not checked
    /// against the table definition.
    pub fn resolve(&self, module: &str, symbol: &str, indices: &[u32]) -> Result<Oid> {
        if Oid::is_numeric(symbol) {
            return Ok(Oid::parse(symbol)?.join(indices));
        }
        if module.is_empty() {
            return Err(Error::resolution(module, symbol, ResolutionErrorKind::ModuleNotFound));
        }

        let definition = self.symbol(module, symbol)?;
        let Some(base) = definition.oid else {
            return Err(Error::resolution(
                module,
                symbol,
                ResolutionErrorKind::SymbolHasNoAddress,
            ));
        };
        let oid = base.join(indices);
        tracing::trace!(target: "albedo_snmp::resolver", { snmp.module = module, snmp.symbol = symbol, snmp.oid = %oid }, "resolved");
        Ok(oid)
    }

    /// Resolve a textual name: `MODULE::symbol`, `MODULE::symbol.1.2` or a
    /// dotted numeric OID.
    pub fn resolve_name(&self, name: &str) -> Result<Oid> {
        let Some((module, rest)) = name.split_once(MODULE_SEPARATOR) else {
            return Oid::parse(name);
        };

        let (symbol, suffix) = match rest.split_once('.') {
            Some((symbol, suffix)) => (symbol, Some(suffix)),
            None => (rest, None),
        };
        let indices = match suffix {
            Some(suffix) => suffix
                .split('.')
                .map(|arc| arc.parse::<u32>())
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|_| Error::InvalidOid(name.into()).boxed())?,
            None => Vec::new(),
        };
        self.resolve(module, symbol, &indices)
    }

    /// Best-effort symbolic form of `oid`.
    ///
    /// Searches the modules loaded so far for the longest symbol address that
    /// prefixes `oid`. Never fails; without a match the numeric form is
    /// returned.
    pub fn reverse(&self, oid: &Oid) -> Location {
        let modules = self.modules.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<_> = modules.keys().collect();
        names.sort_unstable();

        let mut best: Option<(&str, &Symbol, &[u32])> = None;
        for name in names {
            let Some((symbol, suffix)) = modules[name].locate(oid) else {
                continue;
            };
            if best.is_none_or(|(_, _, best_suffix)| suffix.len() < best_suffix.len()) {
                best = Some((name, symbol, suffix));
            }
        }

        match best {
            Some((module, symbol, suffix)) => Location::Symbolic {
                module: module.to_string(),
                name: symbol.name.clone(),
                suffix: suffix.to_vec(),
            },
            None => Location::Numeric(oid.clone()),
        }
    }

    /// Describe the schema source and what has been loaded from it.
    pub fn diagnose(&self) -> Diagnostics {
        let modules = self.modules.read().unwrap_or_else(PoisonError::into_inner);
        let mut loaded: Vec<_> = modules
            .iter()
            .map(|(name, table)| (name.clone(), table.len()))
            .collect();
        loaded.sort_unstable();
        Diagnostics {
            source: self.source.describe(),
            loaded,
        }
    }
}

/// Result of a reverse lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Symbolic {
        module: String,
        name: String,
        suffix: Vec<u32>,
    },
    Numeric(Oid),
}

impl Location {
    pub fn is_symbolic(&self) -> bool {
        matches!(self, Location::Symbolic { .. })
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Symbolic {
                module,
                name,
                suffix,
            } => {
                write!(f, "{module}{MODULE_SEPARATOR}{name}")?;
                for arc in suffix {
                    write!(f, ".{arc}")?;
                }
                Ok(())
            }
            Location::Numeric(oid) => write!(f, "{oid}"),
        }
    }
}

/// Snapshot of resolver state, see [`Resolver::diagnose`].
#[derive(Debug, Clone)]
pub struct Diagnostics {
    pub source: String,
    /// `(module, symbol count)`, sorted by module.
    pub loaded: Vec<(String, usize)>,
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "schema source: {}", self.source)?;
        if self.loaded.is_empty() {
            return writeln!(f, "no modules loaded");
        }
        writeln!(f, "loaded modules:")?;
        for (module, count) in &self.loaded {
            writeln!(f, "  {module} ({count} symbols)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mib::{MemorySchema, SymbolKind};
    use crate::oid;

    fn resolver() -> Resolver {
        let table = SymbolTable::new("DEMO-MIB")
            .with(Symbol::new("demoEnable", Some(oid!(1, 3, 6, 1, 4, 1, 39412, 9, 1)), SymbolKind::Scalar))
            .with(Symbol::new("demoMIB", None, SymbolKind::Definition));
        Resolver::new(
            ChainedSchema::new()
                .with_source(MemorySchema::new().with_module(table))
                .with_source(BuiltinSchema),
        )
    }

    #[test]
    fn resolve_appends_indices() {
        let r = resolver();
        assert_eq!(
            r.resolve("DEMO-MIB", "demoEnable", &[0]).unwrap(),
            oid!(1, 3, 6, 1, 4, 1, 39412, 9, 1, 0)
        );
        assert_eq!(
            r.resolve("DEMO-MIB", "demoEnable", &[4, 2]).unwrap(),
            oid!(1, 3, 6, 1, 4, 1, 39412, 9, 1, 4, 2)
        );
    }

    #[test]
    fn resolution_failures() {
        let r = resolver();
        let reason = |e: Box<Error>| match *e {
            Error::Resolution { reason, .. } => reason,
            other => panic!("unexpected error {other:?}"),
        };
        assert_eq!(
            reason(r.resolve("NOPE-MIB", "x", &[]).unwrap_err()),
            ResolutionErrorKind::ModuleNotFound
        );
        assert_eq!(
            reason(r.resolve("DEMO-MIB", "demoMissing", &[]).unwrap_err()),
            ResolutionErrorKind::SymbolNotFound
        );
        assert_eq!(
            reason(r.resolve("DEMO-MIB", "demoMIB", &[]).unwrap_err()),
            ResolutionErrorKind::SymbolHasNoAddress
        );
    }

    #[test]
    fn failed_module_is_not_cached() {
        let r = resolver();
        assert!(r.resolve("NOPE-MIB", "x", &[]).is_err());
        assert!(r.loaded_modules().is_empty());
        r.resolve("DEMO-MIB", "demoEnable", &[]).unwrap();
        assert_eq!(r.loaded_modules(), ["DEMO-MIB"]);
    }

    #[test]
    fn resolve_name_forms() {
        let r = resolver();
        assert_eq!(
            r.resolve_name("DEMO-MIB::demoEnable.0").unwrap(),
            oid!(1, 3, 6, 1, 4, 1, 39412, 9, 1, 0)
        );
        assert_eq!(
            r.resolve_name("SNMPv2-MIB::sysDescr").unwrap(),
            oid!(1, 3, 6, 1, 2, 1, 1, 1)
        );
        assert_eq!(r.resolve_name(".1.3.6.1").unwrap(), oid!(1, 3, 6, 1));
        assert!(r.resolve_name("DEMO-MIB::demoEnable.x").is_err());
        assert!(r.resolve_name("sysDescr").is_err());
    }

    #[test]
    fn reverse_falls_back_to_numeric() {
        let r = resolver();
        let oid = oid!(1, 3, 6, 1, 4, 1, 39412, 9, 1, 0);
        assert_eq!(r.reverse(&oid), Location::Numeric(oid.clone()));
        assert_eq!(r.reverse(&oid).to_string(), "1.3.6.1.4.1.39412.9.1.0");

        r.module("DEMO-MIB").unwrap();
        assert_eq!(r.reverse(&oid).to_string(), "DEMO-MIB::demoEnable.0");
    }

    #[test]
    fn diagnostics_list_loaded_modules() {
        let r = resolver();
        r.module("SNMPv2-MIB").unwrap();
        let report = r.diagnose();
        assert_eq!(report.loaded.len(), 1);
        assert!(report.to_string().contains("SNMPv2-MIB"));
        assert!(report.source.contains("builtin"));
    }
}
