//! Loaded code units and the append-only image registry
//!
//! Units are produced by an external loader and appended in load order.
//! Replacement symbols are only ever resolved against the most recently
//! appended unit; reverse lookup scans every unit newest-first so an
//! implementation from any earlier load still resolves to its name.

use std::collections::HashMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::addr::ImplAddr;

/// A name/address association inside one code unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub addr: ImplAddr,
}

/// Metadata describing one loaded artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitMetadata {
    pub name: String,
    pub source_path: String,
    pub loaded_at: u64,
}

/// One loaded artifact contributing implementations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeUnit {
    /// Load-order index, assigned by the registry on append.
    pub sequence: u64,
    pub metadata: UnitMetadata,
    symbols: HashMap<String, ImplAddr>,
}

impl CodeUnit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            sequence: 0,
            metadata: UnitMetadata {
                name: name.into(),
                source_path: String::new(),
                loaded_at: std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or(0),
            },
            symbols: HashMap::new(),
        }
    }

    pub fn with_source_path(mut self, path: impl Into<String>) -> Self {
        self.metadata.source_path = path.into();
        self
    }

    pub fn define_symbol(&mut self, name: impl Into<String>, addr: ImplAddr) {
        self.symbols.insert(name.into(), addr);
    }

    pub fn resolve(&self, name: &str) -> Option<ImplAddr> {
        self.symbols.get(name).copied()
    }

    /// Name of the symbol whose implementation lives at `addr`, if any.
    pub fn reverse_lookup(&self, addr: ImplAddr) -> Option<&str> {
        self.symbols
            .iter()
            .find(|(_, a)| **a == addr)
            .map(|(name, _)| name.as_str())
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    /// Snapshot of every symbol the unit exports, sorted by name.
    pub fn symbols(&self) -> Vec<Symbol> {
        let mut symbols: Vec<Symbol> = self
            .symbols
            .iter()
            .map(|(name, addr)| Symbol {
                name: name.clone(),
                addr: *addr,
            })
            .collect();
        symbols.sort_by(|a, b| a.name.cmp(&b.name));
        symbols
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn deserialize(data: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(data)?)
    }
}

/// External collaborator that materializes a freshly compiled artifact
/// into a code unit with its symbol table.
pub trait UnitLoader {
    fn load(&mut self, path: &str) -> Result<CodeUnit>;
}

/// Append-only record of every unit loaded into the process.
#[derive(Debug, Default)]
pub struct ImageRegistry {
    units: Vec<CodeUnit>,
}

impl ImageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with the running program's own symbols as unit 0,
    /// so pre-reload implementation addresses still reverse-resolve.
    pub fn with_baseline(baseline: CodeUnit) -> Self {
        let mut registry = Self::new();
        registry.append(baseline);
        registry
    }

    /// Record a freshly loaded unit as the newest. Returns its sequence.
    pub fn append(&mut self, mut unit: CodeUnit) -> u64 {
        let sequence = self.units.len() as u64;
        unit.sequence = sequence;
        self.units.push(unit);
        sequence
    }

    /// Load through an external loader and record the result.
    pub fn ingest(&mut self, loader: &mut dyn UnitLoader, path: &str) -> Result<u64> {
        let unit = loader.load(path)?;
        Ok(self.append(unit))
    }

    /// The most recently loaded unit.
    pub fn latest(&self) -> Option<&CodeUnit> {
        self.units.last()
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Resolve a name against the most recently loaded unit only. Older
    /// units may carry stale or colliding symbols and are never consulted.
    pub fn resolve_in_latest(&self, name: &str) -> Option<ImplAddr> {
        self.latest()?.resolve(name)
    }

    /// Resolve a live implementation address back to its originating
    /// symbol name, searching newest unit first.
    pub fn reverse_lookup(&self, addr: ImplAddr) -> Option<String> {
        self.units
            .iter()
            .rev()
            .find_map(|unit| unit.reverse_lookup(addr).map(str::to_string))
    }

    /// Human-readable "name in unit" attribution for diagnostics.
    pub fn describe_symbol(&self, name: &str) -> String {
        for unit in self.units.iter().rev() {
            if unit.resolve(name).is_some() {
                return format!("{} in {}", name, unit.metadata.name);
            }
        }
        name.to_string()
    }
}
