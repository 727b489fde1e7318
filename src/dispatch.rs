//! Live type handles and their dispatch tables
//!
//! A `TypeDescriptor` is the handle to a class in the running process. It
//! owns a dispatch table mapping selectors to method records; the swizzler
//! only ever mutates the implementation address inside existing records,
//! never the table's shape.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::addr::ImplAddr;

/// Identity of an operation on a type, shared across versions of that type.
/// Matching is by equality, never by implementation address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selector(pub String);

impl Selector {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One slot in a dispatch table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodRecord {
    pub selector: Selector,

    /// Current implementation address.
    pub imp: ImplAddr,

    /// Signature metadata. Carried forward verbatim on every replacement;
    /// only the address ever changes.
    pub type_encoding: String,
}

/// Whether a table dispatches on instances or on the type itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchKind {
    Instance,
    Meta,
}

impl DispatchKind {
    /// One-character diagnostic prefix: "-" for instance, "+" for meta.
    pub fn prefix(&self) -> &'static str {
        match self {
            DispatchKind::Instance => "-",
            DispatchKind::Meta => "+",
        }
    }
}

/// Introspection surface the swizzler needs from a live type.
///
/// Kept narrow so tests can substitute partial runtimes, e.g. a type whose
/// enumeration is unavailable while individual slots still resolve.
pub trait LiveType {
    fn type_name(&self) -> &str;

    fn kind(&self) -> DispatchKind;

    /// Fresh snapshot of every selector currently in the dispatch table.
    /// Order is stable within one snapshot so logs are reproducible.
    fn all_selectors(&self) -> Vec<Selector>;

    /// Current record for a selector, if the type has one.
    fn locate(&self, selector: &Selector) -> Option<MethodRecord>;

    /// Atomically point a slot at a new implementation. Returns a one-line
    /// slot label on success, `None` if the slot no longer exists or the
    /// recorded type encoding does not match `type_encoding`.
    fn install_slot(
        &self,
        selector: &Selector,
        imp: ImplAddr,
        type_encoding: &str,
    ) -> Option<String>;
}

/// Handle to a class in the running process, owning its dispatch table.
///
/// The internal mutex is the per-call locking the table mutation primitive
/// guarantees: each install is independently atomic, a whole-type pass is
/// not transactional.
pub struct TypeDescriptor {
    name: String,
    kind: DispatchKind,
    table: Mutex<HashMap<Selector, MethodRecord>>,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>, kind: DispatchKind) -> Self {
        Self {
            name: name.into(),
            kind,
            table: Mutex::new(HashMap::new()),
        }
    }

    /// Seed a slot. Used by whatever constructs type handles; the swizzler
    /// itself never adds or removes slots.
    pub fn define_method(
        &self,
        selector: Selector,
        imp: ImplAddr,
        type_encoding: impl Into<String>,
    ) {
        let record = MethodRecord {
            selector: selector.clone(),
            imp,
            type_encoding: type_encoding.into(),
        };
        self.table.lock().unwrap().insert(selector, record);
    }

    pub fn method_count(&self) -> usize {
        self.table.lock().unwrap().len()
    }
}

impl LiveType for TypeDescriptor {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> DispatchKind {
        self.kind
    }

    fn all_selectors(&self) -> Vec<Selector> {
        let table = self.table.lock().unwrap();
        let mut selectors: Vec<Selector> = table.keys().cloned().collect();
        selectors.sort_by(|a, b| a.0.cmp(&b.0));
        selectors
    }

    fn locate(&self, selector: &Selector) -> Option<MethodRecord> {
        self.table.lock().unwrap().get(selector).cloned()
    }

    fn install_slot(
        &self,
        selector: &Selector,
        imp: ImplAddr,
        type_encoding: &str,
    ) -> Option<String> {
        let mut table = self.table.lock().unwrap();
        let record = table.get_mut(selector)?;
        if record.type_encoding != type_encoding {
            return None;
        }
        record.imp = imp;
        Some(format!("{}[{} {}]", self.kind.prefix(), self.name, selector))
    }
}
