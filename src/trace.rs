//! Trace-and-replace engine
//!
//! Single choke point through which every implementation swap passes. The
//! candidate is registered with the trace registry for later call
//! attribution, then handed to the install callback that performs the
//! actual table mutation. Tracing never alters argument or return
//! semantics; the registry records, it does not interpose.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use crate::addr::ImplAddr;
use crate::dispatch::{MethodRecord, Selector};
use crate::logger::DiagnosticSink;

/// Reason a selector was left alone. Expected conditions, never faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The type has no slot for the selector.
    NoMethod,
    /// The existing implementation has no resolvable symbol name.
    NoSymbol,
    /// The latest unit does not define the symbol.
    NoReplacement,
    /// Candidate and existing implementation are the same address.
    Unchanged,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SkipReason::NoMethod => "no method",
            SkipReason::NoSymbol => "no symbol",
            SkipReason::NoReplacement => "no replacement",
            SkipReason::Unchanged => "unchanged",
        };
        write!(f, "{}", reason)
    }
}

/// Per-selector result of one swizzle attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SwizzleOutcome {
    /// New implementation installed; the line emitted on the sink.
    Replaced(String),
    /// Nothing to do.
    Skipped(SkipReason),
    /// A valid candidate was found but the table mutation declined it.
    Rejected(String),
}

impl SwizzleOutcome {
    pub fn replaced(&self) -> bool {
        matches!(self, SwizzleOutcome::Replaced(_))
    }
}

/// Attribution recorded for an installed implementation.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceInfo {
    /// Slot label, e.g. `-[Controller render]`.
    pub label: String,
    pub selector: Selector,
    pub type_encoding: String,
    /// The implementation this candidate replaced.
    pub replaced: ImplAddr,
}

/// Bookkeeping for every implementation routed through the engine.
#[derive(Debug, Default)]
pub struct TraceRegistry {
    shims: Mutex<HashMap<ImplAddr, TraceInfo>>,
}

impl TraceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record attribution for a candidate about to be installed and return
    /// the address to install. The candidate passes through unchanged.
    pub fn wrap(
        &self,
        candidate: ImplAddr,
        existing: ImplAddr,
        label: &str,
        meta: &MethodRecord,
    ) -> ImplAddr {
        let info = TraceInfo {
            label: label.to_string(),
            selector: meta.selector.clone(),
            type_encoding: meta.type_encoding.clone(),
            replaced: existing,
        };
        self.shims.lock().unwrap().insert(candidate, info);
        candidate
    }

    pub fn info(&self, addr: ImplAddr) -> Option<TraceInfo> {
        self.shims.lock().unwrap().get(&addr).cloned()
    }

    pub fn shim_count(&self) -> usize {
        self.shims.lock().unwrap().len()
    }
}

/// The replacement engine. Owns the trace registry so every swap that goes
/// through it stays attributable.
#[derive(Debug, Default)]
pub struct TraceEngine {
    registry: TraceRegistry,
}

impl TraceEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &TraceRegistry {
        &self.registry
    }

    /// Wrap `candidate` for tracing and hand it to `install`, which
    /// performs the actual table mutation and returns a description on
    /// success. Callers must already have checked that `candidate` differs
    /// from `existing`; the engine does not re-verify.
    pub fn trace_and_replace<F>(
        &self,
        existing: ImplAddr,
        candidate: ImplAddr,
        label: &str,
        meta: &MethodRecord,
        sink: &dyn DiagnosticSink,
        install: F,
    ) -> SwizzleOutcome
    where
        F: FnOnce(ImplAddr) -> Option<String>,
    {
        let traced = self.registry.wrap(candidate, existing, label, meta);
        match install(traced) {
            Some(description) => {
                sink.line(&description);
                SwizzleOutcome::Replaced(description)
            }
            None => {
                let message = format!("install rejected for {}", label);
                sink.warn(&message);
                SwizzleOutcome::Rejected(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::MemorySink;

    fn render_record(imp: ImplAddr) -> MethodRecord {
        MethodRecord {
            selector: Selector::new("render"),
            imp,
            type_encoding: "v@:".to_string(),
        }
    }

    #[test]
    fn test_wrap_records_attribution() {
        let registry = TraceRegistry::new();
        let existing = ImplAddr::from_raw(0x100);
        let candidate = ImplAddr::from_raw(0x200);

        let traced = registry.wrap(
            candidate,
            existing,
            "-[Controller render]",
            &render_record(existing),
        );
        assert_eq!(traced, candidate);

        let info = registry.info(candidate).unwrap();
        assert_eq!(info.label, "-[Controller render]");
        assert_eq!(info.replaced, existing);
        assert_eq!(info.type_encoding, "v@:");
        assert_eq!(registry.shim_count(), 1);
    }

    #[test]
    fn test_successful_install_is_surfaced() {
        let engine = TraceEngine::new();
        let sink = MemorySink::new();
        let existing = ImplAddr::from_raw(0x100);
        let candidate = ImplAddr::from_raw(0x200);

        let outcome = engine.trace_and_replace(
            existing,
            candidate,
            "-[Controller render]",
            &render_record(existing),
            &sink,
            |imp| Some(format!("Swizzled -[Controller render] to {}", imp)),
        );

        assert!(outcome.replaced());
        assert!(sink.contains("Swizzled -[Controller render] to 0x200"));
    }

    #[test]
    fn test_declined_install_warns() {
        let engine = TraceEngine::new();
        let sink = MemorySink::new();
        let existing = ImplAddr::from_raw(0x100);
        let candidate = ImplAddr::from_raw(0x200);

        let outcome = engine.trace_and_replace(
            existing,
            candidate,
            "-[Controller render]",
            &render_record(existing),
            &sink,
            |_| None,
        );

        assert_eq!(
            outcome,
            SwizzleOutcome::Rejected("install rejected for -[Controller render]".to_string())
        );
        assert!(sink.contains("warning: install rejected for -[Controller render]"));
    }
}
