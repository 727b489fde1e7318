//! Live Method-Table Patcher
//!
//! Rewrites the dispatch tables of a running process in place so that
//! calls to previously-defined behavior execute a freshly loaded
//! implementation, without restarting the process or re-resolving call
//! sites. Provides:
//! - Opaque implementation-address handles
//! - Live type handles with per-selector atomic slot installs
//! - An append-only registry of loaded code units with two-way symbol
//!   resolution
//! - A trace-and-replace engine every swap passes through
//! - Per-selector, whole-type, direct-diff and guaranteed-minimum swizzle
//!   strategies

pub mod addr; // Opaque implementation addresses
pub mod dispatch; // Selectors, method records, live type handles
pub mod image; // Code units & the append-only image registry
pub mod logger; // Diagnostic sinks
pub mod strategy; // Swizzle entry points
pub mod trace; // Trace-and-replace engine

// Re-export key types
pub use addr::ImplAddr;
pub use dispatch::{DispatchKind, LiveType, MethodRecord, Selector, TypeDescriptor};
pub use image::{CodeUnit, ImageRegistry, Symbol, UnitLoader, UnitMetadata};
pub use logger::{DiagnosticSink, Logger, MemorySink, LOG};
pub use strategy::{SwizzleConfig, SwizzleReport, Swizzler, RELOAD_COMPLETE_SELECTOR};
#[cfg(feature = "ui-lifecycle")]
pub use strategy::VIEW_DID_LOAD_SELECTOR;
pub use trace::{SkipReason, SwizzleOutcome, TraceEngine, TraceInfo, TraceRegistry};
