//! Swizzle strategies
//!
//! Entry points a reload orchestrator calls after a new code unit lands.
//! All of them are total: every not-found condition is a soft skip reported
//! on the diagnostic sink, and the aggregate replacement count is the only
//! caller-visible signal. A count of 0 means "nothing to do", not failure.

use crate::dispatch::{LiveType, Selector};
use crate::image::ImageRegistry;
use crate::logger::DiagnosticSink;
use crate::trace::{SkipReason, SwizzleOutcome, TraceEngine};

/// The on-reload-complete hook every reloadable type may implement.
pub const RELOAD_COMPLETE_SELECTOR: &str = "reload_complete";

/// View hierarchy refresh hook, re-linked on interactive-UI builds.
#[cfg(feature = "ui-lifecycle")]
pub const VIEW_DID_LOAD_SELECTOR: &str = "view_did_load";

fn default_lifecycle_selectors() -> Vec<Selector> {
    #[allow(unused_mut)]
    let mut selectors = vec![Selector::new(RELOAD_COMPLETE_SELECTOR)];
    #[cfg(feature = "ui-lifecycle")]
    selectors.push(Selector::new(VIEW_DID_LOAD_SELECTOR));
    selectors
}

/// Tunables for a swizzle pass.
#[derive(Debug, Clone)]
pub struct SwizzleConfig {
    /// Selectors the guaranteed-minimum fallback always re-links.
    pub lifecycle_selectors: Vec<Selector>,

    /// Whether soft skips emit diagnostic lines. Warnings always do.
    pub log_skips: bool,
}

impl Default for SwizzleConfig {
    fn default() -> Self {
        Self {
            lifecycle_selectors: default_lifecycle_selectors(),
            log_skips: false,
        }
    }
}

/// Aggregate of one swizzle pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwizzleReport {
    pub attempted: usize,
    pub replaced: usize,
    pub skipped: usize,
    pub rejected: usize,
}

impl SwizzleReport {
    fn record(&mut self, outcome: &SwizzleOutcome) {
        self.attempted += 1;
        match outcome {
            SwizzleOutcome::Replaced(_) => self.replaced += 1,
            SwizzleOutcome::Skipped(_) => self.skipped += 1,
            SwizzleOutcome::Rejected(_) => self.rejected += 1,
        }
    }

    fn summary(&self, type_name: &str) -> String {
        format!(
            "{}: replaced {} of {} selectors ({} skipped, {} rejected)",
            type_name, self.replaced, self.attempted, self.skipped, self.rejected
        )
    }
}

/// Applies newly loaded implementations onto live types.
pub struct Swizzler<'a> {
    registry: &'a ImageRegistry,
    sink: &'a dyn DiagnosticSink,
    engine: TraceEngine,
    config: SwizzleConfig,
}

impl<'a> Swizzler<'a> {
    pub fn new(registry: &'a ImageRegistry, sink: &'a dyn DiagnosticSink) -> Self {
        Self::with_config(registry, sink, SwizzleConfig::default())
    }

    pub fn with_config(
        registry: &'a ImageRegistry,
        sink: &'a dyn DiagnosticSink,
        config: SwizzleConfig,
    ) -> Self {
        Self {
            registry,
            sink,
            engine: TraceEngine::new(),
            config,
        }
    }

    pub fn engine(&self) -> &TraceEngine {
        &self.engine
    }

    /// Re-resolve one selector's implementation against the newest loaded
    /// unit and install it if it changed. Returns 0 or 1.
    pub fn reswizzle_one_selector(&self, ty: &dyn LiveType, selector: &Selector) -> usize {
        if self.relink(ty, selector).replaced() {
            1
        } else {
            0
        }
    }

    /// Re-link every selector currently on the type. An empty enumeration
    /// yields 0, which callers treat as "nothing to do".
    pub fn reswizzle_all_selectors(&self, ty: &dyn LiveType) -> usize {
        let mut report = SwizzleReport::default();
        for selector in ty.all_selectors() {
            report.record(&self.relink(ty, &selector));
        }
        if report.attempted > 0 {
            self.sink.line(&report.summary(ty.type_name()));
        }
        report.replaced
    }

    /// Force re-link of the fixed lifecycle selectors, regardless of
    /// whether full enumeration was possible.
    pub fn reswizzle_guaranteed_minimum(&self, ty: &dyn LiveType) -> usize {
        let mut replaced = 0;
        for selector in &self.config.lifecycle_selectors {
            replaced += self.reswizzle_one_selector(ty, selector);
        }
        replaced
    }

    /// Install `new_type`'s implementations directly onto `old_type`
    /// wherever the addresses differ, without symbol resolution. Never adds
    /// slots to `old_type`.
    pub fn diff_and_swizzle(
        &self,
        new_type: Option<&dyn LiveType>,
        old_type: &dyn LiveType,
    ) -> usize {
        let new_type = match new_type {
            Some(ty) => ty,
            None => return 0,
        };

        let mut report = SwizzleReport::default();
        for selector in new_type.all_selectors() {
            let new_record = match new_type.locate(&selector) {
                Some(record) => record,
                None => continue,
            };
            let old_record = match old_type.locate(&selector) {
                Some(record) => record,
                // selector only exists on the new type; patching existing
                // behavior never adds dispatch entries
                None => continue,
            };
            if new_record.imp == old_record.imp {
                report.record(&self.skip(old_type, &selector, SkipReason::Unchanged));
                continue;
            }

            let label = slot_label(old_type, &selector);
            let outcome = self.engine.trace_and_replace(
                old_record.imp,
                new_record.imp,
                &label,
                &old_record,
                self.sink,
                |imp| {
                    old_type
                        .install_slot(&selector, imp, &new_record.type_encoding)
                        .map(|slot| format!("Swizzled {}", slot))
                },
            );
            report.record(&outcome);
        }
        if report.attempted > 0 {
            self.sink.line(&report.summary(old_type.type_name()));
        }
        report.replaced
    }

    /// The per-selector symbol re-link: locate the slot, reverse-resolve
    /// its current implementation to a name, resolve that name in the
    /// latest unit, and install keyed on the original type encoding.
    fn relink(&self, ty: &dyn LiveType, selector: &Selector) -> SwizzleOutcome {
        let record = match ty.locate(selector) {
            Some(record) => record,
            None => return self.skip(ty, selector, SkipReason::NoMethod),
        };

        let symbol = match self.registry.reverse_lookup(record.imp) {
            Some(symbol) => symbol,
            None => {
                self.sink.warn(&format!(
                    "no symbol for {} at {}",
                    slot_label(ty, selector),
                    record.imp
                ));
                return SwizzleOutcome::Skipped(SkipReason::NoSymbol);
            }
        };

        let candidate = match self.registry.resolve_in_latest(&symbol) {
            Some(candidate) => candidate,
            None => {
                self.sink.warn(&format!(
                    "no replacement for {} ({})",
                    slot_label(ty, selector),
                    symbol
                ));
                return SwizzleOutcome::Skipped(SkipReason::NoReplacement);
            }
        };

        if candidate == record.imp {
            return self.skip(ty, selector, SkipReason::Unchanged);
        }

        let label = slot_label(ty, selector);
        let origin = self.registry.describe_symbol(&symbol);
        self.engine.trace_and_replace(
            record.imp,
            candidate,
            &label,
            &record,
            self.sink,
            |imp| {
                ty.install_slot(selector, imp, &record.type_encoding)
                    .map(|slot| format!("Swizzled {} ({})", slot, origin))
            },
        )
    }

    fn skip(&self, ty: &dyn LiveType, selector: &Selector, reason: SkipReason) -> SwizzleOutcome {
        if self.config.log_skips {
            self.sink
                .line(&format!("skip {} ({})", slot_label(ty, selector), reason));
        }
        SwizzleOutcome::Skipped(reason)
    }
}

fn slot_label(ty: &dyn LiveType, selector: &Selector) -> String {
    format!("{}[{} {}]", ty.kind().prefix(), ty.type_name(), selector)
}
