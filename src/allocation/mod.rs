//! Turning expense records into per-participant shares and totals.

pub mod diagnostics;
pub mod engine;

pub use diagnostics::{Diagnostic, DiagnosticAction, DiagnosticKind, DiagnosticSink, NullSink};
pub use engine::{Allocation, AllocationEngine, RecordAllocation, SharePolicy, DEFAULT_TOLERANCE};
