//! # ledger-settle
//!
//! Shared-expense allocation and debt settlement-reduction engine.
//!
//! Given a group of participants and the expenses they paid for each
//! other, this engine works out who owes whom and reduces the resulting
//! debt graph to a short list of settling transfers.
//!
//! ## Architecture
//!
//! - **core**: Foundational types: participants, expense records, ledgers, debt matrices
//! - **allocation**: Per-record shares, participant totals and diagnostics
//! - **graph**: Debt matrix construction, self-loop removal and bidirectional netting
//! - **settlement**: Greedy, hub and tree settlement strategies plus summaries
//! - **pipeline**: Runs every stage in order and keeps each intermediate matrix
//! - **simulation**: Random ledgers for testing and benchmarking

pub mod allocation;
pub mod core;
pub mod graph;
pub mod pipeline;
pub mod settlement;
pub mod simulation;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::allocation::{
        Allocation, AllocationEngine, Diagnostic, DiagnosticKind, DiagnosticSink, SharePolicy,
    };
    pub use crate::core::expense::{ExpenseRecord, SplitMode};
    pub use crate::core::ledger::{Ledger, LedgerError};
    pub use crate::core::matrix::{DebtMatrix, MatrixError, Transfer};
    pub use crate::core::participant::{Participant, ParticipantName};
    pub use crate::graph::{DebtMatrixBuilder, GraphReducer};
    pub use crate::pipeline::{Pipeline, PipelineConfig, PipelineOutcome, Stage};
    pub use crate::settlement::{SettlementStrategy, StrategyKind};
}
