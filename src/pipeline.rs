//! End-to-end settlement: allocation, matrix construction, reduction and
//! settlement, keeping every intermediate matrix for inspection.

use crate::allocation::diagnostics::{Diagnostic, DiagnosticSink};
use crate::allocation::engine::{Allocation, AllocationEngine, SharePolicy, DEFAULT_TOLERANCE};
use crate::core::ledger::Ledger;
use crate::core::matrix::{DebtMatrix, Transfer};
use crate::core::participant::ParticipantName;
use crate::graph::{DebtMatrixBuilder, GraphReducer};
use crate::settlement::{SettlementReport, StageSummary, StrategyKind};
use log::{error, info};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Settings for one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub strategy: StrategyKind,
    /// Absolute tolerance for every comparison against zero.
    pub tolerance: Decimal,
    pub share_policy: SharePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::Greedy,
            tolerance: DEFAULT_TOLERANCE,
            share_policy: SharePolicy::Permissive,
        }
    }
}

/// The matrices a run produces, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Original,
    SelfLoopsRemoved,
    BidirectionalCancelled,
    Settled,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Original,
        Stage::SelfLoopsRemoved,
        Stage::BidirectionalCancelled,
        Stage::Settled,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Stage::Original => "Original Matrix",
            Stage::SelfLoopsRemoved => "Step 1: Remove Self-Loops",
            Stage::BidirectionalCancelled => "Step 2: Cancel Bidirectional Flows",
            Stage::Settled => "Final Matrix",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Every stage matrix of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageMatrices {
    pub original: DebtMatrix,
    pub self_loops_removed: DebtMatrix,
    pub bidirectional_cancelled: DebtMatrix,
    pub settled: DebtMatrix,
}

impl StageMatrices {
    pub fn get(&self, stage: Stage) -> &DebtMatrix {
        match stage {
            Stage::Original => &self.original,
            Stage::SelfLoopsRemoved => &self.self_loops_removed,
            Stage::BidirectionalCancelled => &self.bidirectional_cancelled,
            Stage::Settled => &self.settled,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Stage, &DebtMatrix)> {
        Stage::ALL.into_iter().map(move |stage| (stage, self.get(stage)))
    }

    /// Whether every stage carries the original matrix's net balances.
    pub fn is_conserved(&self, tolerance: Decimal) -> bool {
        let expected = self.original.net_balances();
        self.iter()
            .all(|(_, matrix)| matrix.is_conserved_against(&expected, tolerance))
    }
}

/// Everything a pipeline run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutcome {
    pub names: Vec<ParticipantName>,
    pub allocation: Allocation,
    pub stages: StageMatrices,
    /// Non-zero cells of the settled matrix, row-major.
    pub transfers: Vec<Transfer>,
    pub diagnostics: Vec<Diagnostic>,
    pub strategy: StrategyKind,
    pub tolerance: Decimal,
}

impl PipelineOutcome {
    pub fn matrix(&self, stage: Stage) -> &DebtMatrix {
        self.stages.get(stage)
    }

    pub fn final_matrix(&self) -> &DebtMatrix {
        &self.stages.settled
    }

    pub fn is_conserved(&self) -> bool {
        self.stages.is_conserved(self.tolerance)
    }

    pub fn summary(&self, stage: Stage) -> StageSummary {
        StageSummary::from_matrix(self.stages.get(stage), self.tolerance)
    }

    pub fn report(&self) -> SettlementReport {
        SettlementReport::compare(&self.stages.original, &self.stages.settled, self.tolerance)
    }
}

/// Runs a ledger through allocation, reduction and settlement.
///
/// # Examples
///
/// ```
/// use ledger_settle::prelude::*;
/// use rust_decimal_macros::dec;
///
/// let ledger = Ledger::new(
///     ["Alice", "Bob", "Charlie"],
///     vec![
///         ExpenseRecord::even("Dinner", dec!(120), "Alice", ["Alice", "Bob", "Charlie"]),
///         ExpenseRecord::even("Taxi", dec!(30), "Bob", ["Alice", "Bob", "Charlie"]),
///     ],
/// )
/// .unwrap();
///
/// let outcome = Pipeline::new(PipelineConfig::default()).run(&ledger);
///
/// assert!(outcome.is_conserved());
/// assert_eq!(outcome.transfers.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run(&self, ledger: &Ledger) -> PipelineOutcome {
        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let mut outcome = self.run_with_sink(ledger, &mut diagnostics);
        outcome.diagnostics = diagnostics;
        outcome
    }

    /// Like [`Pipeline::run`], but diagnostics go to `sink` instead of the
    /// outcome.
    pub fn run_with_sink(&self, ledger: &Ledger, sink: &mut dyn DiagnosticSink) -> PipelineOutcome {
        let engine = AllocationEngine::new(self.config.share_policy)
            .with_tolerance(self.config.tolerance);
        let allocation = engine.allocate_ledger(ledger, sink);
        info!(
            "allocated {} records ({} skipped) across {} participants",
            allocation.records().len(),
            allocation.skipped_count(),
            ledger.participant_count()
        );

        let names = ledger.participants().to_vec();
        let original = DebtMatrixBuilder::from_allocation(&allocation, &names);
        let stages = self.settle_matrix(&original);
        let transfers = stages.settled.transfers(self.config.tolerance);

        PipelineOutcome {
            names,
            allocation,
            stages,
            transfers,
            diagnostics: Vec::new(),
            strategy: self.config.strategy,
            tolerance: self.config.tolerance,
        }
    }

    /// Reduce and settle an existing debt matrix.
    pub fn settle_matrix(&self, original: &DebtMatrix) -> StageMatrices {
        let tolerance = self.config.tolerance;
        let reducer = GraphReducer::new(tolerance);
        info!(
            "{}: {} edges, gross {}",
            Stage::Original,
            original.edge_count(tolerance),
            original.gross_total()
        );

        let self_loops_removed = reducer.remove_self_loops(original);
        info!("{}: {} edges", Stage::SelfLoopsRemoved, self_loops_removed.edge_count(tolerance));

        let bidirectional_cancelled = reducer.cancel_bidirectional(&self_loops_removed);
        info!(
            "{}: {} edges",
            Stage::BidirectionalCancelled,
            bidirectional_cancelled.edge_count(tolerance)
        );

        let strategy = self.config.strategy.build(tolerance);
        let net = bidirectional_cancelled.net_balances();
        let settled = strategy.settle(&net, bidirectional_cancelled.names());
        info!(
            "{} ({}): {} transfers, gross {}",
            Stage::Settled,
            strategy.name(),
            settled.edge_count(tolerance),
            settled.gross_total()
        );

        let stages = StageMatrices {
            original: original.clone(),
            self_loops_removed,
            bidirectional_cancelled,
            settled,
        };
        if !stages.is_conserved(tolerance) {
            error!(
                "net balances changed during settlement with the {} strategy",
                strategy.name()
            );
        }
        stages
    }
}
