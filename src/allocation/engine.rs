use crate::allocation::diagnostics::{Diagnostic, DiagnosticAction, DiagnosticKind, DiagnosticSink};
use crate::core::expense::{ExpenseRecord, SplitMode};
use crate::core::ledger::{Ledger, MAX_LEDGER_VOLUME};
use crate::core::participant::{Participant, ParticipantName, ShareEntry};
use log::{debug, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Default absolute tolerance for comparing amounts.
pub const DEFAULT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 6);

/// How to treat EXPLICIT records whose stated shares disagree with the amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SharePolicy {
    /// Allocate the record as given and flag the discrepancy. Stated shares
    /// above the amount leave a negative residual for unspecified participants.
    #[default]
    Permissive,
    /// Skip the record when stated shares exceed the amount, or when every
    /// participant is specified and the shares do not add up to the amount.
    Strict,
}

/// The computed split of one expense record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordAllocation {
    pub record_index: usize,
    pub title: String,
    pub payer: Option<ParticipantName>,
    pub amount: Option<Decimal>,
    /// Share per sharing participant known to the ledger. Unknown names are
    /// dropped here even though they count toward an even split's divisor.
    /// Empty for skipped records.
    pub computed_shares: BTreeMap<ParticipantName, Decimal>,
    /// Per-head amount applied to participants without a stated share.
    /// `None` for skipped records.
    pub residual_share: Option<Decimal>,
}

impl RecordAllocation {
    fn skipped(record_index: usize, record: &ExpenseRecord) -> Self {
        Self {
            record_index,
            title: record.title().to_string(),
            payer: record.payer().cloned(),
            amount: record.amount(),
            computed_shares: BTreeMap::new(),
            residual_share: None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        self.residual_share.is_none()
    }

    /// Sum of the computed shares.
    pub fn share_total(&self) -> Decimal {
        self.computed_shares.values().copied().sum()
    }
}

/// Output of the allocation stage: one entry per input record, in input
/// order, plus per-participant totals in ledger order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    records: Vec<RecordAllocation>,
    participants: Vec<Participant>,
}

impl Allocation {
    pub fn records(&self) -> &[RecordAllocation] {
        &self.records
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn participant(&self, name: &ParticipantName) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.name == name)
    }

    /// `total_paid - total_owed` per participant, in ledger order.
    pub fn net_balances(&self) -> Vec<Decimal> {
        self.participants.iter().map(|p| p.net_balance).collect()
    }

    pub fn total_paid(&self) -> Decimal {
        self.participants.iter().map(|p| p.total_paid).sum()
    }

    pub fn total_owed(&self) -> Decimal {
        self.participants.iter().map(|p| p.total_owed).sum()
    }

    pub fn skipped_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_skipped()).count()
    }
}

/// Turns expense records into per-participant shares and totals.
///
/// Allocation is a pure function of its input: the ledger is never
/// modified and running the engine twice yields identical results.
///
/// # Examples
///
/// ```
/// use ledger_settle::prelude::*;
/// use rust_decimal_macros::dec;
///
/// let ledger = Ledger::new(
///     ["Alice", "Bob", "Charlie"],
///     vec![ExpenseRecord::even("Dinner", dec!(120), "Alice", ["Alice", "Bob", "Charlie"])],
/// )
/// .unwrap();
///
/// let mut diagnostics: Vec<Diagnostic> = Vec::new();
/// let allocation = AllocationEngine::default().allocate_ledger(&ledger, &mut diagnostics);
///
/// assert_eq!(allocation.net_balances(), vec![dec!(80), dec!(-40), dec!(-40)]);
/// assert!(diagnostics.is_empty());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AllocationEngine {
    policy: SharePolicy,
    tolerance: Decimal,
}

impl Default for AllocationEngine {
    fn default() -> Self {
        Self::new(SharePolicy::default())
    }
}

impl AllocationEngine {
    pub fn new(policy: SharePolicy) -> Self {
        Self {
            policy,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    pub fn with_tolerance(mut self, tolerance: Decimal) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn policy(&self) -> SharePolicy {
        self.policy
    }

    /// Allocate every record of a ledger over its participants.
    pub fn allocate_ledger(&self, ledger: &Ledger, sink: &mut dyn DiagnosticSink) -> Allocation {
        self.allocate(ledger.records(), ledger.participants(), sink)
    }

    /// Allocate `records` over the known `participants`.
    ///
    /// Records that cannot be allocated are skipped and reported to `sink`;
    /// they contribute nothing to the totals.
    pub fn allocate(
        &self,
        records: &[ExpenseRecord],
        participants: &[ParticipantName],
        sink: &mut dyn DiagnosticSink,
    ) -> Allocation {
        let index: HashMap<&ParticipantName, usize> = participants
            .iter()
            .enumerate()
            .map(|(i, name)| (name, i))
            .collect();
        let mut totals: Vec<Participant> =
            participants.iter().cloned().map(Participant::new).collect();
        let mut allocations = Vec::with_capacity(records.len());
        let mut ledger_volume = Decimal::ZERO;

        for (record_index, record) in records.iter().enumerate() {
            let mut report = |kind: DiagnosticKind, action: DiagnosticAction| {
                let diagnostic = Diagnostic {
                    record_index,
                    title: record.title().to_string(),
                    kind,
                    action,
                };
                warn!("{}", diagnostic);
                sink.report(diagnostic);
            };

            let Some((amount, payer)) = self.validate(record, &index, &mut report) else {
                allocations.push(RecordAllocation::skipped(record_index, record));
                continue;
            };

            let Some(volume) = record_volume(record, amount)
                .and_then(|v| ledger_volume.checked_add(v))
                .filter(|v| *v <= MAX_LEDGER_VOLUME)
            else {
                report(DiagnosticKind::AmountOverflow { amount }, DiagnosticAction::Skipped);
                allocations.push(RecordAllocation::skipped(record_index, record));
                continue;
            };

            let Some((mut shares, residual)) = self.compute_shares(record, amount, &mut report)
            else {
                allocations.push(RecordAllocation::skipped(record_index, record));
                continue;
            };
            ledger_volume = volume;

            shares.retain(|name, share| match index.get(name) {
                Some(&i) => {
                    totals[i].record_share(ShareEntry {
                        record_index,
                        title: record.title().to_string(),
                        total_amount: amount,
                        share: *share,
                        paid_by: payer.clone(),
                    });
                    true
                }
                None => {
                    report(
                        DiagnosticKind::UnknownParticipant { name: name.clone() },
                        DiagnosticAction::Ignored,
                    );
                    false
                }
            });
            if let Some(&i) = index.get(payer) {
                totals[i].record_payment(amount);
            }

            debug!(
                "allocated '{}' ({} paid by {}) across {} participants",
                record.title(),
                amount,
                payer,
                shares.len()
            );

            allocations.push(RecordAllocation {
                record_index,
                title: record.title().to_string(),
                payer: Some(payer.clone()),
                amount: Some(amount),
                computed_shares: shares,
                residual_share: Some(residual),
            });
        }

        for participant in &mut totals {
            participant.settle_balance();
        }

        Allocation {
            records: allocations,
            participants: totals,
        }
    }

    /// Returns the amount and payer when the record can be allocated.
    fn validate<'r>(
        &self,
        record: &'r ExpenseRecord,
        index: &HashMap<&ParticipantName, usize>,
        report: &mut dyn FnMut(DiagnosticKind, DiagnosticAction),
    ) -> Option<(Decimal, &'r ParticipantName)> {
        let skip = DiagnosticAction::Skipped;

        if record.participants().is_empty() {
            report(DiagnosticKind::MissingParticipants, skip);
            return None;
        }
        let Some(amount) = record.amount() else {
            report(DiagnosticKind::MissingAmount, skip);
            return None;
        };
        if amount <= Decimal::ZERO {
            report(DiagnosticKind::NonPositiveAmount { amount }, skip);
            return None;
        }
        let Some(payer) = record.payer() else {
            report(DiagnosticKind::MissingPayer, skip);
            return None;
        };
        if !index.contains_key(payer) {
            report(
                DiagnosticKind::UnknownPayer {
                    payer: payer.clone(),
                },
                skip,
            );
            return None;
        }
        Some((amount, payer))
    }

    /// Shares per participant plus the residual per-head amount.
    fn compute_shares(
        &self,
        record: &ExpenseRecord,
        amount: Decimal,
        report: &mut dyn FnMut(DiagnosticKind, DiagnosticAction),
    ) -> Option<(BTreeMap<ParticipantName, Decimal>, Decimal)> {
        let participants = record.participants();

        match record.split_mode() {
            SplitMode::Even => {
                let share = amount / Decimal::from(participants.len());
                let shares = participants.iter().map(|n| (n.clone(), share)).collect();
                Some((shares, share))
            }
            SplitMode::Explicit => {
                let mut specified = BTreeMap::new();
                for (name, share) in record.explicit_shares() {
                    if participants.contains(name) {
                        specified.insert(name.clone(), *share);
                    } else {
                        report(
                            DiagnosticKind::UnlistedExplicitShare { name: name.clone() },
                            DiagnosticAction::Ignored,
                        );
                    }
                }

                let total_specified: Decimal = specified.values().copied().sum();
                let unspecified: Vec<&ParticipantName> = participants
                    .iter()
                    .filter(|n| !specified.contains_key(*n))
                    .collect();

                let over_allocated = total_specified - amount > self.tolerance;
                let mismatched = unspecified.is_empty()
                    && (total_specified - amount).abs() > self.tolerance;
                if over_allocated || mismatched {
                    let kind = DiagnosticKind::ShareMismatch {
                        specified: total_specified,
                        amount,
                    };
                    match self.policy {
                        SharePolicy::Strict => {
                            report(kind, DiagnosticAction::Skipped);
                            return None;
                        }
                        SharePolicy::Permissive => report(kind, DiagnosticAction::Flagged),
                    }
                }

                let residual = if unspecified.is_empty() {
                    Decimal::ZERO
                } else {
                    (amount - total_specified) / Decimal::from(unspecified.len())
                };

                let mut shares = specified;
                for name in unspecified {
                    shares.insert(name.clone(), residual);
                }
                Some((shares, residual))
            }
        }
    }
}

/// Amount plus the magnitude of every explicit share, or `None` on overflow.
fn record_volume(record: &ExpenseRecord, amount: Decimal) -> Option<Decimal> {
    match record.split_mode() {
        SplitMode::Even => Some(amount),
        SplitMode::Explicit => record
            .explicit_shares()
            .values()
            .try_fold(amount, |acc, share| acc.checked_add(share.abs())),
    }
}
