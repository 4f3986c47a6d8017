use crate::core::participant::ParticipantName;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What was wrong with an expense record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// The record names nobody to share it.
    MissingParticipants,
    MissingAmount,
    /// The amount is zero or negative.
    NonPositiveAmount { amount: Decimal },
    MissingPayer,
    /// The payer is not one of the ledger's participants.
    UnknownPayer { payer: ParticipantName },
    /// A sharing participant is not in the ledger; their share is not accumulated.
    UnknownParticipant { name: ParticipantName },
    /// An explicit share names someone outside the record's participant set.
    UnlistedExplicitShare { name: ParticipantName },
    /// Explicit shares do not add up to the record amount.
    ShareMismatch { specified: Decimal, amount: Decimal },
    /// The record would push the ledger past `MAX_LEDGER_VOLUME`.
    AmountOverflow { amount: Decimal },
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::MissingParticipants => write!(f, "no participants"),
            DiagnosticKind::MissingAmount => write!(f, "missing amount"),
            DiagnosticKind::NonPositiveAmount { amount } => {
                write!(f, "amount {} is not positive", amount)
            }
            DiagnosticKind::MissingPayer => write!(f, "missing payer"),
            DiagnosticKind::UnknownPayer { payer } => {
                write!(f, "payer '{}' not in participants", payer)
            }
            DiagnosticKind::UnknownParticipant { name } => {
                write!(f, "participant '{}' not in ledger", name)
            }
            DiagnosticKind::UnlistedExplicitShare { name } => {
                write!(f, "explicit share for '{}' who is not sharing this expense", name)
            }
            DiagnosticKind::ShareMismatch { specified, amount } => {
                write!(f, "explicit shares total {} but amount is {}", specified, amount)
            }
            DiagnosticKind::AmountOverflow { amount } => {
                write!(f, "amount {} exceeds the remaining ledger volume", amount)
            }
        }
    }
}

/// What the engine did about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticAction {
    /// The whole record contributed nothing.
    Skipped,
    /// One name was left out of accumulation; the record was still allocated.
    Ignored,
    /// The record was allocated as given but looks inconsistent.
    Flagged,
}

/// A recoverable problem found while allocating one expense record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub record_index: usize,
    pub title: String,
    #[serde(flatten)]
    pub kind: DiagnosticKind,
    pub action: DiagnosticAction,
}

impl Diagnostic {
    pub fn is_skip(&self) -> bool {
        self.action == DiagnosticAction::Skipped
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = match self.action {
            DiagnosticAction::Skipped => "skipped",
            DiagnosticAction::Ignored => "ignored name in",
            DiagnosticAction::Flagged => "flagged",
        };
        write!(
            f,
            "{} record #{} '{}': {}",
            action, self.record_index, self.title, self.kind
        )
    }
}

/// Receives diagnostics as the allocation engine produces them.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Discards everything. Useful when only the log output matters.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&mut self, _diagnostic: Diagnostic) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_sink_collects() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        sink.report(Diagnostic {
            record_index: 2,
            title: "Taxi".to_string(),
            kind: DiagnosticKind::MissingPayer,
            action: DiagnosticAction::Skipped,
        });
        assert_eq!(sink.len(), 1);
        assert!(sink[0].is_skip());
        assert_eq!(sink[0].to_string(), "skipped record #2 'Taxi': missing payer");
    }

    #[test]
    fn test_diagnostic_serializes_flat() {
        let d = Diagnostic {
            record_index: 0,
            title: "Dinner".to_string(),
            kind: DiagnosticKind::UnknownPayer {
                payer: ParticipantName::new("Mallory"),
            },
            action: DiagnosticAction::Skipped,
        };
        let value = serde_json::to_value(&d).unwrap();
        assert_eq!(value["kind"], "unknown_payer");
        assert_eq!(value["payer"], "Mallory");
        assert_eq!(value["action"], "skipped");
    }
}
