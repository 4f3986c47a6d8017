use crate::core::expense::ExpenseRecord;
use crate::core::participant::ParticipantName;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Structural problems that abort a settlement run.
///
/// Problems with individual expense records are not errors; the
/// allocation engine skips those records and reports a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("ledger must have at least one participant")]
    NoParticipants,
    #[error("ledger must have at least one expense record")]
    NoRecords,
    #[error("participant names must not be empty")]
    EmptyParticipantName,
    #[error("participant '{0}' is listed more than once")]
    DuplicateParticipant(ParticipantName),
}

/// Upper bound on the combined magnitude of a ledger's amounts.
///
/// Each record contributes its amount plus the absolute value of its
/// explicit shares. Keeping the running total at or below 10^27 leaves
/// every derived sum (shares, totals, matrix rows, net balances) well
/// inside `Decimal`'s range, so no later stage can overflow.
pub const MAX_LEDGER_VOLUME: Decimal =
    Decimal::from_parts(3_892_314_112, 2_681_241_660, 54_210_108, false, 0);

/// Display-only information attached to a ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerMetadata {
    pub split_name: Option<String>,
}

/// The participants and expense records of one settlement run.
///
/// The participant order is significant: it fixes the row and column
/// order of every debt matrix derived from this ledger.
///
/// # Examples
///
/// ```
/// use ledger_settle::prelude::*;
/// use rust_decimal_macros::dec;
///
/// let ledger = Ledger::new(
///     ["Alice", "Bob"],
///     vec![ExpenseRecord::even("Taxi", dec!(30), "Bob", ["Alice", "Bob"])],
/// )
/// .unwrap();
///
/// assert_eq!(ledger.participant_count(), 2);
/// assert_eq!(ledger.index_of(&ParticipantName::new("Bob")), Some(1));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LedgerParts")]
pub struct Ledger {
    participants: Vec<ParticipantName>,
    records: Vec<ExpenseRecord>,
    metadata: LedgerMetadata,
}

/// Serialized form of a [`Ledger`], checked by [`Ledger::new`] on the way in.
#[derive(Deserialize)]
struct LedgerParts {
    participants: Vec<ParticipantName>,
    records: Vec<ExpenseRecord>,
    #[serde(default)]
    metadata: LedgerMetadata,
}

impl TryFrom<LedgerParts> for Ledger {
    type Error = LedgerError;

    fn try_from(parts: LedgerParts) -> Result<Self, Self::Error> {
        Ok(Ledger::new(parts.participants, parts.records)?.with_metadata(parts.metadata))
    }
}

impl Ledger {
    /// Build a ledger, rejecting an empty participant list, an empty record
    /// list, blank names and duplicate names.
    pub fn new<I>(participants: I, records: Vec<ExpenseRecord>) -> Result<Self, LedgerError>
    where
        I: IntoIterator,
        I::Item: Into<ParticipantName>,
    {
        let participants: Vec<ParticipantName> =
            participants.into_iter().map(Into::into).collect();

        if participants.is_empty() {
            return Err(LedgerError::NoParticipants);
        }

        let mut seen = HashSet::new();
        for name in &participants {
            if name.is_empty() {
                return Err(LedgerError::EmptyParticipantName);
            }
            if !seen.insert(name) {
                return Err(LedgerError::DuplicateParticipant(name.clone()));
            }
        }

        if records.is_empty() {
            return Err(LedgerError::NoRecords);
        }

        Ok(Self {
            participants,
            records,
            metadata: LedgerMetadata::default(),
        })
    }

    pub fn with_metadata(mut self, metadata: LedgerMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn participants(&self) -> &[ParticipantName] {
        &self.participants
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn records(&self) -> &[ExpenseRecord] {
        &self.records
    }

    pub fn metadata(&self) -> &LedgerMetadata {
        &self.metadata
    }

    pub fn contains(&self, name: &ParticipantName) -> bool {
        self.participants.contains(name)
    }

    /// Row/column position of a participant.
    pub fn index_of(&self, name: &ParticipantName) -> Option<usize> {
        self.participants.iter().position(|p| p == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn dinner() -> ExpenseRecord {
        ExpenseRecord::even("Dinner", dec!(120), "Alice", ["Alice", "Bob", "Charlie"])
    }

    #[test]
    fn test_ledger_basic() {
        let ledger = Ledger::new(["Alice", "Bob", "Charlie"], vec![dinner()]).unwrap();
        assert_eq!(ledger.participant_count(), 3);
        assert_eq!(ledger.records().len(), 1);
        assert!(ledger.contains(&ParticipantName::new("Charlie")));
        assert_eq!(ledger.index_of(&ParticipantName::new("Dave")), None);
    }

    #[test]
    fn test_ledger_requires_participants() {
        let names: Vec<&str> = Vec::new();
        assert_eq!(
            Ledger::new(names, vec![dinner()]),
            Err(LedgerError::NoParticipants)
        );
    }

    #[test]
    fn test_ledger_requires_records() {
        assert_eq!(
            Ledger::new(["Alice"], Vec::new()),
            Err(LedgerError::NoRecords)
        );
    }

    #[test]
    fn test_ledger_rejects_duplicates() {
        let err = Ledger::new(["Alice", "Bob", "Alice"], vec![dinner()]).unwrap_err();
        assert_eq!(
            err,
            LedgerError::DuplicateParticipant(ParticipantName::new("Alice"))
        );
    }

    #[test]
    fn test_ledger_rejects_blank_name() {
        assert_eq!(
            Ledger::new(["Alice", ""], vec![dinner()]),
            Err(LedgerError::EmptyParticipantName)
        );
    }

    #[test]
    fn test_deserialize_validates() {
        let empty = r#"{"participants":[],"records":[],"metadata":{}}"#;
        let err = serde_json::from_str::<Ledger>(empty).unwrap_err();
        assert!(err.to_string().contains("at least one participant"));

        let ledger = Ledger::new(["Alice", "Bob", "Charlie"], vec![dinner()]).unwrap();
        let mut value = serde_json::to_value(&ledger).unwrap();
        value["participants"] = serde_json::json!(["Alice", "Alice"]);
        let err = serde_json::from_value::<Ledger>(value).unwrap_err();
        assert!(err.to_string().contains("listed more than once"));
    }

    #[test]
    fn test_serialized_ledger_reloads() {
        let ledger = Ledger::new(["Alice", "Bob", "Charlie"], vec![dinner()])
            .unwrap()
            .with_metadata(LedgerMetadata {
                split_name: Some("Dinner club".to_string()),
            });
        let json = serde_json::to_string(&ledger).unwrap();
        assert_eq!(serde_json::from_str::<Ledger>(&json).unwrap(), ledger);
    }

    #[test]
    fn test_volume_ceiling_is_ten_to_the_27() {
        assert_eq!(MAX_LEDGER_VOLUME, Decimal::from_i128_with_scale(10i128.pow(27), 0));
    }

    #[test]
    fn test_ledger_metadata() {
        let ledger = Ledger::new(["Alice", "Bob", "Charlie"], vec![dinner()])
            .unwrap()
            .with_metadata(LedgerMetadata {
                split_name: Some("Weekend Trip".to_string()),
            });
        assert_eq!(ledger.metadata().split_name.as_deref(), Some("Weekend Trip"));
    }
}
