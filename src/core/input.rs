//! JSON boundary for ledgers.
//!
//! Accepts the loosely typed ledger documents produced by form front-ends
//! and file exports, and normalizes every field-name variant into
//! [`ExpenseRecord`] before anything reaches the allocation engine.
//!
//! ```json
//! {
//!   "names": ["Alice", "Bob"],
//!   "transactions": [
//!     { "title": "Taxi", "amount": 80.0, "paid_by": "Bob",
//!       "even_split": false, "checked_names": ["Alice", "Bob"],
//!       "detail_map": { "Alice": 50 } }
//!   ],
//!   "metadata": { "split_name": "Weekend Trip" }
//! }
//! ```

use crate::core::expense::{ExpenseRecord, SplitMode};
use crate::core::ledger::{Ledger, LedgerError, LedgerMetadata};
use crate::core::participant::ParticipantName;
use log::warn;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read ledger: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid ledger JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// One expense as it appears in a ledger document.
///
/// Several spellings are accepted for the same field. When both are
/// present the first listed wins: `total_amount` over `amount`,
/// `detail_map` over `uneven_split_map`, `even_split` over `toggle`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    /// Outer `None`: field absent. `Some(None)`: field present but null,
    /// which hides any `amount`.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_amount: Option<Option<Decimal>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub even_split: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toggle: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked_names: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail_map: Option<BTreeMap<String, Decimal>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uneven_split_map: Option<BTreeMap<String, Decimal>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl ExpenseInput {
    /// Collapse the field variants into a canonical record. Never fails;
    /// missing fields are left for the allocation engine to report.
    pub fn into_record(self) -> ExpenseRecord {
        let even = self.even_split.or(self.toggle).unwrap_or(true);
        let split_mode = if even {
            SplitMode::Even
        } else {
            SplitMode::Explicit
        };
        let shares = self
            .detail_map
            .or(self.uneven_split_map)
            .unwrap_or_default()
            .into_iter()
            .map(|(name, share)| (ParticipantName::from(name), share))
            .collect();

        let record = ExpenseRecord::new(
            self.title.unwrap_or_default(),
            self.total_amount.unwrap_or(self.amount),
            self.paid_by.map(ParticipantName::from),
            self.checked_names
                .unwrap_or_default()
                .into_iter()
                .map(ParticipantName::from),
            split_mode,
            shares,
        );
        match self.category {
            Some(category) => record.with_category(category),
            None => record,
        }
    }

    fn from_record(record: &ExpenseRecord) -> Self {
        let explicit = record.split_mode() == SplitMode::Explicit;
        Self {
            title: Some(record.title().to_string()),
            amount: record.amount(),
            paid_by: record.payer().map(|p| p.to_string()),
            even_split: Some(!explicit),
            checked_names: Some(record.participants().iter().map(|p| p.to_string()).collect()),
            detail_map: explicit.then(|| {
                record
                    .explicit_shares()
                    .iter()
                    .map(|(name, share)| (name.to_string(), *share))
                    .collect()
            }),
            category: record.category().map(str::to_string),
            ..Default::default()
        }
    }
}

/// Marks a field as present, keeping an explicit `null` distinct from absence.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// A whole ledger document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerInput {
    /// Informational only; `names` is authoritative.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_count: Option<usize>,
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub transactions: Vec<ExpenseInput>,
    #[serde(default)]
    pub metadata: LedgerMetadata,
}

impl LedgerInput {
    /// Validate and convert into a [`Ledger`].
    pub fn into_ledger(self) -> Result<Ledger, LedgerError> {
        if let Some(count) = self.name_count {
            if count != self.names.len() {
                warn!(
                    "name_count is {} but {} names were given; using the names",
                    count,
                    self.names.len()
                );
            }
        }

        let records = self
            .transactions
            .into_iter()
            .map(ExpenseInput::into_record)
            .collect();
        Ok(Ledger::new(self.names, records)?.with_metadata(self.metadata))
    }

    /// The document form of an existing ledger.
    pub fn from_ledger(ledger: &Ledger) -> Self {
        Self {
            name_count: Some(ledger.participant_count()),
            names: ledger.participants().iter().map(|p| p.to_string()).collect(),
            transactions: ledger.records().iter().map(ExpenseInput::from_record).collect(),
            metadata: ledger.metadata().clone(),
        }
    }
}

/// Parse a ledger document from a JSON string.
pub fn parse_ledger(json: &str) -> Result<Ledger, InputError> {
    let input: LedgerInput = serde_json::from_str(json)?;
    Ok(input.into_ledger()?)
}

/// Read and parse a ledger document from disk.
pub fn load_ledger(path: impl AsRef<Path>) -> Result<Ledger, InputError> {
    let content = fs::read_to_string(path)?;
    parse_ledger(&content)
}

/// Serialize a ledger as a pretty-printed document that [`parse_ledger`] accepts.
pub fn to_json(ledger: &Ledger) -> Result<String, InputError> {
    Ok(serde_json::to_string_pretty(&LedgerInput::from_ledger(ledger))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_field_variants_normalized() {
        let json = r#"{
            "names": ["Alice", "Bob"],
            "transactions": [
                { "title": "Taxi", "total_amount": 80, "amount": 1, "paid_by": "Bob",
                  "toggle": false, "checked_names": ["Alice", "Bob"],
                  "uneven_split_map": { "Alice": 50 } }
            ]
        }"#;
        let ledger = parse_ledger(json).unwrap();
        let record = &ledger.records()[0];

        assert_eq!(record.amount(), Some(dec!(80)));
        assert_eq!(record.split_mode(), SplitMode::Explicit);
        assert_eq!(
            record.explicit_shares().get(&ParticipantName::new("Alice")),
            Some(&dec!(50))
        );
    }

    #[test]
    fn test_even_split_defaults_true() {
        let json = r#"{
            "names": ["Alice", "Bob"],
            "transactions": [
                { "title": "Lunch", "amount": "30.50", "paid_by": "Alice",
                  "checked_names": ["Alice", "Bob"] }
            ]
        }"#;
        let ledger = parse_ledger(json).unwrap();
        assert_eq!(ledger.records()[0].split_mode(), SplitMode::Even);
        assert_eq!(ledger.records()[0].amount(), Some(dec!(30.50)));
    }

    #[test]
    fn test_null_fields_survive_to_engine() {
        let json = r#"{
            "names": ["Alice"],
            "transactions": [ { "title": "Mystery", "amount": null, "checked_names": null } ]
        }"#;
        let ledger = parse_ledger(json).unwrap();
        let record = &ledger.records()[0];
        assert_eq!(record.amount(), None);
        assert!(record.payer().is_none());
        assert!(record.participants().is_empty());
    }

    #[test]
    fn test_null_total_amount_hides_amount() {
        let json = r#"{
            "names": ["Alice", "Bob"],
            "transactions": [
                { "title": "Void", "total_amount": null, "amount": 25, "paid_by": "Alice",
                  "checked_names": ["Alice", "Bob"] },
                { "title": "Refill", "amount": 25, "paid_by": "Alice",
                  "checked_names": ["Alice", "Bob"] }
            ]
        }"#;
        let ledger = parse_ledger(json).unwrap();
        assert_eq!(ledger.records()[0].amount(), None);
        assert_eq!(ledger.records()[1].amount(), Some(dec!(25)));
    }

    #[test]
    fn test_structural_errors() {
        assert!(matches!(
            parse_ledger(r#"{ "names": [], "transactions": [] }"#),
            Err(InputError::Ledger(LedgerError::NoParticipants))
        ));
        assert!(matches!(
            parse_ledger(r#"{ "names": ["Alice"] }"#),
            Err(InputError::Ledger(LedgerError::NoRecords))
        ));
        assert!(matches!(parse_ledger("not json"), Err(InputError::Json(_))));
    }

    #[test]
    fn test_document_round_trip() {
        let ledger = Ledger::new(
            ["Alice", "Bob", "Charlie"],
            vec![
                ExpenseRecord::even("Dinner", dec!(120), "Alice", ["Alice", "Bob", "Charlie"])
                    .with_category("Food"),
                ExpenseRecord::explicit(
                    "Snacks",
                    dec!(60),
                    "Bob",
                    ["Bob", "Charlie"],
                    [("Charlie", dec!(45))],
                ),
            ],
        )
        .unwrap();

        let json = to_json(&ledger).unwrap();
        assert_eq!(parse_ledger(&json).unwrap(), ledger);
    }
}
