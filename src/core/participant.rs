use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique name of a participant sharing expenses in a ledger.
///
/// Names are the only identity a participant has; two records naming
/// the same string refer to the same person.
///
/// # Examples
///
/// ```
/// use ledger_settle::core::participant::ParticipantName;
///
/// let alice = ParticipantName::new("Alice");
/// let bob = ParticipantName::new("Bob");
/// assert_ne!(alice, bob);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantName(String);

impl ParticipantName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ParticipantName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ParticipantName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ParticipantName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// One line of a participant's share history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareEntry {
    /// Position of the expense record in the ledger.
    pub record_index: usize,
    pub title: String,
    /// Full amount of the expense.
    pub total_amount: Decimal,
    /// This participant's portion of it.
    pub share: Decimal,
    pub paid_by: ParticipantName,
}

/// Allocation totals for one participant.
///
/// `net_balance` is positive when the participant is owed money overall
/// and negative when they owe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub name: ParticipantName,
    pub total_paid: Decimal,
    pub total_owed: Decimal,
    pub net_balance: Decimal,
    pub entries: Vec<ShareEntry>,
}

impl Participant {
    pub fn new(name: ParticipantName) -> Self {
        Self {
            name,
            total_paid: Decimal::ZERO,
            total_owed: Decimal::ZERO,
            net_balance: Decimal::ZERO,
            entries: Vec::new(),
        }
    }

    pub fn record_payment(&mut self, amount: Decimal) {
        self.total_paid += amount;
    }

    pub fn record_share(&mut self, entry: ShareEntry) {
        self.total_owed += entry.share;
        self.entries.push(entry);
    }

    /// Recompute `net_balance` from the running totals.
    pub fn settle_balance(&mut self) {
        self.net_balance = self.total_paid - self.total_owed;
    }

    pub fn is_creditor(&self) -> bool {
        self.net_balance > Decimal::ZERO
    }

    pub fn is_debtor(&self) -> bool {
        self.net_balance < Decimal::ZERO
    }
}
