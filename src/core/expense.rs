use crate::core::participant::ParticipantName;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// How an expense is divided among the participants sharing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitMode {
    /// Every participant carries `amount / n`.
    #[default]
    Even,
    /// Some participants carry a stated amount; the rest split the remainder.
    Explicit,
}

impl fmt::Display for SplitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitMode::Even => write!(f, "even"),
            SplitMode::Explicit => write!(f, "explicit"),
        }
    }
}

/// A single shared expense as submitted to the allocation engine.
///
/// `amount` and `payer` are optional because records arrive from loosely
/// validated input; the allocation engine skips records missing either.
/// Records are never rejected at construction time.
///
/// # Examples
///
/// ```
/// use ledger_settle::core::expense::{ExpenseRecord, SplitMode};
/// use rust_decimal_macros::dec;
///
/// let dinner = ExpenseRecord::even("Dinner", dec!(120), "Alice", ["Alice", "Bob", "Charlie"]);
///
/// assert_eq!(dinner.amount(), Some(dec!(120)));
/// assert_eq!(dinner.split_mode(), SplitMode::Even);
/// assert_eq!(dinner.participants().len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    title: String,
    amount: Option<Decimal>,
    payer: Option<ParticipantName>,
    participants: BTreeSet<ParticipantName>,
    split_mode: SplitMode,
    /// Stated shares, only consulted in `Explicit` mode. May name a subset
    /// of `participants`.
    explicit_shares: BTreeMap<ParticipantName, Decimal>,
    category: Option<String>,
}

impl ExpenseRecord {
    /// Create a record with every field given explicitly.
    pub fn new(
        title: impl Into<String>,
        amount: Option<Decimal>,
        payer: Option<ParticipantName>,
        participants: impl IntoIterator<Item = ParticipantName>,
        split_mode: SplitMode,
        explicit_shares: BTreeMap<ParticipantName, Decimal>,
    ) -> Self {
        Self {
            title: title.into(),
            amount,
            payer,
            participants: participants.into_iter().collect(),
            split_mode,
            explicit_shares,
            category: None,
        }
    }

    /// An evenly split expense.
    pub fn even<N, I>(title: impl Into<String>, amount: Decimal, payer: N, participants: I) -> Self
    where
        N: Into<ParticipantName>,
        I: IntoIterator,
        I::Item: Into<ParticipantName>,
    {
        Self::new(
            title,
            Some(amount),
            Some(payer.into()),
            participants.into_iter().map(Into::into),
            SplitMode::Even,
            BTreeMap::new(),
        )
    }

    /// An expense with stated shares for some participants.
    pub fn explicit<N, I, S, K>(
        title: impl Into<String>,
        amount: Decimal,
        payer: N,
        participants: I,
        shares: S,
    ) -> Self
    where
        N: Into<ParticipantName>,
        I: IntoIterator,
        I::Item: Into<ParticipantName>,
        S: IntoIterator<Item = (K, Decimal)>,
        K: Into<ParticipantName>,
    {
        Self::new(
            title,
            Some(amount),
            Some(payer.into()),
            participants.into_iter().map(Into::into),
            SplitMode::Explicit,
            shares
                .into_iter()
                .map(|(name, amount)| (name.into(), amount))
                .collect(),
        )
    }

    /// Set a free-form category ("Food", "Transport", ...).
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    // --- Accessors ---

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn amount(&self) -> Option<Decimal> {
        self.amount
    }

    pub fn payer(&self) -> Option<&ParticipantName> {
        self.payer.as_ref()
    }

    pub fn participants(&self) -> &BTreeSet<ParticipantName> {
        &self.participants
    }

    pub fn split_mode(&self) -> SplitMode {
        self.split_mode
    }

    pub fn explicit_shares(&self) -> &BTreeMap<ParticipantName, Decimal> {
        &self.explicit_shares
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }
}
