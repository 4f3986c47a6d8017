//! Random expense ledgers.
//!
//! Generates plausible group-expense histories: a payer, a random subset of
//! sharers, and occasionally explicit shares for some of them.

use crate::core::expense::ExpenseRecord;
use crate::core::ledger::{Ledger, LedgerError, LedgerMetadata};
use crate::core::participant::ParticipantName;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

const CATEGORIES: [&str; 5] = ["Food", "Transport", "Entertainment", "Lodging", "Groceries"];

/// Configuration for generating a random ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomLedgerConfig {
    pub participants: usize,
    pub expenses: usize,
    /// Smallest expense amount. Amounts are whole cents.
    pub min_amount: Decimal,
    pub max_amount: Decimal,
    /// Probability in `[0, 1]` that an expense uses explicit shares.
    pub explicit_ratio: f64,
    /// Fixed seed for reproducible output. Entropy-seeded when `None`.
    pub seed: Option<u64>,
}

impl Default for RandomLedgerConfig {
    fn default() -> Self {
        Self {
            participants: 6,
            expenses: 20,
            min_amount: Decimal::from(5),
            max_amount: Decimal::from(500),
            explicit_ratio: 0.25,
            seed: None,
        }
    }
}

fn to_cents(amount: Decimal) -> i64 {
    (amount * Decimal::ONE_HUNDRED).trunc().to_i64().unwrap_or(0)
}

/// Generate a random ledger.
///
/// Fails only when `participants` or `expenses` is zero.
pub fn generate_random_ledger(config: &RandomLedgerConfig) -> Result<Ledger, LedgerError> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let names: Vec<ParticipantName> = (0..config.participants)
        .map(|i| ParticipantName::new(format!("P{:03}", i)))
        .collect();

    let min_cents = to_cents(config.min_amount).max(1);
    let max_cents = to_cents(config.max_amount).max(min_cents);
    let explicit_ratio = config.explicit_ratio.clamp(0.0, 1.0);

    let mut records = Vec::with_capacity(config.expenses);
    if !names.is_empty() {
        for i in 0..config.expenses {
            let cents = rng.gen_range(min_cents..=max_cents);
            let amount = Decimal::new(cents, 2);
            let payer = names[rng.gen_range(0..names.len())].clone();

            let mut sharers: Vec<ParticipantName> = names
                .iter()
                .filter(|_| rng.gen_bool(0.6))
                .cloned()
                .collect();
            if sharers.is_empty() {
                sharers.push(payer.clone());
            }
            let title = format!("Expense {}", i + 1);
            let category = CATEGORIES[rng.gen_range(0..CATEGORIES.len())];

            let record = if rng.gen_bool(explicit_ratio) {
                sharers.shuffle(&mut rng);
                // Specify all but one sharer so a positive residual remains.
                let specified = sharers.len().saturating_sub(1).max(1);
                let mut left = cents;
                let mut shares = Vec::with_capacity(specified);
                for name in sharers.iter().take(specified) {
                    let share = if sharers.len() == 1 {
                        left
                    } else {
                        rng.gen_range(0..=left / sharers.len() as i64)
                    };
                    left -= share;
                    shares.push((name.clone(), Decimal::new(share, 2)));
                }
                ExpenseRecord::explicit(title, amount, payer, sharers, shares)
            } else {
                ExpenseRecord::even(title, amount, payer, sharers)
            };
            records.push(record.with_category(category));
        }
    }

    Ok(Ledger::new(names, records)?.with_metadata(LedgerMetadata {
        split_name: Some(format!("Random ledger ({} participants)", config.participants)),
    }))
}
