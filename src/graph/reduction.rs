use crate::allocation::engine::DEFAULT_TOLERANCE;
use crate::core::matrix::DebtMatrix;
use log::debug;
use rust_decimal::Decimal;

/// Pre-settlement simplifications of a debt matrix.
///
/// Both transforms return a new matrix and leave net balances unchanged.
#[derive(Debug, Clone, Copy)]
pub struct GraphReducer {
    tolerance: Decimal,
}

impl Default for GraphReducer {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE)
    }
}

impl GraphReducer {
    pub fn new(tolerance: Decimal) -> Self {
        Self { tolerance }
    }

    /// Zero the diagonal.
    pub fn remove_self_loops(&self, matrix: &DebtMatrix) -> DebtMatrix {
        let mut out = matrix.clone();
        for i in 0..out.size() {
            if !out.get(i, i).is_zero() {
                debug!("dropping self-loop of {} on {}", out.get(i, i), out.names()[i]);
                out.set(i, i, Decimal::ZERO);
            }
        }
        out
    }

    /// Offset mutual debts pairwise so at most one direction of each pair
    /// carries an amount.
    ///
    /// When both directions are equal both become zero. Amounts at or below
    /// the tolerance are left untouched. Applying this twice gives the same
    /// result as applying it once.
    ///
    /// # Examples
    ///
    /// ```
    /// use ledger_settle::core::matrix::DebtMatrix;
    /// use ledger_settle::core::participant::ParticipantName;
    /// use ledger_settle::graph::GraphReducer;
    /// use rust_decimal_macros::dec;
    ///
    /// let mut m = DebtMatrix::zeros(vec![ParticipantName::new("A"), ParticipantName::new("B")]);
    /// m.set(0, 1, dec!(100));
    /// m.set(1, 0, dec!(60));
    ///
    /// let reduced = GraphReducer::default().cancel_bidirectional(&m);
    /// assert_eq!(reduced.get(0, 1), dec!(40));
    /// assert_eq!(reduced.get(1, 0), dec!(0));
    /// ```
    pub fn cancel_bidirectional(&self, matrix: &DebtMatrix) -> DebtMatrix {
        let mut out = matrix.clone();
        let n = out.size();

        for i in 0..n {
            for j in (i + 1)..n {
                let forward = out.get(i, j);
                let backward = out.get(j, i);
                if forward <= self.tolerance || backward <= self.tolerance {
                    continue;
                }

                let delta = forward.min(backward);
                if forward > backward {
                    out.set(i, j, forward - delta);
                    out.set(j, i, Decimal::ZERO);
                } else {
                    out.set(j, i, backward - delta);
                    out.set(i, j, Decimal::ZERO);
                }
                debug!(
                    "offset {} between {} and {}",
                    delta,
                    out.names()[i],
                    out.names()[j]
                );
            }
        }
        out
    }
}
