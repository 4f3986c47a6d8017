use crate::allocation::engine::DEFAULT_TOLERANCE;
use crate::core::matrix::DebtMatrix;
use crate::core::participant::ParticipantName;
use crate::settlement::{unsettled, SettlementStrategy};
use log::debug;
use rust_decimal::Decimal;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Remaining balance of one side of the match, ordered so the heap yields
/// the largest amount first and, among equal amounts, the lowest index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Open {
    amount: Decimal,
    index: usize,
}

impl Ord for Open {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.amount, Reverse(self.index)).cmp(&(other.amount, Reverse(other.index)))
    }
}

impl PartialOrd for Open {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Repeatedly settles the largest debtor against the largest creditor.
///
/// Produces at most `n - 1` transfers. The count is not guaranteed to be
/// the global minimum.
#[derive(Debug, Clone, Copy)]
pub struct GreedySettlement {
    tolerance: Decimal,
}

impl Default for GreedySettlement {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE)
    }
}

impl GreedySettlement {
    pub fn new(tolerance: Decimal) -> Self {
        Self { tolerance }
    }
}

impl SettlementStrategy for GreedySettlement {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn settle(&self, net: &[Decimal], names: &[ParticipantName]) -> DebtMatrix {
        let mut out = DebtMatrix::zeros(names.to_vec());
        let open = unsettled(net, self.tolerance);
        if open.len() <= 1 {
            return out;
        }

        let mut creditors = BinaryHeap::new();
        let mut debtors = BinaryHeap::new();
        for index in open {
            let amount = net[index];
            if amount > Decimal::ZERO {
                creditors.push(Open { amount, index });
            } else {
                debtors.push(Open {
                    amount: -amount,
                    index,
                });
            }
        }

        while let (Some(creditor), Some(debtor)) = (creditors.peek().copied(), debtors.peek().copied()) {
            creditors.pop();
            debtors.pop();

            let transfer = creditor.amount.min(debtor.amount);
            out.add(debtor.index, creditor.index, transfer);
            debug!(
                "{} pays {} {}",
                names[debtor.index], names[creditor.index], transfer
            );

            let creditor_left = creditor.amount - transfer;
            if creditor_left > self.tolerance {
                creditors.push(Open {
                    amount: creditor_left,
                    ..creditor
                });
            }
            let debtor_left = debtor.amount - transfer;
            if debtor_left > self.tolerance {
                debtors.push(Open {
                    amount: debtor_left,
                    ..debtor
                });
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn names(n: usize) -> Vec<ParticipantName> {
        (0..n).map(|i| ParticipantName::new(format!("P{}", i))).collect()
    }

    #[test]
    fn test_one_creditor_two_debtors() {
        let net = vec![dec!(80), dec!(-40), dec!(-40)];
        let out = GreedySettlement::default().settle(&net, &names(3));

        assert_eq!(out.get(1, 0), dec!(40));
        assert_eq!(out.get(2, 0), dec!(40));
        assert_eq!(out.edge_count(Decimal::ZERO), 2);
        assert_eq!(out.net_balances(), net);
    }

    #[test]
    fn test_largest_matched_first() {
        // P3 owes 70, P0 is owed 60: they are matched first.
        let net = vec![dec!(60), dec!(40), dec!(-30), dec!(-70)];
        let out = GreedySettlement::default().settle(&net, &names(4));

        assert_eq!(out.get(3, 0), dec!(60));
        assert_eq!(out.get(3, 1), dec!(10));
        assert_eq!(out.get(2, 1), dec!(30));
        assert_eq!(out.net_balances(), net);
    }

    #[test]
    fn test_ties_prefer_lower_index() {
        let net = vec![dec!(50), dec!(50), dec!(-50), dec!(-50)];
        let out = GreedySettlement::default().settle(&net, &names(4));

        assert_eq!(out.get(2, 0), dec!(50));
        assert_eq!(out.get(3, 1), dec!(50));
        assert_eq!(out.edge_count(Decimal::ZERO), 2);
    }

    #[test]
    fn test_heap_reorders_after_partial_match() {
        // Once P3 settles 110 with P0, P1 (90) must outrank P0's remaining 10.
        let net = vec![dec!(120), dec!(90), dec!(-100), dec!(-110)];
        let out = GreedySettlement::default().settle(&net, &names(4));

        assert_eq!(out.get(3, 0), dec!(110));
        assert_eq!(out.get(2, 1), dec!(90));
        assert_eq!(out.get(2, 0), dec!(10));
        assert_eq!(out.net_balances(), net);
    }

    #[test]
    fn test_all_settled_is_noop() {
        let net = vec![Decimal::ZERO; 3];
        let out = GreedySettlement::default().settle(&net, &names(3));
        assert_eq!(out.gross_total(), Decimal::ZERO);
    }
}
