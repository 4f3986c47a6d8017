use crate::allocation::engine::Allocation;
use crate::core::matrix::DebtMatrix;
use crate::core::participant::ParticipantName;
use log::debug;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

/// Aggregates per-record shares into a [`DebtMatrix`].
///
/// Every share is recorded as a debt from the sharing participant (row)
/// to the payer (column). A payer's own share is never recorded, so the
/// diagonal stays zero.
///
/// # Examples
///
/// ```
/// use ledger_settle::graph::DebtMatrixBuilder;
/// use ledger_settle::core::participant::ParticipantName;
/// use rust_decimal_macros::dec;
/// use std::collections::BTreeMap;
///
/// let names: Vec<ParticipantName> = ["Alice", "Bob"].into_iter().map(Into::into).collect();
/// let shares = BTreeMap::from([
///     (ParticipantName::new("Alice"), dec!(15)),
///     (ParticipantName::new("Bob"), dec!(15)),
/// ]);
///
/// let mut builder = DebtMatrixBuilder::new(names);
/// builder.add_shares(&ParticipantName::new("Bob"), &shares);
/// let matrix = builder.build();
///
/// assert_eq!(matrix.get(0, 1), dec!(15));
/// assert!(matrix.diagonal_is_zero());
/// ```
#[derive(Debug, Clone)]
pub struct DebtMatrixBuilder {
    index: HashMap<ParticipantName, usize>,
    matrix: DebtMatrix,
}

impl DebtMatrixBuilder {
    pub fn new(names: Vec<ParticipantName>) -> Self {
        let index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self {
            index,
            matrix: DebtMatrix::zeros(names),
        }
    }

    /// Record one expense: everyone in `shares` except `payer` owes `payer`
    /// their share. Unknown payers drop the whole record, unknown sharers
    /// drop only their own share.
    pub fn add_shares(&mut self, payer: &ParticipantName, shares: &BTreeMap<ParticipantName, Decimal>) {
        let Some(&creditor) = self.index.get(payer) else {
            debug!("payer '{}' has no matrix column, dropping record", payer);
            return;
        };
        for (name, share) in shares {
            if name == payer {
                continue;
            }
            match self.index.get(name) {
                Some(&debtor) => self.matrix.add(debtor, creditor, *share),
                None => debug!("'{}' has no matrix row, dropping share of {}", name, share),
            }
        }
    }

    /// Build the matrix for every allocated (non-skipped) record.
    pub fn from_allocation(allocation: &Allocation, names: &[ParticipantName]) -> DebtMatrix {
        let mut builder = Self::new(names.to_vec());
        for record in allocation.records() {
            if let (false, Some(payer)) = (record.is_skipped(), &record.payer) {
                builder.add_shares(payer, &record.computed_shares);
            }
        }
        builder.build()
    }

    pub fn build(self) -> DebtMatrix {
        self.matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::diagnostics::NullSink;
    use crate::allocation::engine::AllocationEngine;
    use crate::core::expense::ExpenseRecord;
    use rust_decimal_macros::dec;

    fn names(list: &[&str]) -> Vec<ParticipantName> {
        list.iter().map(|n| ParticipantName::new(*n)).collect()
    }

    #[test]
    fn test_even_split_matrix() {
        let people = names(&["Alice", "Bob", "Charlie"]);
        let records = vec![ExpenseRecord::even(
            "Dinner",
            dec!(120),
            "Alice",
            ["Alice", "Bob", "Charlie"],
        )];
        let allocation = AllocationEngine::default().allocate(&records, &people, &mut NullSink);
        let matrix = DebtMatrixBuilder::from_allocation(&allocation, &people);

        assert_eq!(matrix.get(1, 0), dec!(40));
        assert_eq!(matrix.get(2, 0), dec!(40));
        assert_eq!(matrix.get(0, 0), Decimal::ZERO);
        assert_eq!(matrix.net_balances(), vec![dec!(80), dec!(-40), dec!(-40)]);
    }

    #[test]
    fn test_shares_accumulate() {
        let mut builder = DebtMatrixBuilder::new(names(&["A", "B"]));
        let shares: BTreeMap<ParticipantName, Decimal> =
            [(ParticipantName::new("A"), dec!(10))].into_iter().collect();
        builder.add_shares(&ParticipantName::new("B"), &shares);
        builder.add_shares(&ParticipantName::new("B"), &shares);
        assert_eq!(builder.build().get(0, 1), dec!(20));
    }

    #[test]
    fn test_unknown_names_dropped() {
        let mut builder = DebtMatrixBuilder::new(names(&["A", "B"]));
        let shares: BTreeMap<ParticipantName, Decimal> = [
            (ParticipantName::new("A"), dec!(10)),
            (ParticipantName::new("Z"), dec!(10)),
        ]
        .into_iter()
        .collect();
        builder.add_shares(&ParticipantName::new("Q"), &shares);
        builder.add_shares(&ParticipantName::new("B"), &shares);

        let matrix = builder.build();
        assert_eq!(matrix.gross_total(), dec!(10));
        assert_eq!(matrix.get(0, 1), dec!(10));
    }
}
