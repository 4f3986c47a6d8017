use crate::core::ledger::MAX_LEDGER_VOLUME;
use crate::core::participant::ParticipantName;
use petgraph::graph::DiGraph;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Why a set of rows cannot form a [`DebtMatrix`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatrixError {
    #[error("expected {expected} rows, got {actual}")]
    RowCount { expected: usize, actual: usize },
    #[error("row {row} has {actual} cells, expected {expected}")]
    RowLength {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("total debt exceeds {}", MAX_LEDGER_VOLUME)]
    VolumeExceeded,
}

/// A recommended or recorded payment between two participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: ParticipantName,
    pub to: ParticipantName,
    pub amount: Decimal,
}

impl fmt::Display for Transfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} pays {} {}", self.from, self.to, self.amount.round_dp(2))
    }
}

/// Square matrix of pairwise debts over an ordered participant list.
///
/// `rows[i][j]` is the amount participant `i` owes participant `j`
/// (debtor row, creditor column). Every reduction stage produces a new
/// matrix; none of them mutate their input.
///
/// # Examples
///
/// ```
/// use ledger_settle::core::matrix::DebtMatrix;
/// use ledger_settle::core::participant::ParticipantName;
/// use rust_decimal_macros::dec;
///
/// let names = vec![ParticipantName::new("A"), ParticipantName::new("B")];
/// let mut m = DebtMatrix::zeros(names);
/// m.add(1, 0, dec!(40));
///
/// assert_eq!(m.net_balances(), vec![dec!(40), dec!(-40)]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MatrixParts")]
pub struct DebtMatrix {
    names: Vec<ParticipantName>,
    rows: Vec<Vec<Decimal>>,
}

#[derive(Deserialize)]
struct MatrixParts {
    names: Vec<ParticipantName>,
    rows: Vec<Vec<Decimal>>,
}

impl TryFrom<MatrixParts> for DebtMatrix {
    type Error = MatrixError;

    fn try_from(parts: MatrixParts) -> Result<Self, Self::Error> {
        DebtMatrix::from_rows(parts.names, parts.rows)
    }
}

impl DebtMatrix {
    /// An all-zero matrix over `names`.
    pub fn zeros(names: Vec<ParticipantName>) -> Self {
        let n = names.len();
        Self {
            names,
            rows: vec![vec![Decimal::ZERO; n]; n],
        }
    }

    /// Build a matrix from explicit rows.
    ///
    /// `rows` must be `names.len()` × `names.len()`, and the absolute values
    /// of all cells together must not exceed [`MAX_LEDGER_VOLUME`].
    pub fn from_rows(
        names: Vec<ParticipantName>,
        rows: Vec<Vec<Decimal>>,
    ) -> Result<Self, MatrixError> {
        let n = names.len();
        if rows.len() != n {
            return Err(MatrixError::RowCount {
                expected: n,
                actual: rows.len(),
            });
        }
        if let Some((row, cells)) = rows.iter().enumerate().find(|(_, r)| r.len() != n) {
            return Err(MatrixError::RowLength {
                row,
                expected: n,
                actual: cells.len(),
            });
        }

        let volume = rows
            .iter()
            .flatten()
            .try_fold(Decimal::ZERO, |acc, cell| acc.checked_add(cell.abs()));
        match volume {
            Some(total) if total <= MAX_LEDGER_VOLUME => Ok(Self { names, rows }),
            _ => Err(MatrixError::VolumeExceeded),
        }
    }

    pub fn names(&self) -> &[ParticipantName] {
        &self.names
    }

    /// Number of participants (rows and columns).
    pub fn size(&self) -> usize {
        self.names.len()
    }

    pub fn rows(&self) -> &[Vec<Decimal>] {
        &self.rows
    }

    pub fn get(&self, debtor: usize, creditor: usize) -> Decimal {
        self.rows[debtor][creditor]
    }

    pub fn set(&mut self, debtor: usize, creditor: usize, amount: Decimal) {
        self.rows[debtor][creditor] = amount;
    }

    /// Adds to a cell. Amounts from an allocated ledger stay within
    /// [`MAX_LEDGER_VOLUME`], so accumulation cannot overflow.
    pub fn add(&mut self, debtor: usize, creditor: usize, amount: Decimal) {
        self.rows[debtor][creditor] += amount;
    }

    /// Total owed *by* participant `i`.
    pub fn row_sum(&self, i: usize) -> Decimal {
        self.rows[i].iter().copied().sum()
    }

    /// Total owed *to* participant `j`.
    pub fn column_sum(&self, j: usize) -> Decimal {
        self.rows.iter().map(|row| row[j]).sum()
    }

    /// `column_sum - row_sum` for every participant: positive means the
    /// participant is owed money overall, negative means they owe.
    pub fn net_balances(&self) -> Vec<Decimal> {
        (0..self.size())
            .map(|i| self.column_sum(i) - self.row_sum(i))
            .collect()
    }

    /// Sum of every cell.
    pub fn gross_total(&self) -> Decimal {
        self.rows.iter().flatten().copied().sum()
    }

    /// Number of cells carrying more than `tolerance`.
    pub fn edge_count(&self, tolerance: Decimal) -> usize {
        self.rows
            .iter()
            .flatten()
            .filter(|amount| **amount > tolerance)
            .count()
    }

    pub fn diagonal_is_zero(&self) -> bool {
        (0..self.size()).all(|i| self.rows[i][i] == Decimal::ZERO)
    }

    /// Whether this matrix carries the same net balances as `expected`,
    /// each within `tolerance`.
    pub fn is_conserved_against(&self, expected: &[Decimal], tolerance: Decimal) -> bool {
        let net = self.net_balances();
        net.len() == expected.len()
            && net
                .iter()
                .zip(expected)
                .all(|(actual, wanted)| (*actual - *wanted).abs() <= tolerance)
    }

    /// Non-zero cells as transfers, scanned row-major so the order is stable.
    pub fn transfers(&self, tolerance: Decimal) -> Vec<Transfer> {
        let mut transfers = Vec::new();
        for (i, row) in self.rows.iter().enumerate() {
            for (j, amount) in row.iter().enumerate() {
                if *amount > tolerance {
                    transfers.push(Transfer {
                        from: self.names[i].clone(),
                        to: self.names[j].clone(),
                        amount: *amount,
                    });
                }
            }
        }
        transfers
    }

    /// Directed graph of the cells above `tolerance`, one node per participant
    /// in matrix order. Suitable for DOT export or external layout.
    pub fn to_graph(&self, tolerance: Decimal) -> DiGraph<ParticipantName, Decimal> {
        let mut graph = DiGraph::with_capacity(self.size(), self.edge_count(tolerance));
        let nodes: Vec<_> = self
            .names
            .iter()
            .map(|name| graph.add_node(name.clone()))
            .collect();
        for (i, row) in self.rows.iter().enumerate() {
            for (j, amount) in row.iter().enumerate() {
                if *amount > tolerance {
                    graph.add_edge(nodes[i], nodes[j], *amount);
                }
            }
        }
        graph
    }
}

impl fmt::Display for DebtMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .names
            .iter()
            .map(|n| n.as_str().len())
            .max()
            .unwrap_or(0)
            .max(10);

        write!(f, "{:>width$}", "", width = width)?;
        for name in &self.names {
            write!(f, " {:>width$}", name.as_str(), width = width)?;
        }
        writeln!(f)?;

        for (name, row) in self.names.iter().zip(&self.rows) {
            write!(f, "{:>width$}", name.as_str(), width = width)?;
            for amount in row {
                if amount.is_zero() {
                    write!(f, " {:>width$}", "-", width = width)?;
                } else {
                    write!(f, " {:>width$}", amount.round_dp(2).to_string(), width = width)?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn names(list: &[&str]) -> Vec<ParticipantName> {
        list.iter().map(|n| ParticipantName::new(*n)).collect()
    }

    #[test]
    fn test_row_and_column_sums() {
        let mut m = DebtMatrix::zeros(names(&["A", "B", "C"]));
        m.add(1, 0, dec!(40));
        m.add(2, 0, dec!(40));
        m.add(2, 1, dec!(10));

        assert_eq!(m.row_sum(2), dec!(50));
        assert_eq!(m.column_sum(0), dec!(80));
        assert_eq!(m.net_balances(), vec![dec!(80), dec!(-30), dec!(-50)]);
        assert_eq!(m.gross_total(), dec!(90));
        assert_eq!(m.edge_count(Decimal::ZERO), 3);
    }

    #[test]
    fn test_net_sums_to_zero() {
        let mut m = DebtMatrix::zeros(names(&["A", "B", "C"]));
        m.add(0, 1, dec!(13.5));
        m.add(1, 2, dec!(7.25));
        m.add(2, 0, dec!(100));
        let total: Decimal = m.net_balances().iter().sum();
        assert_eq!(total, Decimal::ZERO);
    }

    #[test]
    fn test_transfers_row_major() {
        let mut m = DebtMatrix::zeros(names(&["A", "B", "C"]));
        m.set(2, 0, dec!(5));
        m.set(1, 0, dec!(3));
        m.set(1, 2, dec!(0.0000001));

        let transfers = m.transfers(dec!(0.000001));
        assert_eq!(transfers.len(), 2);
        assert_eq!(transfers[0].from.as_str(), "B");
        assert_eq!(transfers[1].from.as_str(), "C");
        assert_eq!(transfers[1].amount, dec!(5));
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        assert_eq!(
            DebtMatrix::from_rows(names(&["A", "B"]), vec![vec![Decimal::ZERO; 2]]),
            Err(MatrixError::RowCount {
                expected: 2,
                actual: 1
            })
        );
        assert_eq!(
            DebtMatrix::from_rows(
                names(&["A", "B"]),
                vec![vec![Decimal::ZERO; 2], vec![Decimal::ZERO; 3]]
            ),
            Err(MatrixError::RowLength {
                row: 1,
                expected: 2,
                actual: 3
            })
        );
    }

    #[test]
    fn test_from_rows_rejects_oversized_debt() {
        let huge = MAX_LEDGER_VOLUME;
        let rows = vec![vec![Decimal::ZERO, huge], vec![huge, Decimal::ZERO]];
        assert_eq!(
            DebtMatrix::from_rows(names(&["A", "B"]), rows),
            Err(MatrixError::VolumeExceeded)
        );
    }

    #[test]
    fn test_deserialize_checks_shape() {
        let err = serde_json::from_str::<DebtMatrix>(r#"{"names":["A","B"],"rows":[["0"]]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("expected 2 rows, got 1"));

        let m: DebtMatrix =
            serde_json::from_str(r#"{"names":["A","B"],"rows":[["0","5"],["0","0"]]}"#).unwrap();
        assert_eq!(m.get(0, 1), dec!(5));
    }

    #[test]
    fn test_conservation_check() {
        let mut m = DebtMatrix::zeros(names(&["A", "B"]));
        m.set(1, 0, dec!(40));
        assert!(m.is_conserved_against(&[dec!(40), dec!(-40)], dec!(0.000001)));
        assert!(!m.is_conserved_against(&[dec!(41), dec!(-41)], dec!(0.000001)));
        assert!(!m.is_conserved_against(&[dec!(40)], dec!(0.000001)));
    }

    #[test]
    fn test_to_graph() {
        let mut m = DebtMatrix::zeros(names(&["A", "B", "C"]));
        m.set(1, 0, dec!(40));
        m.set(2, 0, dec!(40));
        let graph = m.to_graph(Decimal::ZERO);
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_display_marks_empty_cells() {
        let mut m = DebtMatrix::zeros(names(&["A", "B"]));
        m.set(1, 0, dec!(40));
        let text = m.to_string();
        assert!(text.contains('-'));
        assert!(text.contains("40"));
    }
}
