use crate::core::matrix::DebtMatrix;
use crate::core::participant::ParticipantName;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One participant's line in a stage summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceLine {
    pub name: ParticipantName,
    /// Row sum: what this participant pays out.
    pub to_give: Decimal,
    /// Column sum: what this participant receives.
    pub to_get: Decimal,
    pub net: Decimal,
}

/// Per-participant totals of one debt matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSummary {
    pub lines: Vec<BalanceLine>,
    pub gross_total: Decimal,
    pub edge_count: usize,
}

impl StageSummary {
    pub fn from_matrix(matrix: &DebtMatrix, tolerance: Decimal) -> Self {
        let lines = matrix
            .names()
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let to_give = matrix.row_sum(i);
                let to_get = matrix.column_sum(i);
                BalanceLine {
                    name: name.clone(),
                    to_give,
                    to_get,
                    net: to_get - to_give,
                }
            })
            .collect();

        Self {
            lines,
            gross_total: matrix.gross_total(),
            edge_count: matrix.edge_count(tolerance),
        }
    }
}

impl fmt::Display for StageSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<16} {:>12} {:>12} {:>12}", "Name", "To Give", "To Get", "Net")?;
        for line in &self.lines {
            writeln!(
                f,
                "{:<16} {:>12} {:>12} {:>12}",
                line.name.as_str(),
                line.to_give.round_dp(2).to_string(),
                line.to_get.round_dp(2).to_string(),
                line.net.round_dp(2).to_string()
            )?;
        }
        writeln!(f, "Gross: {}  Transfers: {}", self.gross_total.round_dp(2), self.edge_count)
    }
}

/// How much a settlement simplified the original debt graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementReport {
    pub gross_before: Decimal,
    pub gross_after: Decimal,
    pub transfers_before: usize,
    pub transfers_after: usize,
}

impl SettlementReport {
    pub fn compare(before: &DebtMatrix, after: &DebtMatrix, tolerance: Decimal) -> Self {
        Self {
            gross_before: before.gross_total(),
            gross_after: after.gross_total(),
            transfers_before: before.edge_count(tolerance),
            transfers_after: after.edge_count(tolerance),
        }
    }

    pub fn gross_saved(&self) -> Decimal {
        self.gross_before - self.gross_after
    }

    /// Fraction of the original gross volume no longer moved, in percent.
    pub fn reduction_percent(&self) -> f64 {
        if self.gross_before.is_zero() {
            return 0.0;
        }
        let ratio = self.gross_saved() / self.gross_before;
        ratio.to_f64().unwrap_or(0.0) * 100.0
    }

    pub fn transfers_saved(&self) -> usize {
        self.transfers_before.saturating_sub(self.transfers_after)
    }
}

impl fmt::Display for SettlementReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Settlement Report ===")?;
        writeln!(f, "Gross Before:     {}", self.gross_before.round_dp(2))?;
        writeln!(f, "Gross After:      {}", self.gross_after.round_dp(2))?;
        writeln!(f, "Reduction:        {:.1}%", self.reduction_percent())?;
        writeln!(
            f,
            "Transfers:        {} -> {} ({} fewer)",
            self.transfers_before,
            self.transfers_after,
            self.transfers_saved()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rust_decimal_macros::dec;

    fn names(list: &[&str]) -> Vec<ParticipantName> {
        list.iter().map(|n| ParticipantName::new(*n)).collect()
    }

    #[test]
    fn test_stage_summary_lines() {
        let mut m = DebtMatrix::zeros(names(&["Alice", "Bob", "Charlie"]));
        m.set(1, 0, dec!(40));
        m.set(2, 0, dec!(40));

        let summary = StageSummary::from_matrix(&m, dec!(0.000001));
        assert_eq!(summary.lines[0].to_get, dec!(80));
        assert_eq!(summary.lines[0].net, dec!(80));
        assert_eq!(summary.lines[1].to_give, dec!(40));
        assert_eq!(summary.lines[2].net, dec!(-40));
        assert_eq!(summary.edge_count, 2);
        assert!(summary.to_string().contains("To Give"));
    }

    #[test]
    fn test_report_reduction() {
        let mut before = DebtMatrix::zeros(names(&["A", "B", "C"]));
        before.set(0, 1, dec!(100));
        before.set(1, 2, dec!(100));
        let mut after = DebtMatrix::zeros(names(&["A", "B", "C"]));
        after.set(0, 2, dec!(100));

        let report = SettlementReport::compare(&before, &after, dec!(0.000001));
        assert_eq!(report.gross_saved(), dec!(100));
        assert_eq!(report.transfers_saved(), 1);
        assert_relative_eq!(report.reduction_percent(), 50.0, epsilon = 1e-9);
    }

    #[test]
    fn test_report_on_empty_matrix() {
        let m = DebtMatrix::zeros(names(&["A", "B"]));
        let report = SettlementReport::compare(&m, &m, dec!(0.000001));
        assert_relative_eq!(report.reduction_percent(), 0.0);
    }
}
