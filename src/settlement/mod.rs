//! Settlement strategies: turning net balances into a concrete transfer plan.
//!
//! Every strategy consumes the net balance vector of a reduced debt matrix
//! (positive = owed money, negative = owes) and produces a new matrix whose
//! net balances match it. They differ only in the shape of the plan.

pub mod greedy;
pub mod hub;
pub mod summary;
pub mod tree;

pub use greedy::GreedySettlement;
pub use hub::HubSettlement;
pub use summary::{SettlementReport, StageSummary};
pub use tree::TreeSettlement;

use crate::core::matrix::DebtMatrix;
use crate::core::participant::ParticipantName;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Converts net balances into a matrix of recommended transfers.
///
/// Implementations must conserve `net` within their tolerance, and must
/// return the zero matrix when at most one participant has a non-zero
/// balance.
pub trait SettlementStrategy {
    fn name(&self) -> &'static str;

    fn settle(&self, net: &[Decimal], names: &[ParticipantName]) -> DebtMatrix;
}

/// Selects a settlement strategy at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Match largest creditor with largest debtor until balanced.
    #[default]
    Greedy,
    /// Route every transfer through the participant with the largest balance.
    Hub,
    /// Chain participants into a path and settle leaf to root.
    Tree,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [StrategyKind::Greedy, StrategyKind::Hub, StrategyKind::Tree];

    /// Instantiate the strategy with the given tolerance.
    pub fn build(self, tolerance: Decimal) -> Box<dyn SettlementStrategy> {
        match self {
            StrategyKind::Greedy => Box::new(GreedySettlement::new(tolerance)),
            StrategyKind::Hub => Box::new(HubSettlement::new(tolerance)),
            StrategyKind::Tree => Box::new(TreeSettlement::new(tolerance)),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Greedy => write!(f, "greedy"),
            StrategyKind::Hub => write!(f, "hub"),
            StrategyKind::Tree => write!(f, "tree"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown settlement strategy '{0}', expected greedy, hub or tree")]
pub struct ParseStrategyError(String);

impl FromStr for StrategyKind {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "greedy" => Ok(StrategyKind::Greedy),
            "hub" => Ok(StrategyKind::Hub),
            "tree" => Ok(StrategyKind::Tree),
            _ => Err(ParseStrategyError(s.to_string())),
        }
    }
}

/// Indices whose balance is farther than `tolerance` from zero.
pub(crate) fn unsettled(net: &[Decimal], tolerance: Decimal) -> Vec<usize> {
    net.iter()
        .enumerate()
        .filter(|(_, amount)| amount.abs() > tolerance)
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_strategy_kind_parse() {
        assert_eq!("greedy".parse::<StrategyKind>(), Ok(StrategyKind::Greedy));
        assert_eq!(" Hub ".parse::<StrategyKind>(), Ok(StrategyKind::Hub));
        assert_eq!("TREE".parse::<StrategyKind>(), Ok(StrategyKind::Tree));
        assert!("star".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn test_strategy_kind_display_round_trips() {
        for kind in StrategyKind::ALL {
            assert_eq!(kind.to_string().parse::<StrategyKind>(), Ok(kind));
            assert_eq!(kind.build(dec!(0.000001)).name(), kind.to_string());
        }
    }

    #[test]
    fn test_single_unsettled_node_is_noop() {
        let names: Vec<ParticipantName> = ["A", "B", "C"].into_iter().map(Into::into).collect();
        // Broken conservation: only one node off zero.
        let net = vec![dec!(10), Decimal::ZERO, Decimal::ZERO];
        for kind in StrategyKind::ALL {
            let out = kind.build(dec!(0.000001)).settle(&net, &names);
            assert_eq!(out.gross_total(), Decimal::ZERO, "{}", kind);
        }
    }

    #[test]
    fn test_unsettled_respects_tolerance() {
        let net = vec![dec!(0.0000001), dec!(-5), dec!(5)];
        assert_eq!(unsettled(&net, dec!(0.000001)), vec![1, 2]);
    }
}
