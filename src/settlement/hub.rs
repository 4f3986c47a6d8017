use crate::allocation::engine::DEFAULT_TOLERANCE;
use crate::core::matrix::DebtMatrix;
use crate::core::participant::ParticipantName;
use crate::settlement::{unsettled, SettlementStrategy};
use log::debug;
use rust_decimal::Decimal;

/// Routes every transfer through a single hub: the participant with the
/// largest absolute balance (lowest index on ties).
///
/// Creditors are paid by the hub, debtors pay the hub. At most `n - 1`
/// transfers, all touching the hub.
#[derive(Debug, Clone, Copy)]
pub struct HubSettlement {
    tolerance: Decimal,
}

impl Default for HubSettlement {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE)
    }
}

impl HubSettlement {
    pub fn new(tolerance: Decimal) -> Self {
        Self { tolerance }
    }

    /// Index of the hub for a given balance vector.
    pub fn select_hub(net: &[Decimal]) -> Option<usize> {
        let mut hub: Option<usize> = None;
        for (i, amount) in net.iter().enumerate() {
            match hub {
                Some(h) if amount.abs() <= net[h].abs() => {}
                _ => hub = Some(i),
            }
        }
        hub
    }
}

impl SettlementStrategy for HubSettlement {
    fn name(&self) -> &'static str {
        "hub"
    }

    fn settle(&self, net: &[Decimal], names: &[ParticipantName]) -> DebtMatrix {
        let mut out = DebtMatrix::zeros(names.to_vec());
        if unsettled(net, self.tolerance).len() <= 1 {
            return out;
        }
        let Some(hub) = Self::select_hub(net) else {
            return out;
        };
        debug!("settling through hub {}", names[hub]);

        for (i, amount) in net.iter().enumerate() {
            if i == hub {
                continue;
            }
            if *amount > self.tolerance {
                out.set(hub, i, *amount);
            } else if *amount < -self.tolerance {
                out.set(i, hub, -*amount);
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
    fn test_hub_selection() {
        assert_eq!(HubSettlement::select_hub(&[dec!(10), dec!(-30), dec!(20)]), Some(1));
        assert_eq!(HubSettlement::select_hub(&[dec!(-25), dec!(25)]), Some(0));
        assert_eq!(HubSettlement::select_hub(&[]), None);
    }

    #[test]
    fn test_star_through_hub() {
        let net = vec![dec!(30), dec!(-70), dec!(25), dec!(15)];
        let out = HubSettlement::default().settle(&net, &names(4));

        assert_eq!(out.get(1, 0), dec!(30));
        assert_eq!(out.get(1, 2), dec!(25));
        assert_eq!(out.get(1, 3), dec!(15));
        assert_eq!(out.edge_count(Decimal::ZERO), 3);
        assert_eq!(out.net_balances(), net);
    }

    #[test]
    fn test_debtors_pay_creditor_hub() {
        let net = vec![dec!(-20), dec!(-35), dec!(55)];
        let out = HubSettlement::default().settle(&net, &names(3));

        assert_eq!(out.get(0, 2), dec!(20));
        assert_eq!(out.get(1, 2), dec!(35));
        assert_eq!(out.net_balances(), net);
    }
}
