use crate::allocation::engine::DEFAULT_TOLERANCE;
use crate::core::matrix::DebtMatrix;
use crate::core::participant::ParticipantName;
use crate::settlement::{unsettled, SettlementStrategy};
use log::debug;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::{depth_first_search, DfsEvent, DfsPostOrder};
use rust_decimal::Decimal;

/// Settles along a spanning tree of the unsettled participants.
///
/// The tree is a path over the participants with a non-zero balance in
/// index order, rooted at the first. Balances are pushed from the leaves
/// towards the root: each node settles with its parent and hands its
/// balance up. The root ends at zero when balances sum to zero.
///
/// Produces one transfer per tree edge, so `k - 1` transfers for `k`
/// unsettled participants.
#[derive(Debug, Clone, Copy)]
pub struct TreeSettlement {
    tolerance: Decimal,
}

impl Default for TreeSettlement {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE)
    }
}

impl TreeSettlement {
    pub fn new(tolerance: Decimal) -> Self {
        Self { tolerance }
    }
}

impl SettlementStrategy for TreeSettlement {
    fn name(&self) -> &'static str {
        "tree"
    }

    fn settle(&self, net: &[Decimal], names: &[ParticipantName]) -> DebtMatrix {
        let mut out = DebtMatrix::zeros(names.to_vec());
        let open = unsettled(net, self.tolerance);
        if open.len() <= 1 {
            return out;
        }

        // Node weights are matrix indices.
        let mut tree: UnGraph<usize, ()> = UnGraph::with_capacity(open.len(), open.len() - 1);
        let nodes: Vec<NodeIndex> = open.iter().map(|&i| tree.add_node(i)).collect();
        for pair in nodes.windows(2) {
            tree.add_edge(pair[0], pair[1], ());
        }
        let root = nodes[0];

        let mut parent: Vec<Option<NodeIndex>> = vec![None; tree.node_count()];
        depth_first_search(&tree, Some(root), |event| {
            if let DfsEvent::TreeEdge(u, v) = event {
                parent[v.index()] = Some(u);
            }
        });

        let mut balance = net.to_vec();
        let mut post = DfsPostOrder::new(&tree, root);
        while let Some(node) = post.next(&tree) {
            let Some(up) = parent[node.index()] else {
                continue;
            };
            let (v, u) = (tree[node], tree[up]);
            let amount = balance[v];

            if amount > self.tolerance {
                out.add(u, v, amount);
            } else if amount < -self.tolerance {
                out.add(v, u, -amount);
            } else {
                continue;
            }
            debug!("{} settles {} with tree parent {}", names[v], amount, names[u]);
            balance[u] += amount;
            balance[v] = Decimal::ZERO;
        }

        let root_left = balance[tree[root]];
        if root_left.abs() > self.tolerance {
            debug!("tree root {} left with {}", names[tree[root]], root_left);
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
    fn test_path_settlement() {
        // Path P0 - P1 - P2 rooted at P0. P2 pays its 40 to P1, which
        // then owes 80 and pays P0.
        let net = vec![dec!(80), dec!(-40), dec!(-40)];
        let out = TreeSettlement::default().settle(&net, &names(3));

        assert_eq!(out.get(1, 0), dec!(80));
        assert_eq!(out.get(2, 1), dec!(40));
        assert_eq!(out.edge_count(Decimal::ZERO), 2);
        assert_eq!(out.net_balances(), net);
    }

    #[test]
    fn test_settled_nodes_left_out() {
        let net = vec![dec!(0), dec!(25), dec!(0), dec!(-25)];
        let out = TreeSettlement::default().settle(&net, &names(4));

        assert_eq!(out.get(3, 1), dec!(25));
        assert_eq!(out.edge_count(Decimal::ZERO), 1);
        assert_eq!(out.row_sum(0) + out.column_sum(0), Decimal::ZERO);
        assert_eq!(out.row_sum(2) + out.column_sum(2), Decimal::ZERO);
    }

    #[test]
    fn test_k_minus_one_edges() {
        let net = vec![dec!(10), dec!(-3), dec!(7), dec!(-20), dec!(6)];
        let out = TreeSettlement::default().settle(&net, &names(5));

        assert_eq!(out.edge_count(Decimal::ZERO), 4);
        assert!(out.is_conserved_against(&net, dec!(0.000001)));
        assert!(out.diagonal_is_zero());
    }
}
