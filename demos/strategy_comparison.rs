//! Strategy comparison example.
//!
//! Settles the same random ledger with the greedy, hub and tree strategies
//! and compares how many transfers and how much volume each needs.

use ledger_settle::prelude::*;
use ledger_settle::simulation::{generate_random_ledger, RandomLedgerConfig};

fn main() {
    println!("╔══════════════════════════════════════════╗");
    println!("║ ledger-settle: Strategy Comparison       ║");
    println!("╚══════════════════════════════════════════╝\n");

    let config = RandomLedgerConfig {
        participants: 8,
        expenses: 30,
        seed: Some(11),
        ..Default::default()
    };
    let ledger = generate_random_ledger(&config).expect("valid config");

    println!(
        "{} participants, {} expenses\n",
        ledger.participant_count(),
        ledger.records().len()
    );
    println!(
        "{:<8} {:>10} {:>14} {:>12} {:>10}",
        "Strategy", "Transfers", "Gross After", "Reduction", "Conserved"
    );

    for strategy in StrategyKind::ALL {
        let outcome = Pipeline::new(PipelineConfig {
            strategy,
            ..Default::default()
        })
        .run(&ledger);
        let report = outcome.report();

        println!(
            "{:<8} {:>10} {:>14} {:>11.1}% {:>10}",
            strategy.to_string(),
            report.transfers_after,
            report.gross_after.round_dp(2).to_string(),
            report.reduction_percent(),
            outcome.is_conserved()
        );
    }

    println!("\nTree plan:");
    let tree = Pipeline::new(PipelineConfig {
        strategy: StrategyKind::Tree,
        ..Default::default()
    })
    .run(&ledger);
    for transfer in &tree.transfers {
        println!("  {}", transfer);
    }
}
