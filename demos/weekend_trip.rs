//! Weekend trip example.
//!
//! Four friends share dinners, taxis and tickets. Shows the allocation
//! summary, every matrix stage and the final settlement plan.

use ledger_settle::prelude::*;
use ledger_settle::core::ledger::LedgerMetadata;
use rust_decimal_macros::dec;

fn main() {
    println!("╔══════════════════════════════════════════╗");
    println!("║   ledger-settle: Weekend Trip Example    ║");
    println!("╚══════════════════════════════════════════╝\n");

    let friends = ["Alice", "Bob", "Charlie", "David"];
    let ledger = Ledger::new(
        friends,
        vec![
            ExpenseRecord::even("Dinner", dec!(200), "Alice", friends).with_category("Food"),
            ExpenseRecord::explicit("Taxi", dec!(80), "Bob", ["Alice", "Bob"], [("Alice", dec!(50))])
                .with_category("Transport"),
            ExpenseRecord::even("Movie Tickets", dec!(120), "Charlie", ["Bob", "Charlie"])
                .with_category("Entertainment"),
            ExpenseRecord::explicit("Coffee", dec!(40), "David", ["Alice"], [("Alice", dec!(40))])
                .with_category("Food"),
            ExpenseRecord::even("Lunch", dec!(150), "Bob", ["Alice", "Charlie", "David"])
                .with_category("Food"),
        ],
    )
    .expect("valid ledger")
    .with_metadata(LedgerMetadata {
        split_name: Some("Weekend Trip".to_string()),
    });

    let outcome = Pipeline::new(PipelineConfig::default()).run(&ledger);

    // --- Who paid what ---
    println!("━━━ Split Summary ━━━\n");
    for participant in outcome.allocation.participants() {
        println!(
            "{:<8} paid {:>7}  owes {:>7}  net {:>7}",
            participant.name.as_str(),
            participant.total_paid.round_dp(2).to_string(),
            participant.total_owed.round_dp(2).to_string(),
            participant.net_balance.round_dp(2).to_string()
        );
    }
    println!();

    // --- Every stage ---
    for (stage, matrix) in outcome.stages.iter() {
        println!("━━━ {} ━━━\n", stage);
        println!("{}", matrix);
    }

    // --- Plan ---
    println!("━━━ Settlement Plan ━━━\n");
    for transfer in &outcome.transfers {
        println!("  {}", transfer);
    }
    println!();
    println!("{}", outcome.report());
    println!("Balances conserved: {}", outcome.is_conserved());
}
