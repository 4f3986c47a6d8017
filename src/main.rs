//! ledger-settle CLI
//!
//! Split shared expenses and settle the resulting debts from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Settle a ledger with the default (greedy) strategy
//! ledger-settle settle --input trip.json
//!
//! # Route everything through one participant, output as JSON
//! ledger-settle settle --input trip.json --strategy hub --format json
//!
//! # Per-participant split summary
//! ledger-settle allocate --input trip.json
//!
//! # Generate a random ledger for testing
//! ledger-settle generate --participants 8 --expenses 40 --seed 7
//! ```

use ledger_settle::allocation::{AllocationEngine, Diagnostic, SharePolicy};
use ledger_settle::core::input::{load_ledger, to_json};
use ledger_settle::core::ledger::Ledger;
use ledger_settle::core::matrix::{DebtMatrix, Transfer};
use ledger_settle::pipeline::{Pipeline, PipelineConfig, Stage};
use ledger_settle::settlement::{SettlementReport, StrategyKind};
use ledger_settle::simulation::{generate_random_ledger, RandomLedgerConfig};
use petgraph::dot::Dot;
use rust_decimal::Decimal;
use std::fs;
use std::process;

fn print_usage() {
    eprintln!(
        r#"ledger-settle: shared-expense allocation and debt settlement

USAGE:
    ledger-settle <COMMAND> [OPTIONS]

COMMANDS:
    settle      Allocate a ledger and reduce its debts to a transfer plan
    allocate    Show each participant's shares, totals and balance
    generate    Generate a random ledger (for testing)
    help        Show this message

OPTIONS (settle):
    --input <FILE>        Path to JSON ledger file
    --strategy <NAME>     greedy (default), hub or tree
    --format <FORMAT>     text (default), json or dot
    --strict              Skip explicit splits whose shares do not match the amount
    --tolerance <DEC>     Absolute tolerance for zero checks (default: 0.000001)

OPTIONS (allocate):
    --input <FILE>        Path to JSON ledger file
    --format <FORMAT>     text (default) or json
    --strict              As for settle

OPTIONS (generate):
    --participants <N>    Number of participants (default: 6)
    --expenses <N>        Number of expenses (default: 20)
    --seed <N>            Seed for reproducible output
    --output <FILE>       Write to file instead of stdout

EXAMPLES:
    ledger-settle settle --input trip.json
    ledger-settle settle --input trip.json --strategy tree --format dot
    ledger-settle allocate --input trip.json --format json
    ledger-settle generate --participants 5 --expenses 15 --output trip.json"#
    );
}

/// JSON output schema for `settle`.
#[derive(serde::Serialize)]
struct SettleOutput<'a> {
    split_name: Option<&'a str>,
    strategy: StrategyKind,
    names: Vec<String>,
    stages: Vec<StageOutput<'a>>,
    transfers: &'a [Transfer],
    report: SettlementReport,
    conserved: bool,
    diagnostics: &'a [Diagnostic],
}

#[derive(serde::Serialize)]
struct StageOutput<'a> {
    stage: Stage,
    label: &'static str,
    matrix: &'a DebtMatrix,
}

/// Read the value following a flag, or exit.
fn flag_value(args: &[String], i: &mut usize, hint: &str) -> String {
    let flag = &args[*i];
    *i += 1;
    args.get(*i).cloned().unwrap_or_else(|| {
        eprintln!("{} requires {}", flag, hint);
        process::exit(1);
    })
}

fn load(path: &str) -> Ledger {
    load_ledger(path).unwrap_or_else(|e| {
        eprintln!("Error loading '{}': {}", path, e);
        eprintln!("Expected format:");
        eprintln!(
            r#"{{
  "names": ["Alice", "Bob"],
  "transactions": [
    {{ "title": "Dinner", "amount": 120.0, "paid_by": "Alice", "even_split": true,
       "checked_names": ["Alice", "Bob"] }}
  ],
  "metadata": {{ "split_name": "Weekend Trip" }}
}}"#
        );
        process::exit(1);
    })
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            process::exit(1);
        }
    }
}

fn cmd_settle(args: &[String]) {
    let mut input_path = None;
    let mut format = "text".to_string();
    let mut config = PipelineConfig::default();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--input" => input_path = Some(flag_value(args, &mut i, "a file path")),
            "--format" => format = flag_value(args, &mut i, "'text', 'json' or 'dot'"),
            "--strategy" => {
                let name = flag_value(args, &mut i, "a strategy name");
                config.strategy = name.parse().unwrap_or_else(|e| {
                    eprintln!("{}", e);
                    process::exit(1);
                });
            }
            "--tolerance" => {
                let raw = flag_value(args, &mut i, "a decimal number");
                config.tolerance = raw
                    .parse::<Decimal>()
                    .ok()
                    .filter(|t| !t.is_sign_negative())
                    .unwrap_or_else(|| {
                        eprintln!("Invalid tolerance '{}'", raw);
                        process::exit(1);
                    });
            }
            "--strict" => config.share_policy = SharePolicy::Strict,
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let path = input_path.unwrap_or_else(|| {
        eprintln!("Error: --input <FILE> is required");
        process::exit(1);
    });

    let ledger = load(&path);
    let outcome = Pipeline::new(config).run(&ledger);

    match format.as_str() {
        "json" => {
            let output = SettleOutput {
                split_name: ledger.metadata().split_name.as_deref(),
                strategy: outcome.strategy,
                names: outcome.names.iter().map(|n| n.to_string()).collect(),
                stages: outcome
                    .stages
                    .iter()
                    .map(|(stage, matrix)| StageOutput {
                        stage,
                        label: stage.label(),
                        matrix,
                    })
                    .collect(),
                transfers: &outcome.transfers,
                report: outcome.report(),
                conserved: outcome.is_conserved(),
                diagnostics: &outcome.diagnostics,
            };
            print_json(&output);
        }
        "dot" => {
            let graph = outcome.final_matrix().to_graph(config.tolerance);
            println!("{}", Dot::new(&graph));
        }
        "text" => {
            if let Some(name) = &ledger.metadata().split_name {
                println!("=== {} ===\n", name);
            }
            for (stage, matrix) in outcome.stages.iter() {
                println!("{}", stage);
                println!("{}", matrix);
            }

            println!("Settlement Plan ({}):", outcome.strategy);
            if outcome.transfers.is_empty() {
                println!("  Nothing to settle.");
            }
            for transfer in &outcome.transfers {
                println!("  {}", transfer);
            }
            println!();
            println!("{}", outcome.summary(Stage::Settled));
            println!("{}", outcome.report());

            if !outcome.diagnostics.is_empty() {
                println!("Diagnostics:");
                for diagnostic in &outcome.diagnostics {
                    println!("  {}", diagnostic);
                }
            }
        }
        other => {
            eprintln!("Unknown format '{}'", other);
            process::exit(1);
        }
    }
}

fn cmd_allocate(args: &[String]) {
    let mut input_path = None;
    let mut format = "text".to_string();
    let mut policy = SharePolicy::Permissive;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--input" => input_path = Some(flag_value(args, &mut i, "a file path")),
            "--format" => format = flag_value(args, &mut i, "'text' or 'json'"),
            "--strict" => policy = SharePolicy::Strict,
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let path = input_path.unwrap_or_else(|| {
        eprintln!("Error: --input <FILE> is required");
        process::exit(1);
    });

    let ledger = load(&path);
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let allocation = AllocationEngine::new(policy).allocate_ledger(&ledger, &mut diagnostics);

    if format == "json" {
        print_json(&allocation);
        return;
    }

    for participant in allocation.participants() {
        println!("--- {} ---", participant.name);
        for entry in &participant.entries {
            println!(
                "  {:<24} total {:>10}  share {:>10}  paid by {}",
                entry.title,
                entry.total_amount.round_dp(2).to_string(),
                entry.share.round_dp(2).to_string(),
                entry.paid_by
            );
        }
        println!("  Total paid:  {}", participant.total_paid.round_dp(2));
        println!("  Total owed:  {}", participant.total_owed.round_dp(2));
        println!("  Net balance: {}", participant.net_balance.round_dp(2));
        println!();
    }

    if !diagnostics.is_empty() {
        println!("Diagnostics:");
        for diagnostic in &diagnostics {
            println!("  {}", diagnostic);
        }
    }
}

fn cmd_generate(args: &[String]) {
    let mut config = RandomLedgerConfig::default();
    let mut output_path: Option<String> = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--participants" => {
                config.participants = flag_value(args, &mut i, "a number")
                    .parse()
                    .unwrap_or_else(|_| {
                        eprintln!("--participants requires a number");
                        process::exit(1);
                    });
            }
            "--expenses" => {
                config.expenses = flag_value(args, &mut i, "a number")
                    .parse()
                    .unwrap_or_else(|_| {
                        eprintln!("--expenses requires a number");
                        process::exit(1);
                    });
            }
            "--seed" => {
                config.seed = Some(flag_value(args, &mut i, "a number").parse().unwrap_or_else(
                    |_| {
                        eprintln!("--seed requires a number");
                        process::exit(1);
                    },
                ));
            }
            "--output" => output_path = Some(flag_value(args, &mut i, "a file path")),
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let ledger = generate_random_ledger(&config).unwrap_or_else(|e| {
        eprintln!("Error generating ledger: {}", e);
        process::exit(1);
    });
    let json = to_json(&ledger).unwrap_or_else(|e| {
        eprintln!("Error serializing ledger: {}", e);
        process::exit(1);
    });

    if let Some(path) = output_path {
        fs::write(&path, &json).unwrap_or_else(|e| {
            eprintln!("Error writing to '{}': {}", path, e);
            process::exit(1);
        });
        eprintln!(
            "Generated {} expenses across {} participants → {}",
            ledger.records().len(),
            ledger.participant_count(),
            path
        );
    } else {
        println!("{}", json);
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "settle" => cmd_settle(rest),
        "allocate" => cmd_allocate(rest),
        "generate" => cmd_generate(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
