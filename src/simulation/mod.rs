//! Random ledger generation for benchmarks, tests and the CLI.

pub mod random_ledger;

pub use random_ledger::{generate_random_ledger, RandomLedgerConfig};
