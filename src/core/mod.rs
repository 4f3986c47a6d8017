//! Foundational types: participants, expense records, ledgers and debt matrices.

pub mod expense;
pub mod input;
pub mod ledger;
pub mod matrix;
pub mod participant;
