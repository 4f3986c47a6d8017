//! Building the pairwise debt matrix and simplifying it before settlement.

pub mod builder;
pub mod reduction;

pub use builder::DebtMatrixBuilder;
pub use reduction::GraphReducer;
