//! wfopt: walk-forward optimisation of SMA crossover strategies.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`], command-line front end in [`cli`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
