//! etfrotator: weekly momentum rotation across a universe of ETFs.
//!
//! Three stages run in sequence: rolling-window ranking of weekly returns,
//! hysteresis portfolio rotation, and a dollar-return simulation against a
//! benchmark that receives the same capital injections.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`], command-line wiring in [`cli`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
