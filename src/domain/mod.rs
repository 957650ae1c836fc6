//! Core domain types and logic.

pub mod weekly;
pub mod ranking;
pub mod rotation;
pub mod benchmark;
pub mod position;
pub mod portfolio;
pub mod simulation;
pub mod summary;
pub mod universe;
pub mod config_validation;
pub mod error;
