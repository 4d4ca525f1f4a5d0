//! Shared configuration, errors and identifiers for the rota workspace.

pub mod config;
pub mod error;
pub mod types;
