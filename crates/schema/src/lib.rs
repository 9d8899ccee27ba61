//! # usde-schema: Database provisioning layer for the USDE backend
//!
//! One tested implementation of the schema work the old one-off scripts
//! duplicated: an idempotent migration sequencer that applies declarative,
//! existence-checked steps, a per-dialect schema inspector, and an upsert
//! seeder for demo data.

pub mod config;
pub mod error;
pub mod inspector;
pub mod seeder;
pub mod sequencer;
pub mod sql;
pub mod steps;

// Re-export core traits and types
pub use config::*;
pub use error::*;
pub use inspector::*;
pub use seeder::*;
pub use sequencer::*;
pub use sql::*;
pub use steps::*;
