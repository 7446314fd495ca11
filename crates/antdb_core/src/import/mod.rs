//! Idempotent CSV-batch import: rows in, resolved records and an error log
//! out.
//!
//! # Responsibility
//! - Parse name→string input rows into typed fields.
//! - Orchestrate the species → research → records phases with row-level
//!   failure isolation.
//!
//! # Invariants
//! - One input row commits or rolls back as a single atomic unit.
//! - Domain errors never abort the batch; store errors always do.

pub mod report;
pub mod row;
pub mod runner;
