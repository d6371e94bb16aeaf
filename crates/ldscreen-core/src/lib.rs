//! ldscreen-core: Screening engine, graders, aggregation and risk model.
//!
//! This crate defines the data model, the per-domain graders, weakness
//! aggregation, recommendation derivation and the intake risk classifier
//! that the ldscreen tools build on.

pub mod aggregate;
pub mod attempt;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod grading;
pub mod model;
pub mod parser;
pub mod recommend;
pub mod report;
pub mod results;
pub mod store;
