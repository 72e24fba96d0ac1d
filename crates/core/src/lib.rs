//! The fetch/parse/evaluate/case-manage engine: everything that is not
//! either a pure domain type (`model`) or a Postgres query (`db`).

pub mod canonical;
pub mod case_engine;
pub mod client_ingest;
pub mod config;
pub mod fetchers;
pub mod indicators;
pub mod parsers;
pub mod retention;
pub mod scheduler;
pub mod store;
pub mod threshold_registry;
