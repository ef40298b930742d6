//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - DuckDB for the Repository port
//! - In-memory storage and event sink for tests and throwaway sessions

pub mod duckdb;
pub mod memory;
