//! Grant store implementations.
//!
//! The trait lives in `ridgeline-authz` (domain boundary); this module
//! provides the durable Postgres implementation. The in-memory store for
//! tests/dev ships with the authz crate itself.

pub mod postgres;

pub use postgres::PostgresGrantStore;
