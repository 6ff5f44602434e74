//! `ridgeline-infra` — infrastructure behind the authorization core.
//!
//! Persistence (Postgres grant store) and housekeeping (expiry sweeper).
//! Nothing here participates in decision correctness: the engine evaluates
//! expiry lazily, this crate only keeps durable state and listings accurate.

pub mod grant_store;
pub mod sweeper;

pub use grant_store::PostgresGrantStore;
pub use sweeper::{ExpirySweeper, SweeperConfig, SweeperHandle, SweeperStats};
