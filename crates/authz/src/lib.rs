//! `ridgeline-authz` — authorization core for the Ridgeline console.
//!
//! Every protected page and UI affordance in the console is a consumer of
//! this crate's decision contract. The crate is intentionally decoupled from
//! HTTP and storage: the HTTP layer extracts an authenticated [`Subject`],
//! persistence plugs in behind the [`GrantStore`] trait.
//!
//! Decision rule, in order:
//! 1. superuser bypass (role preset holds `edit` on the `all` pseudo-scope),
//! 2. role preset for the concrete resource,
//! 3. union of active, unexpired explicit grants.
//!
//! Anything unrecognized or undecidable resolves to deny.

pub mod action;
pub mod engine;
pub mod grant;
pub mod preset;
pub mod resource;
pub mod role;
pub mod store;

pub use action::{Action, ActionSet};
pub use engine::{
    AuthorizationEngine, DecisionError, DecisionExplanation, DenialKind, Subject, decide_at,
    effective_actions_at,
};
pub use grant::{CreateGrant, PermissionGrant};
pub use preset::{PresetRegistry, RolePreset};
pub use resource::Resource;
pub use role::Role;
pub use store::{GrantStore, GrantStoreError, InMemoryGrantStore};
