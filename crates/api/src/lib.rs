//! `ridgeline-api` — HTTP surface of the authorization subsystem.
//!
//! Route guards and UI capability gates call `/access/check`; administrative
//! screens manage grants under `/admin/grants`. Authentication itself is an
//! upstream collaborator: the session gateway injects the caller's identity
//! as trusted headers, and [`middleware`] only translates them into a
//! [`ridgeline_authz::Subject`].

pub mod app;
pub mod context;
pub mod middleware;
