//! Per-request identity context.

use ridgeline_authz::Subject;

/// The authenticated caller, attached to the request by the identity
/// middleware.
#[derive(Debug, Clone, Copy)]
pub struct SubjectContext(Subject);

impl SubjectContext {
    pub fn new(subject: Subject) -> Self {
        Self(subject)
    }

    pub fn subject(&self) -> &Subject {
        &self.0
    }
}
