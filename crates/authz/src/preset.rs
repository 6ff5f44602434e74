//! Role Preset Registry: static default permissions per role.
//!
//! Presets are configuration, not persisted state. The registry is built
//! once per process and read from there on; lookups are total, pure, and
//! free of I/O. A role without an entry gets the empty preset
//! (deny-by-default), never an error.

use std::collections::HashMap;

use crate::action::{Action, ActionSet};
use crate::resource::Resource;
use crate::role::Role;

/// Default permissions of one role.
///
/// The `all` field is the literal `all` pseudo-scope: holding `edit` there
/// is the superuser bypass the engine checks before any resource lookup.
/// It is kept separate from the per-resource map so that resources added
/// later are covered without a registry update.
//
// TODO(product): confirm whether `all`+`edit` is meant as a true blanket
// bypass or a convention limited to settings/system screens. Preserved
// literally as observed in production until clarified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RolePreset {
    all: ActionSet,
    by_resource: HashMap<Resource, ActionSet>,
}

impl RolePreset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant on the `all` pseudo-scope (builder style).
    pub fn with_all(mut self, actions: ActionSet) -> Self {
        self.all = actions;
        self
    }

    /// Grant on one concrete resource (builder style).
    pub fn with(mut self, resource: Resource, actions: ActionSet) -> Self {
        self.by_resource.insert(resource, actions);
        self
    }

    /// Actions the preset grants on the `all` pseudo-scope.
    pub fn all_scope(&self) -> &ActionSet {
        &self.all
    }

    /// Default actions for one resource; empty if the resource is absent.
    pub fn actions_for(&self, resource: Resource) -> ActionSet {
        self.by_resource.get(&resource).cloned().unwrap_or_default()
    }

    pub fn allows(&self, resource: Resource, action: Action) -> bool {
        self.by_resource
            .get(&resource)
            .is_some_and(|set| set.contains(action))
    }

    pub fn allows_all_scope(&self, action: Action) -> bool {
        self.all.contains(action)
    }
}

/// Static table mapping each role to its default permissions.
#[derive(Debug, Clone)]
pub struct PresetRegistry {
    presets: HashMap<Role, RolePreset>,
    empty: RolePreset,
}

impl PresetRegistry {
    pub fn new(presets: HashMap<Role, RolePreset>) -> Self {
        Self {
            presets,
            empty: RolePreset::default(),
        }
    }

    /// The firm's default permission table.
    pub fn default_presets() -> Self {
        use Action::*;
        use Resource::*;

        let mut presets = HashMap::new();

        // Administrators hold edit on the `all` pseudo-scope: blanket allow.
        presets.insert(
            Role::Administrator,
            RolePreset::new().with_all(ActionSet::of([View, Edit, Approve, Delete])),
        );

        presets.insert(
            Role::ProjectManager,
            RolePreset::new()
                .with(Projects, ActionSet::of([View, Edit, Approve]))
                .with(Opportunities, ActionSet::of([View, Edit]))
                .with(Properties, ActionSet::of([View, Edit]))
                .with(Documents, ActionSet::of([View, Edit]))
                .with(Calendar, ActionSet::of([View, Edit]))
                .with(Messages, ActionSet::of([View, Edit]))
                .with(Analytics, ActionSet::of([View]))
                .with(Reports, ActionSet::of([View]))
                .with(Marketing, ActionSet::of([View])),
        );

        presets.insert(
            Role::Investor,
            RolePreset::new()
                .with(Projects, ActionSet::of([View]))
                .with(Opportunities, ActionSet::of([View]))
                .with(Properties, ActionSet::of([View]))
                .with(Documents, ActionSet::of([View]))
                .with(Financial, ActionSet::of([View]))
                .with(Reports, ActionSet::of([View]))
                .with(Calendar, ActionSet::of([View]))
                .with(Messages, ActionSet::of([View, Edit])),
        );

        // Clients see their properties and documents; no projects, no financial.
        presets.insert(
            Role::Client,
            RolePreset::new()
                .with(Properties, ActionSet::of([View]))
                .with(Documents, ActionSet::of([View]))
                .with(Calendar, ActionSet::of([View]))
                .with(Messages, ActionSet::of([View, Edit])),
        );

        presets.insert(
            Role::Partner,
            RolePreset::new()
                .with(Opportunities, ActionSet::of([View, Edit]))
                .with(Properties, ActionSet::of([View]))
                .with(Marketing, ActionSet::of([View, Edit]))
                .with(Documents, ActionSet::of([View]))
                .with(Calendar, ActionSet::of([View]))
                .with(Messages, ActionSet::of([View, Edit])),
        );

        presets.insert(
            Role::Analyst,
            RolePreset::new()
                .with(Analytics, ActionSet::of([View, Edit]))
                .with(Reports, ActionSet::of([View, Edit, Approve]))
                .with(Financial, ActionSet::of([View]))
                .with(Projects, ActionSet::of([View]))
                .with(Properties, ActionSet::of([View])),
        );

        Self::new(presets)
    }

    /// Default permissions for a role.
    ///
    /// Total: a role without an entry yields the empty preset, never an
    /// error or a panic.
    pub fn preset_for(&self, role: Role) -> &RolePreset {
        self.presets.get(&role).unwrap_or(&self.empty)
    }
}

impl Default for PresetRegistry {
    fn default() -> Self {
        Self::default_presets()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlisted_role_gets_the_empty_preset_for_every_resource() {
        let registry = PresetRegistry::new(HashMap::new());

        for role in Role::ALL {
            let preset = registry.preset_for(role);
            assert!(preset.all_scope().is_empty());
            for resource in Resource::ALL {
                assert!(preset.actions_for(resource).is_empty());
            }
        }
    }

    #[test]
    fn administrator_holds_edit_on_the_all_scope() {
        let registry = PresetRegistry::default_presets();
        let preset = registry.preset_for(Role::Administrator);

        assert!(preset.allows_all_scope(Action::Edit));
    }

    #[test]
    fn investor_defaults_to_view_only_on_projects() {
        let registry = PresetRegistry::default_presets();
        let preset = registry.preset_for(Role::Investor);

        assert!(preset.allows(Resource::Projects, Action::View));
        assert!(!preset.allows(Resource::Projects, Action::Edit));
    }

    #[test]
    fn client_has_no_entry_for_projects_or_financial() {
        let registry = PresetRegistry::default_presets();
        let preset = registry.preset_for(Role::Client);

        assert!(preset.actions_for(Resource::Projects).is_empty());
        assert!(preset.actions_for(Resource::Financial).is_empty());
    }
}
