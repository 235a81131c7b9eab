//! Actor-to-role resolution.

use std::collections::{BTreeMap, BTreeSet};

use bulwark_types::{Actor, Role};

/// Resolves which roles an actor holds.
///
/// The policy document is the default resolver; a deployment can plug in a
/// directory service instead.
pub trait RoleResolver: Send + Sync {
    /// Roles held by `actor`. Unknown actors hold none.
    fn roles_of(&self, actor: &Actor) -> BTreeSet<Role>;
}

/// A fixed actor → roles table.
#[derive(Clone, Debug, Default)]
pub struct StaticRoles {
    table: BTreeMap<Actor, BTreeSet<Role>>,
}

impl StaticRoles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, actor: &str, roles: &[&str]) -> Self {
        self.table.insert(
            Actor::new(actor),
            roles.iter().map(|r| Role::new(*r)).collect(),
        );
        self
    }
}

impl RoleResolver for StaticRoles {
    fn roles_of(&self, actor: &Actor) -> BTreeSet<Role> {
        self.table.get(actor).cloned().unwrap_or_default()
    }
}
