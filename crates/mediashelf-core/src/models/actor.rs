use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Permission name that grants every permission.
pub const WILDCARD_PERMISSION: &str = "*";

/// Authenticated principal performing a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub permissions: HashSet<String>,
}

impl Actor {
    pub fn new<I, S>(id: Uuid, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id,
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    /// Actor without any permission, used for unauthenticated internal calls.
    pub fn anonymous() -> Self {
        Self {
            id: Uuid::nil(),
            permissions: HashSet::new(),
        }
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission) || self.permissions.contains(WILDCARD_PERMISSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_permission() {
        let actor = Actor::new(Uuid::new_v4(), ["vop.view"]);
        assert!(actor.has_permission("vop.view"));
        assert!(!actor.has_permission("vop.upload"));
    }

    #[test]
    fn test_wildcard_grants_everything() {
        let actor = Actor::new(Uuid::new_v4(), ["*"]);
        assert!(actor.has_permission("admin.upload"));
        assert!(!Actor::anonymous().has_permission("admin.upload"));
    }
}
