//! Permission checks against an actor and the owning entity.

use mediashelf_core::{Actor, AppError, OwnerRef};

pub trait AccessGate: Send + Sync {
    /// Whether `actor` holds `permission` on `resource`.
    fn allows(&self, permission: &str, actor: &Actor, resource: &OwnerRef) -> bool;

    fn authorize(&self, permission: &str, actor: &Actor, resource: &OwnerRef) -> Result<(), AppError> {
        if self.allows(permission, actor, resource) {
            return Ok(());
        }

        tracing::debug!(
            permission = %permission,
            actor = %actor.id,
            resource = %resource,
            "Permission denied"
        );
        Err(AppError::PermissionDenied(permission.to_string()))
    }
}

/// Grants a permission when the actor's permission set contains it.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionGate;

impl AccessGate for PermissionGate {
    fn allows(&self, permission: &str, actor: &Actor, _resource: &OwnerRef) -> bool {
        actor.has_permission(permission)
    }
}

/// Run the check only when the policy names a permission.
pub fn authorize_optional(
    gate: &dyn AccessGate,
    permission: Option<&str>,
    actor: &Actor,
    resource: &OwnerRef,
) -> Result<(), AppError> {
    match permission {
        Some(permission) => gate.authorize(permission, actor, resource),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_permission_gate() {
        let owner = OwnerRef::new("post", Uuid::new_v4());
        let viewer = Actor::new(Uuid::new_v4(), ["vop.view"]);
        let stranger = Actor::new(Uuid::new_v4(), Vec::<String>::new());

        assert!(PermissionGate.authorize("vop.view", &viewer, &owner).is_ok());
        assert!(matches!(
            PermissionGate.authorize("vop.view", &stranger, &owner),
            Err(AppError::PermissionDenied(p)) if p == "vop.view"
        ));
    }

    #[test]
    fn test_unset_permission_skips_the_gate() {
        struct DenyAll;
        impl AccessGate for DenyAll {
            fn allows(&self, _: &str, _: &Actor, _: &OwnerRef) -> bool {
                false
            }
        }

        let owner = OwnerRef::new("post", Uuid::new_v4());
        let actor = Actor::anonymous();
        assert!(authorize_optional(&DenyAll, None, &actor, &owner).is_ok());
        assert!(authorize_optional(&DenyAll, Some("vop.view"), &actor, &owner).is_err());
    }
}
