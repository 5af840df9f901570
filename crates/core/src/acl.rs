//! Declarative role-based permission table.
//!
//! Every data mapper registers, at construction, which [`AuthLevel`]s may
//! invoke each of its actions. The authorization service consults the
//! registry through [`AclRegistry::can`]; nothing here decides who the
//! caller is.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;

use crate::error::CoreError;
use crate::roles::AuthLevel;

/// Extra check run when a role holds the capability, e.g. "only your own
/// registration".
pub type RolePredicate = Arc<dyn Fn(Option<&Value>) -> bool + Send + Sync>;

/// A named set of capabilities, optionally gated by a predicate and
/// optionally inheriting the capabilities of other roles.
#[derive(Clone)]
pub struct Role {
    name: String,
    capability: BTreeSet<String>,
    action: Option<RolePredicate>,
    inherits: Option<BTreeSet<String>>,
}

impl Role {
    pub fn new<I, S>(
        name: impl Into<String>,
        capability: I,
        action: Option<RolePredicate>,
        inherits: Option<Vec<String>>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            capability: capability.into_iter().map(Into::into).collect(),
            action,
            inherits: inherits.map(|names| names.into_iter().collect()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capability(&self) -> &BTreeSet<String> {
        &self.capability
    }

    pub fn inherits(&self) -> Option<&BTreeSet<String>> {
        self.inherits.as_ref()
    }

    /// Union capabilities and inherited roles. The existing predicate is
    /// kept; predicates are never merged.
    pub fn merge(&mut self, other: Role) -> Result<(), CoreError> {
        if self.name != other.name {
            return Err(CoreError::Internal(format!(
                "cannot merge role {} into {}",
                other.name, self.name
            )));
        }
        self.absorb(other);
        Ok(())
    }

    fn absorb(&mut self, other: Role) {
        self.capability.extend(other.capability);
        self.inherits = match (self.inherits.take(), other.inherits) {
            (None, None) => None,
            (mine, theirs) => {
                let mut merged = mine.unwrap_or_default();
                merged.extend(theirs.unwrap_or_default());
                Some(merged)
            }
        };
    }
}

impl fmt::Debug for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Role")
            .field("name", &self.name)
            .field("capability", &self.capability)
            .field("action", &self.action.as_ref().map(|_| "<predicate>"))
            .field("inherits", &self.inherits)
            .finish()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let caps: Vec<&str> = self.capability.iter().map(String::as_str).collect();
        write!(f, "{}: [{}]", self.name, caps.join(", "))?;
        if let Some(inherits) = &self.inherits {
            let names: Vec<&str> = inherits.iter().map(String::as_str).collect();
            write!(f, " inherits [{}]", names.join(", "))?;
        }
        Ok(())
    }
}

/// The permission table shared by every mapper in the process.
pub trait AclRegistry: Send + Sync {
    /// Register a role, merging into an existing role of the same name.
    fn register_rbac(&self, role: Role);

    /// Whether `role` (or any role it inherits) may perform `operation`.
    fn can(&self, role: &str, operation: &str, params: Option<&Value>) -> bool;

    /// One-line summary of every registered role.
    fn debug_information(&self) -> String;
}

/// In-memory [`AclRegistry`]. Written during mapper construction and read
/// afterwards.
#[derive(Debug, Default)]
pub struct Rbac {
    roles: RwLock<HashMap<String, Role>>,
}

impl Rbac {
    pub fn new() -> Self {
        Self::default()
    }

    fn can_inner(
        roles: &HashMap<String, Role>,
        role: &str,
        operation: &str,
        params: Option<&Value>,
        visited: &mut HashSet<String>,
    ) -> bool {
        if !visited.insert(role.to_string()) {
            return false;
        }
        let Some(registered) = roles.get(role) else {
            return false;
        };
        if registered.capability.contains(operation) {
            return match &registered.action {
                Some(predicate) => predicate(params),
                None => true,
            };
        }
        registered.inherits.as_ref().is_some_and(|inherits| {
            inherits
                .iter()
                .any(|parent| Self::can_inner(roles, parent, operation, params, visited))
        })
    }
}

impl AclRegistry for Rbac {
    fn register_rbac(&self, role: Role) {
        let mut roles = self.roles.write().unwrap_or_else(PoisonError::into_inner);
        match roles.get_mut(role.name()) {
            // Keyed by name, so the names already match.
            Some(existing) => existing.absorb(role),
            None => {
                roles.insert(role.name.clone(), role);
            }
        }
    }

    fn can(&self, role: &str, operation: &str, params: Option<&Value>) -> bool {
        let roles = self.roles.read().unwrap_or_else(PoisonError::into_inner);
        Self::can_inner(&roles, role, operation, params, &mut HashSet::new())
    }

    fn debug_information(&self) -> String {
        let roles = self.roles.read().unwrap_or_else(PoisonError::into_inner);
        let mut lines: Vec<String> = roles.values().map(ToString::to_string).collect();
        lines.sort();
        lines.join(" | ")
    }
}

/// Register `capabilities` for each of `levels`, optionally gated by
/// `action` and inheriting `inherits`.
pub fn add_rbac(
    acl: &dyn AclRegistry,
    capabilities: &[&str],
    levels: &[AuthLevel],
    action: Option<RolePredicate>,
    inherits: &[AuthLevel],
) {
    let inherits: Option<Vec<String>> = if inherits.is_empty() {
        None
    } else {
        Some(inherits.iter().map(|level| level.as_str().to_string()).collect())
    };
    for level in levels {
        acl.register_rbac(Role::new(
            level.as_str(),
            capabilities.iter().copied(),
            action.clone(),
            inherits.clone(),
        ));
    }
}

/// Actions a mapper may expose to the authorization layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AclOperation {
    Create,
    Read,
    ReadAll,
    Update,
    Delete,
    Count,
    MakeActive,
    SendEmail,
    GetEmail,
    ReducePermission,
    ReadAllClasses,
    ReadByUid,
    ReadByClass,
    CheckIn,
}

/// Maps an [`AclOperation`] to the mapper-scoped action name, or `None`
/// if the mapper does not expose it.
pub trait AclPerm {
    fn permission(&self, operation: AclOperation) -> Option<&'static str>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- registration --

    #[test]
    fn add_rbac_registers_every_level() {
        let acl = Rbac::new();
        add_rbac(
            &acl,
            &["category:read", "category:readall"],
            &[AuthLevel::TeamMember, AuthLevel::Director],
            None,
            &[],
        );
        assert!(acl.can("TEAM_MEMBER", "category:read", None));
        assert!(acl.can("DIRECTOR", "category:readall", None));
        assert!(!acl.can("PARTICIPANT", "category:read", None));
    }

    #[test]
    fn repeated_registration_merges() {
        let acl = Rbac::new();
        add_rbac(&acl, &["event:read"], &[AuthLevel::Participant], None, &[]);
        add_rbac(
            &acl,
            &["event:create"],
            &[AuthLevel::Participant],
            None,
            &[AuthLevel::Volunteer],
        );
        assert!(acl.can("PARTICIPANT", "event:read", None));
        assert!(acl.can("PARTICIPANT", "event:create", None));
        assert_eq!(
            acl.debug_information(),
            "PARTICIPANT: [event:create, event:read] inherits [VOLUNTEER]"
        );
    }

    #[test]
    fn re_registering_a_role_unions_inherits() {
        let acl = Rbac::new();
        acl.register_rbac(Role::new("DIRECTOR", ["a"], None, Some(vec!["TEAM_MEMBER".into()])));
        acl.register_rbac(Role::new("DIRECTOR", ["b"], None, Some(vec!["VOLUNTEER".into()])));
        acl.register_rbac(Role::new("TEAM_MEMBER", ["tm"], None, None));
        acl.register_rbac(Role::new("VOLUNTEER", ["v"], None, None));
        assert!(acl.can("DIRECTOR", "a", None));
        assert!(acl.can("DIRECTOR", "b", None));
        assert!(acl.can("DIRECTOR", "tm", None));
        assert!(acl.can("DIRECTOR", "v", None));
    }

    #[test]
    fn merge_rejects_different_names() {
        let mut a = Role::new("A", ["x"], None, None);
        let b = Role::new("B", ["y"], None, None);
        assert!(a.merge(b).is_err());
    }

    // -- inheritance --

    #[test]
    fn inherited_role_grants_capability() {
        let acl = Rbac::new();
        add_rbac(&acl, &["rsvp:read"], &[AuthLevel::Volunteer], None, &[]);
        add_rbac(
            &acl,
            &["rsvp:create"],
            &[AuthLevel::TeamMember],
            None,
            &[AuthLevel::Volunteer],
        );
        assert!(acl.can("TEAM_MEMBER", "rsvp:read", None));
        assert!(!acl.can("VOLUNTEER", "rsvp:create", None));
    }

    #[test]
    fn inheritance_cycles_terminate() {
        let acl = Rbac::new();
        acl.register_rbac(Role::new("A", ["a"], None, Some(vec!["B".into()])));
        acl.register_rbac(Role::new("B", ["b"], None, Some(vec!["A".into()])));
        assert!(acl.can("A", "b", None));
        assert!(!acl.can("A", "c", None));
    }

    // -- predicates --

    #[test]
    fn predicate_gates_capability() {
        let acl = Rbac::new();
        let self_only: RolePredicate = Arc::new(|params| {
            params.is_some_and(|p| p["user"] == p["owner"])
        });
        add_rbac(
            &acl,
            &["registration:read"],
            &[AuthLevel::Participant],
            Some(self_only),
            &[],
        );
        let mine = serde_json::json!({"user": "u1", "owner": "u1"});
        let theirs = serde_json::json!({"user": "u1", "owner": "u2"});
        assert!(acl.can("PARTICIPANT", "registration:read", Some(&mine)));
        assert!(!acl.can("PARTICIPANT", "registration:read", Some(&theirs)));
        assert!(!acl.can("PARTICIPANT", "registration:read", None));
    }
}
