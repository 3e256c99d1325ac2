//! Role permission table and rule compilation.
//!
//! Rules use the form `kind:permission[:attributes]`, for example
//! `character:updateOwn` or `user:readOwn:*,!password_hash`. A permission of
//! `*` expands to all eight permissions. Rules without attributes admit every
//! field.

use std::collections::HashMap;

use crate::error::{Result, SagaError};

use super::grant::AttributeFilter;
use super::model::{Action, Permission, ResourceKind, Role};

/// One compiled allowance for a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRule {
    pub kind: ResourceKind,
    pub permission: Permission,
    pub attributes: AttributeFilter,
}

pub fn compile_rules(raw: &[String]) -> Result<Vec<RoleRule>> {
    let mut out = Vec::with_capacity(raw.len());
    for s in raw {
        let mut parts = s.splitn(3, ':');
        let kind_s = parts.next().unwrap_or_default();
        let perm_s = parts.next().ok_or_else(|| {
            SagaError::BadRequest(format!("invalid access rule: {s} (expected kind:permission)"))
        })?;

        let kind = ResourceKind::from_name(kind_s)
            .ok_or_else(|| SagaError::BadRequest(format!("unknown resource kind in rule: {kind_s}")))?;

        let attributes = match parts.next() {
            Some(a) => AttributeFilter::parse(a)?,
            None => AttributeFilter::all(),
        };

        if perm_s == "*" {
            out.extend(Permission::ALL.iter().map(|&permission| RoleRule {
                kind,
                permission,
                attributes: attributes.clone(),
            }));
            continue;
        }

        let permission = Permission::from_name(perm_s)
            .ok_or_else(|| SagaError::BadRequest(format!("unknown permission in rule: {perm_s}")))?;
        out.push(RoleRule { kind, permission, attributes });
    }
    Ok(out)
}

type KindTable = HashMap<ResourceKind, HashMap<Permission, AttributeFilter>>;

/// `role -> kind -> permission -> attributes`. Absence means denied.
///
/// Administrators are not listed; they are granted by a wildcard ahead of the
/// lookup (see [`super::evaluator`]). Build once at startup and share via Arc.
#[derive(Debug, Clone, Default)]
pub struct PermissionTable {
    roles: HashMap<Role, KindTable>,
}

const USER_PUBLIC: &[&str] = &["id", "name", "role"];
const USER_SELF_READ: &[&str] = &["*", "!password_hash"];
const USER_SELF_WRITE: &[&str] = &["*", "!role", "!password_hash"];
const ALL_FIELDS: &[&str] = &["*"];

const AUTHORED: [(Action, bool); 4] = [
    (Action::Create, true),
    (Action::Read, false),
    (Action::Update, true),
    (Action::Delete, true),
];

impl PermissionTable {
    /// Built-in allowances for `member`.
    pub fn builtin() -> Self {
        let mut rules = Vec::new();

        let authored_kinds = ResourceKind::ALL
            .iter()
            .copied()
            .filter(|k| k.is_universe_scoped() || *k == ResourceKind::Universe);
        for kind in authored_kinds {
            for (action, own) in AUTHORED {
                rules.push(rule(kind, Permission::for_owner(action, own), ALL_FIELDS));
            }
        }

        rules.push(rule(ResourceKind::Image, Permission::own(Action::Create), ALL_FIELDS));
        rules.push(rule(ResourceKind::Image, Permission::any(Action::Read), ALL_FIELDS));
        rules.push(rule(ResourceKind::Image, Permission::own(Action::Delete), ALL_FIELDS));

        rules.push(rule(ResourceKind::User, Permission::any(Action::Read), USER_PUBLIC));
        rules.push(rule(ResourceKind::User, Permission::own(Action::Read), USER_SELF_READ));
        rules.push(rule(ResourceKind::User, Permission::own(Action::Update), USER_SELF_WRITE));

        Self::from_member_rules(rules)
    }

    pub fn from_member_rules(rules: Vec<RoleRule>) -> Self {
        let mut table = Self::default();
        let kinds = table.roles.entry(Role::Member).or_default();
        for r in rules {
            kinds.entry(r.kind).or_default().insert(r.permission, r.attributes);
        }
        table
    }

    /// Compile `access.member` rules from config.
    pub fn from_member_config(raw: &[String]) -> Result<Self> {
        Ok(Self::from_member_rules(compile_rules(raw)?))
    }

    /// Direct table lookup, no wildcard. An `Own` request falls back to the
    /// `Any` entry of the same action.
    pub fn lookup(&self, role: Role, kind: ResourceKind, permission: Permission) -> Option<&AttributeFilter> {
        let perms = self.roles.get(&role)?.get(&kind)?;
        perms
            .get(&permission)
            .or_else(|| perms.get(&Permission::any(permission.action)))
    }

    /// Number of (role, kind, permission) entries.
    pub fn len(&self) -> usize {
        self.roles.values().flat_map(|k| k.values()).map(|p| p.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn rule(kind: ResourceKind, permission: Permission, attrs: &[&str]) -> RoleRule {
    RoleRule {
        kind,
        permission,
        attributes: AttributeFilter::from_entries(attrs.iter().copied()),
    }
}
