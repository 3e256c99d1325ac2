//! Access decision evaluation.
//!
//! Evaluation order (first match wins):
//! 1. no actor: denied
//! 2. unknown kind name: denied, administrators included
//! 3. in-universe only: non-administrator acting in another universe: denied
//! 4. administrator: granted on every field
//! 5. table lookup for the actor's role
//!
//! Evaluation is pure and never fails; every abnormal input is a denial.

use super::grant::{AttributeFilter, Grant};
use super::model::{Actor, Permission, ResourceKind};
use super::table::PermissionTable;

/// Injectable decision function consumed by route handlers.
pub trait AccessEvaluator: Send + Sync {
    /// Role-based check independent of any universe.
    fn evaluate_global(&self, actor: Option<&Actor>, permission: Permission, kind: ResourceKind) -> Grant;

    /// Role-based check scoped to `universe_id`, which must match the
    /// universe the actor is acting within.
    fn evaluate_in_universe(
        &self,
        actor: Option<&Actor>,
        universe_id: &str,
        permission: Permission,
        kind: ResourceKind,
    ) -> Grant;

    /// Same as [`AccessEvaluator::evaluate_global`] for a raw kind name.
    fn evaluate_global_named(&self, actor: Option<&Actor>, permission: Permission, kind: &str) -> Grant {
        match ResourceKind::from_name(kind) {
            Some(k) => self.evaluate_global(actor, permission, k),
            None => Grant::denied(),
        }
    }

    /// Same as [`AccessEvaluator::evaluate_in_universe`] for a raw kind name.
    fn evaluate_in_universe_named(
        &self,
        actor: Option<&Actor>,
        universe_id: &str,
        permission: Permission,
        kind: &str,
    ) -> Grant {
        match ResourceKind::from_name(kind) {
            Some(k) => self.evaluate_in_universe(actor, universe_id, permission, k),
            None => Grant::denied(),
        }
    }
}

impl PermissionTable {
    fn decide(&self, actor: &Actor, permission: Permission, kind: ResourceKind) -> Grant {
        if actor.is_administrator() {
            return Grant::allowed(AttributeFilter::all());
        }
        match self.lookup(actor.role, kind, permission) {
            Some(attrs) => Grant::allowed(attrs.clone()),
            None => Grant::denied(),
        }
    }
}

impl AccessEvaluator for PermissionTable {
    fn evaluate_global(&self, actor: Option<&Actor>, permission: Permission, kind: ResourceKind) -> Grant {
        let Some(actor) = actor else { return Grant::denied() };
        self.decide(actor, permission, kind)
    }

    fn evaluate_in_universe(
        &self,
        actor: Option<&Actor>,
        universe_id: &str,
        permission: Permission,
        kind: ResourceKind,
    ) -> Grant {
        let Some(actor) = actor else { return Grant::denied() };
        if !actor.is_administrator() && actor.universe_id.as_deref() != Some(universe_id) {
            return Grant::denied();
        }
        self.decide(actor, permission, kind)
    }
}
