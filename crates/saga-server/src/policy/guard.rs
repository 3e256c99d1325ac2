use std::sync::Arc;

use saga_core::access::{AccessEvaluator, Actor, Grant, Permission, ResourceKind};
use saga_core::error::{Result, SagaError};

use crate::obs::metrics::ServiceMetrics;

/// The single decision call routes make before acting.
///
/// Wraps the injected evaluator and maps outcomes:
/// no actor => `Unauthenticated`, denied => `Forbidden`.
#[derive(Clone)]
pub struct Authorizer {
    evaluator: Arc<dyn AccessEvaluator>,
    metrics: Arc<ServiceMetrics>,
}

impl Authorizer {
    pub fn new(evaluator: Arc<dyn AccessEvaluator>, metrics: Arc<ServiceMetrics>) -> Self {
        Self { evaluator, metrics }
    }

    pub fn require_global(
        &self,
        actor: Option<&Actor>,
        permission: Permission,
        kind: ResourceKind,
    ) -> Result<Grant> {
        let actor = actor.ok_or(SagaError::Unauthenticated)?;
        let grant = self.evaluator.evaluate_global(Some(actor), permission, kind);
        self.finish(actor, None, permission, kind, grant)
    }

    pub fn require_in_universe(
        &self,
        actor: Option<&Actor>,
        universe_id: &str,
        permission: Permission,
        kind: ResourceKind,
    ) -> Result<Grant> {
        let actor = actor.ok_or(SagaError::Unauthenticated)?;
        let grant = self
            .evaluator
            .evaluate_in_universe(Some(actor), universe_id, permission, kind);
        self.finish(actor, Some(universe_id), permission, kind, grant)
    }

    fn finish(
        &self,
        actor: &Actor,
        universe_id: Option<&str>,
        permission: Permission,
        kind: ResourceKind,
        grant: Grant,
    ) -> Result<Grant> {
        let outcome = if grant.is_granted() { "granted" } else { "denied" };
        self.metrics
            .access_decisions
            .inc(&[("kind", kind.as_str()), ("outcome", outcome)]);

        if grant.is_granted() {
            return Ok(grant);
        }

        tracing::debug!(
            user = %actor.user_id,
            role = %actor.role,
            universe = universe_id.unwrap_or("-"),
            %permission,
            %kind,
            "access denied"
        );
        Err(SagaError::Forbidden(format!("{permission} on {kind}")))
    }
}

/// Reject write payload keys the grant does not admit.
pub fn check_writable<'a, I>(grant: &Grant, keys: I) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let denied = grant.attributes.disallowed(keys);
    if denied.is_empty() {
        return Ok(());
    }
    Err(SagaError::Forbidden(format!("fields not writable: {}", denied.join(", "))))
}
