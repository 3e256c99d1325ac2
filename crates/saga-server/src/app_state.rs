//! Shared application state for the SAGA service.
//!
//! Startup errors are explicit (`Result` instead of panic).

use std::sync::Arc;

use chrono::Utc;

use saga_core::access::{AccessEvaluator, PermissionTable};
use saga_core::error::Result;

use crate::config::ServiceConfig;
use crate::context::{InMemorySessionStore, SessionStore};
use crate::obs::metrics::ServiceMetrics;
use crate::policy::Authorizer;
use crate::store::{Store, Universe, UserRecord};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: ServiceConfig,
    authorizer: Authorizer,
    sessions: Arc<dyn SessionStore>,
    store: Store,
    metrics: Arc<ServiceMetrics>,
}

impl AppState {
    /// Build state with the permission table described by `cfg`.
    pub fn new(cfg: ServiceConfig) -> Result<Self> {
        let table = match &cfg.access {
            Some(access) => {
                let t = PermissionTable::from_member_config(&access.member)?;
                tracing::info!(entries = t.len(), "member permission table loaded from config");
                t
            }
            None => PermissionTable::builtin(),
        };
        Self::with_evaluator(cfg, Arc::new(table))
    }

    /// Build state around an injected evaluator.
    pub fn with_evaluator(cfg: ServiceConfig, evaluator: Arc<dyn AccessEvaluator>) -> Result<Self> {
        let store = Store::new();
        for u in &cfg.users {
            store.insert_user(UserRecord {
                id: u.id.clone(),
                name: u.name.clone(),
                email: u.email.clone(),
                role: u.role,
                image: None,
                password_hash: u.password_hash.clone(),
                created_at: Utc::now(),
            })?;
        }

        for u in &cfg.universes {
            let now = Utc::now();
            store.insert_universe(Universe {
                id: u.id.clone(),
                name: u.name.clone(),
                description: u.description.clone(),
                owner_id: u.owner_id.clone(),
                created_at: now,
                updated_at: now,
            })?;
        }

        let sessions = Arc::new(InMemorySessionStore::from_seeds(&cfg.sessions));
        let metrics = Arc::new(ServiceMetrics::default());
        let authorizer = Authorizer::new(evaluator, Arc::clone(&metrics));

        Ok(Self {
            inner: Arc::new(AppStateInner { cfg, authorizer, sessions, store, metrics }),
        })
    }

    pub fn cfg(&self) -> &ServiceConfig {
        &self.inner.cfg
    }

    pub fn authorizer(&self) -> &Authorizer {
        &self.inner.authorizer
    }

    pub fn sessions(&self) -> &dyn SessionStore {
        self.inner.sessions.as_ref()
    }

    pub fn store(&self) -> &Store {
        &self.inner.store
    }

    pub fn metrics(&self) -> &ServiceMetrics {
        &self.inner.metrics
    }

    pub fn is_draining(&self) -> bool {
        self.inner.metrics.is_draining()
    }

    pub fn set_draining(&self) {
        self.inner.metrics.set_draining();
    }

    /// Gauges computed at scrape time.
    pub fn metrics_extra(&self) -> Vec<(&'static str, u64)> {
        let s = self.store();
        vec![
            ("saga_users", s.users().len() as u64),
            ("saga_universes", s.universes().len() as u64),
        ]
    }
}
