//! In-memory data store for users, universes, universe-scoped records and
//! invitations.
//!
//! Pure data access: no authorization happens here. Route handlers load,
//! then decide, then mutate.

pub mod model;

use chrono::Utc;
use dashmap::{mapref::entry::Entry, DashMap};
use serde_json::{Map, Value};
use uuid::Uuid;

use saga_core::access::{ResourceKind, Role};
use saga_core::error::{Result, SagaError};

pub use model::{to_value, Invitation, Record, Universe, UserRecord};

#[derive(Default)]
pub struct Store {
    users: DashMap<String, UserRecord>,
    /// email_key -> user_id
    user_emails: DashMap<String, String>,
    universes: DashMap<String, Universe>,
    records: DashMap<String, Record>,
    /// Keyed by email_key: one pending invitation per address.
    invitations: DashMap<String, Invitation>,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn email_key(email: &str) -> String {
    email.to_ascii_lowercase()
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    // --------------------
    // Users
    // --------------------
    pub fn insert_user(&self, user: UserRecord) -> Result<()> {
        if self.users.contains_key(&user.id) {
            return Err(SagaError::Conflict(format!("user exists: {}", user.id)));
        }
        self.claim_email(&user.id, &user.email)?;
        self.users.insert(user.id.clone(), user);
        Ok(())
    }

    pub fn user(&self, id: &str) -> Option<UserRecord> {
        self.users.get(id).map(|r| r.value().clone())
    }

    pub fn users(&self) -> Vec<UserRecord> {
        let mut out: Vec<_> = self.users.iter().map(|r| r.value().clone()).collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }

    /// Apply `f` to the user. A new `email` is reserved before anything is
    /// written, so a conflict leaves the user untouched.
    pub fn update_user(
        &self,
        id: &str,
        email: Option<String>,
        f: impl FnOnce(&mut UserRecord),
    ) -> Result<UserRecord> {
        if let Some(e) = &email {
            self.claim_email(id, e)?;
        }
        let Some(mut entry) = self.users.get_mut(id) else {
            if let Some(e) = &email {
                self.release_email(id, e);
            }
            return Err(SagaError::NotFound(format!("user {id}")));
        };
        let u = entry.value_mut();
        f(u);
        if let Some(e) = email {
            if !u.email.eq_ignore_ascii_case(&e) {
                self.release_email(id, &u.email);
            }
            u.email = e;
        }
        Ok(u.clone())
    }

    pub fn remove_user(&self, id: &str) -> Option<UserRecord> {
        let (_, u) = self.users.remove(id)?;
        self.release_email(id, &u.email);
        Some(u)
    }

    pub fn email_taken(&self, email: &str) -> bool {
        self.user_emails.contains_key(&email_key(email))
    }

    fn claim_email(&self, id: &str, email: &str) -> Result<()> {
        match self.user_emails.entry(email_key(email)) {
            Entry::Occupied(e) if e.get() != id => {
                Err(SagaError::Conflict(format!("email in use: {email}")))
            }
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(e) => {
                e.insert(id.to_string());
                Ok(())
            }
        }
    }

    fn release_email(&self, id: &str, email: &str) {
        self.user_emails.remove_if(&email_key(email), |_, owner| owner == id);
    }

    // --------------------
    // Universes
    // --------------------
    pub fn create_universe(&self, owner_id: &str, name: String, description: Option<String>) -> Universe {
        let now = Utc::now();
        let u = Universe {
            id: new_id(),
            name,
            description,
            owner_id: owner_id.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.universes.insert(u.id.clone(), u.clone());
        u
    }

    pub fn insert_universe(&self, universe: Universe) -> Result<()> {
        if self.universes.contains_key(&universe.id) {
            return Err(SagaError::Conflict(format!("universe exists: {}", universe.id)));
        }
        self.universes.insert(universe.id.clone(), universe);
        Ok(())
    }

    pub fn universe(&self, id: &str) -> Option<Universe> {
        self.universes.get(id).map(|r| r.value().clone())
    }

    pub fn universes(&self) -> Vec<Universe> {
        let mut out: Vec<_> = self.universes.iter().map(|r| r.value().clone()).collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        out
    }

    pub fn update_universe(
        &self,
        id: &str,
        name: Option<String>,
        description: Option<String>,
    ) -> Option<Universe> {
        let mut entry = self.universes.get_mut(id)?;
        let u = entry.value_mut();
        if let Some(n) = name {
            u.name = n;
        }
        if description.is_some() {
            u.description = description;
        }
        u.updated_at = Utc::now();
        Some(u.clone())
    }

    /// Removes the universe and every record inside it.
    pub fn remove_universe(&self, id: &str) -> Option<Universe> {
        let (_, u) = self.universes.remove(id)?;
        self.records.retain(|_, r| r.universe_id != id);
        Some(u)
    }

    // --------------------
    // Universe-scoped records
    // --------------------
    pub fn create_record(
        &self,
        universe_id: &str,
        kind: ResourceKind,
        owner_id: &str,
        fields: Map<String, Value>,
    ) -> Record {
        let now = Utc::now();
        let r = Record {
            id: new_id(),
            universe_id: universe_id.to_string(),
            kind,
            owner_id: owner_id.to_string(),
            fields,
            created_at: now,
            updated_at: now,
        };
        self.records.insert(r.id.clone(), r.clone());
        r
    }

    /// Lookup restricted to the given universe and kind.
    pub fn record(&self, universe_id: &str, kind: ResourceKind, id: &str) -> Option<Record> {
        self.records
            .get(id)
            .filter(|r| r.universe_id == universe_id && r.kind == kind)
            .map(|r| r.value().clone())
    }

    pub fn records(&self, universe_id: &str, kind: ResourceKind) -> Vec<Record> {
        let mut out: Vec<_> = self
            .records
            .iter()
            .filter(|r| r.universe_id == universe_id && r.kind == kind)
            .map(|r| r.value().clone())
            .collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        out
    }

    /// Merge `fields` into the record; `null` values remove a field.
    pub fn update_record(
        &self,
        universe_id: &str,
        kind: ResourceKind,
        id: &str,
        fields: Map<String, Value>,
    ) -> Option<Record> {
        let mut entry = self
            .records
            .get_mut(id)
            .filter(|r| r.universe_id == universe_id && r.kind == kind)?;
        let r = entry.value_mut();
        for (k, v) in fields {
            if v.is_null() {
                r.fields.remove(&k);
            } else {
                r.fields.insert(k, v);
            }
        }
        r.updated_at = Utc::now();
        Some(r.clone())
    }

    pub fn remove_record(&self, universe_id: &str, kind: ResourceKind, id: &str) -> Option<Record> {
        self.record(universe_id, kind, id)?;
        self.records.remove(id).map(|(_, r)| r)
    }

    // --------------------
    // Invitations
    // --------------------
    pub fn create_invitation(&self, email: String, role: Role, invited_by: &str) -> Result<Invitation> {
        if self.email_taken(&email) {
            return Err(SagaError::Conflict(format!("user already registered: {email}")));
        }
        match self.invitations.entry(email_key(&email)) {
            Entry::Occupied(_) => Err(SagaError::Conflict(format!("invitation already pending: {email}"))),
            Entry::Vacant(slot) => {
                let inv = Invitation {
                    id: new_id(),
                    email,
                    role,
                    invited_by: invited_by.to_string(),
                    token: new_id(),
                    created_at: Utc::now(),
                };
                slot.insert(inv.clone());
                Ok(inv)
            }
        }
    }

    pub fn invitations(&self) -> Vec<Invitation> {
        let mut out: Vec<_> = self.invitations.iter().map(|r| r.value().clone()).collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        out
    }
}
