//! Vocabulary of an access decision: who asks, what they want to do, and on
//! which kind of resource.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Caller role, as stored on the user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Administrator,
    Member,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Administrator => "administrator",
            Role::Member => "member",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of object an action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    User,
    Universe,
    Character,
    Story,
    Species,
    Population,
    Gender,
    Class,
    Item,
    BaseAttribute,
    BaseSkill,
    Image,
    Invitation,
    /// Administration pages (user management, invitations overview).
    Admin,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 14] = [
        ResourceKind::User,
        ResourceKind::Universe,
        ResourceKind::Character,
        ResourceKind::Story,
        ResourceKind::Species,
        ResourceKind::Population,
        ResourceKind::Gender,
        ResourceKind::Class,
        ResourceKind::Item,
        ResourceKind::BaseAttribute,
        ResourceKind::BaseSkill,
        ResourceKind::Image,
        ResourceKind::Invitation,
        ResourceKind::Admin,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::User => "user",
            ResourceKind::Universe => "universe",
            ResourceKind::Character => "character",
            ResourceKind::Story => "story",
            ResourceKind::Species => "species",
            ResourceKind::Population => "population",
            ResourceKind::Gender => "gender",
            ResourceKind::Class => "class",
            ResourceKind::Item => "item",
            ResourceKind::BaseAttribute => "base-attribute",
            ResourceKind::BaseSkill => "base-skill",
            ResourceKind::Image => "image",
            ResourceKind::Invitation => "invitation",
            ResourceKind::Admin => "admin",
        }
    }

    /// Look a kind up by its wire name. `None` for anything not enumerated.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.as_str() == name)
    }

    /// Kinds whose records live inside a universe.
    pub fn is_universe_scoped(self) -> bool {
        matches!(
            self,
            ResourceKind::Character
                | ResourceKind::Story
                | ResourceKind::Species
                | ResourceKind::Population
                | ResourceKind::Gender
                | ResourceKind::Class
                | ResourceKind::Item
                | ResourceKind::BaseAttribute
                | ResourceKind::BaseSkill
        )
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Create, Action::Read, Action::Update, Action::Delete];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

/// `Own` limits the action to resources the actor owns; `Any` does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Own,
    Any,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Own => "Own",
            Scope::Any => "Any",
        }
    }
}

/// An action qualified by scope, written `createOwn`, `readAny`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Permission {
    pub action: Action,
    pub scope: Scope,
}

impl Permission {
    pub const ALL: [Permission; 8] = [
        Permission::new(Action::Create, Scope::Own),
        Permission::new(Action::Create, Scope::Any),
        Permission::new(Action::Read, Scope::Own),
        Permission::new(Action::Read, Scope::Any),
        Permission::new(Action::Update, Scope::Own),
        Permission::new(Action::Update, Scope::Any),
        Permission::new(Action::Delete, Scope::Own),
        Permission::new(Action::Delete, Scope::Any),
    ];

    pub const fn new(action: Action, scope: Scope) -> Self {
        Self { action, scope }
    }

    pub const fn own(action: Action) -> Self {
        Self::new(action, Scope::Own)
    }

    pub const fn any(action: Action) -> Self {
        Self::new(action, Scope::Any)
    }

    /// `Own` when the caller has verified ownership, `Any` otherwise.
    pub const fn for_owner(action: Action, is_owner: bool) -> Self {
        if is_owner {
            Self::own(action)
        } else {
            Self::any(action)
        }
    }

    /// Parse the camel-case form (`updateOwn`).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.to_string() == name)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.action.as_str(), self.scope.as_str())
    }
}

/// Caller identity resolved from the session for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: String,
    pub role: Role,
    /// Universe the caller is currently acting within, if any.
    pub universe_id: Option<String>,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
            universe_id: None,
        }
    }

    pub fn in_universe(mut self, universe_id: impl Into<String>) -> Self {
        self.universe_id = Some(universe_id.into());
        self
    }

    pub fn is_administrator(&self) -> bool {
        self.role == Role::Administrator
    }

    pub fn owns(&self, owner_id: &str) -> bool {
        self.user_id == owner_id
    }
}
