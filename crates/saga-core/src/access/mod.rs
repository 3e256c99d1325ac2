//! Ownership and role based access decisions.
//!
//! A [`PermissionTable`] maps `role -> kind -> permission -> attributes` and
//! implements [`AccessEvaluator`]. Callers establish ownership themselves and
//! pick the `Own` scope only when they have verified it.

pub mod evaluator;
pub mod grant;
pub mod model;
pub mod table;

pub use evaluator::AccessEvaluator;
pub use grant::{AttributeFilter, Grant};
pub use model::{Action, Actor, Permission, ResourceKind, Role, Scope};
pub use table::{compile_rules, PermissionTable, RoleRule};
