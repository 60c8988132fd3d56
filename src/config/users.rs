//! Caller identity module.
//!
//! Elevated users are listed in the `ADMIN_USER_IDS` environment variable as a
//! comma separated list. Everyone else is staff.

use crate::core::actor::{Actor, Role};
use std::collections::HashSet;

/// Parses a comma separated id list, ignoring blanks.
#[must_use]
pub fn parse_user_ids(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Gets the set of admin user ids from `ADMIN_USER_IDS`.
#[must_use]
pub fn get_admin_user_ids() -> HashSet<String> {
    std::env::var("ADMIN_USER_IDS")
        .map(|raw| parse_user_ids(&raw))
        .unwrap_or_default()
}

/// Builds the [`Actor`] for `user_id` using the configured admin list.
#[must_use]
pub fn resolve_actor(user_id: &str) -> Actor {
    actor_from(user_id, &get_admin_user_ids())
}

/// Builds the [`Actor`] for `user_id` against an explicit admin list.
#[must_use]
pub fn actor_from(user_id: &str, admins: &HashSet<String>) -> Actor {
    let role = if admins.contains(user_id) {
        Role::Admin
    } else {
        Role::Staff
    };
    Actor::new(user_id, role)
}
