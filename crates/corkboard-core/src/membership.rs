// SPDX-License-Identifier: Apache-2.0

//! Workspace role hierarchy and the membership authority decision.
//!
//! Every privileged operation funnels through [`authorize`]: the caller
//! resolves the membership row for the acting user from the store and this
//! module decides, from that row alone, whether the operation proceeds.
//! Client-supplied role claims never reach this function.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::UserId;

/// Ordered permission levels. The derive order matters: `guest < member <
/// admin < owner`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Guest,
    Member,
    Admin,
    Owner,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Guest => "guest",
            Self::Member => "member",
            Self::Admin => "admin",
            Self::Owner => "owner",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "guest" => Some(Self::Guest),
            "member" => Some(Self::Member),
            "admin" => Some(Self::Admin),
            "owner" => Some(Self::Owner),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Denied {
    /// No membership row exists for the (user, workspace) pair.
    NotAMember,
    /// A membership exists but its rank is below the required role.
    InsufficientRole { granted: Role, required: Role },
    /// A member attempted to remove their own membership via the kick path.
    SelfRemoval,
}

impl fmt::Display for Denied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAMember => f.write_str("not a member of this workspace"),
            Self::InsufficientRole { granted, required } => {
                write!(f, "role {granted} does not satisfy required role {required}")
            }
            Self::SelfRemoval => f.write_str("cannot remove own membership"),
        }
    }
}

impl std::error::Error for Denied {}

/// Grant iff a membership exists and its rank is at least `required`.
///
/// `membership` is the role freshly resolved from the store for the acting
/// user, `None` when no row exists.
pub fn authorize(membership: Option<Role>, required: Role) -> Result<Role, Denied> {
    let granted = membership.ok_or(Denied::NotAMember)?;
    if granted >= required {
        Ok(granted)
    } else {
        Err(Denied::InsufficientRole { granted, required })
    }
}

/// The member-removal ("kick") decision: requires admin rank and rejects
/// removal of the actor's own membership through this path.
pub fn authorize_kick(
    actor: &UserId,
    membership: Option<Role>,
    target: &UserId,
) -> Result<Role, Denied> {
    let granted = authorize(membership, Role::Admin)?;
    if actor == target {
        return Err(Denied::SelfRemoval);
    }
    Ok(granted)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Role; 4] = [Role::Guest, Role::Member, Role::Admin, Role::Owner];

    #[test]
    fn hierarchy_is_totally_ordered() {
        assert!(Role::Guest < Role::Member);
        assert!(Role::Member < Role::Admin);
        assert!(Role::Admin < Role::Owner);
    }

    #[test]
    fn grant_iff_rank_at_least_required() {
        for granted in ALL {
            for required in ALL {
                let decision = authorize(Some(granted), required);
                if granted >= required {
                    assert_eq!(decision, Ok(granted));
                } else {
                    assert_eq!(
                        decision,
                        Err(Denied::InsufficientRole { granted, required })
                    );
                }
            }
        }
    }

    #[test]
    fn absence_is_denied_before_rank_is_considered() {
        for required in ALL {
            assert_eq!(authorize(None, required), Err(Denied::NotAMember));
        }
    }

    #[test]
    fn kick_requires_admin_and_rejects_self() {
        let actor = UserId::mint();
        let target = UserId::mint();
        assert_eq!(
            authorize_kick(&actor, Some(Role::Member), &target),
            Err(Denied::InsufficientRole {
                granted: Role::Member,
                required: Role::Admin
            })
        );
        assert_eq!(
            authorize_kick(&actor, Some(Role::Admin), &target),
            Ok(Role::Admin)
        );
        assert_eq!(
            authorize_kick(&actor, Some(Role::Owner), &actor),
            Err(Denied::SelfRemoval)
        );
    }

    #[test]
    fn role_strings_round_trip() {
        for role in ALL {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("superuser"), None);
    }
}
