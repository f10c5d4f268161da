//! Role-based permission matrix.
//!
//! Every predicate is a total, pure function of its inputs. Roles are matched
//! exhaustively so adding a role is a compile error until it is placed here.

use super::{Role, UserId};

#[must_use]
pub const fn can_create_issue(role: Role) -> bool {
    match role {
        Role::Admin | Role::Maintainer | Role::Reporter => true,
    }
}

#[must_use]
pub const fn can_view_all_issues(role: Role) -> bool {
    match role {
        Role::Admin | Role::Maintainer => true,
        Role::Reporter => false,
    }
}

/// Staff see everything; everyone else only what they reported.
#[must_use]
pub fn can_view_issue(role: Role, owner: UserId, actor: UserId) -> bool {
    can_view_all_issues(role) || owner == actor
}

#[must_use]
pub fn can_edit_issue(role: Role, owner: UserId, actor: UserId) -> bool {
    can_view_all_issues(role) || owner == actor
}

/// Reporters may still delete their own issues; that check lives at the call site.
#[must_use]
pub const fn can_delete_any_issue(role: Role) -> bool {
    match role {
        Role::Admin => true,
        Role::Maintainer | Role::Reporter => false,
    }
}

#[must_use]
pub const fn can_assign_issues(role: Role) -> bool {
    match role {
        Role::Admin | Role::Maintainer => true,
        Role::Reporter => false,
    }
}

#[must_use]
pub const fn can_manage_users(role: Role) -> bool {
    match role {
        Role::Admin => true,
        Role::Maintainer | Role::Reporter => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: UserId = UserId::new(1);
    const STRANGER: UserId = UserId::new(2);

    #[test]
    fn view_issue_matrix_is_exhaustive() {
        for role in Role::ALL {
            for (actor, is_owner) in [(OWNER, true), (STRANGER, false)] {
                let expected = matches!(role, Role::Admin | Role::Maintainer) || is_owner;
                assert_eq!(
                    can_view_issue(role, OWNER, actor),
                    expected,
                    "role={role} owner={is_owner}"
                );
                assert_eq!(can_edit_issue(role, OWNER, actor), expected);
            }
        }
    }

    #[test]
    fn every_role_can_create() {
        assert!(Role::ALL.into_iter().all(can_create_issue));
    }

    #[test]
    fn admin_only_rights() {
        assert!(can_delete_any_issue(Role::Admin));
        assert!(!can_delete_any_issue(Role::Maintainer));
        assert!(!can_delete_any_issue(Role::Reporter));

        assert!(can_manage_users(Role::Admin));
        assert!(!can_manage_users(Role::Maintainer));
        assert!(!can_manage_users(Role::Reporter));
    }

    #[test]
    fn staff_rights() {
        for role in [Role::Admin, Role::Maintainer] {
            assert!(can_view_all_issues(role));
            assert!(can_assign_issues(role));
        }
        assert!(!can_view_all_issues(Role::Reporter));
        assert!(!can_assign_issues(Role::Reporter));
    }
}
