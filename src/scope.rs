use uuid::Uuid;

use crate::{auth::AuthUser, error::ApiError, models::Role};

/// Visibility scope derivation and mutation guards.
///
/// Every list/read handler passes the client's requested filters through
/// [`department_scope`] before they reach the repository, and every write
/// handler calls [`authorize_mutation`] before issuing the insert/update.
/// Both are pure functions of the principal and the request; the repository
/// applies the returned constraints verbatim.

/// department_scope
///
/// Computes the effective department constraint for a list or read query.
///
/// Rules:
/// - ADMIN: the requested `department_id` filter is honoured as-is; omitting it
///   yields an unconstrained (portal-wide) query.
/// - Every other role: the constraint is forced to the principal's own
///   department, regardless of any requested override. A non-admin principal
///   with no department on record is rejected outright rather than given an
///   unconstrained scope.
///
/// Any other explicitly supplied filter (status, creator) is outside this
/// function's concern and is ANDed with the returned constraint by the caller.
pub fn department_scope(
    user: &AuthUser,
    requested: Option<Uuid>,
) -> Result<Option<Uuid>, ApiError> {
    match user.role {
        Role::Admin => Ok(requested),
        Role::Hod | Role::Staff | Role::Student | Role::Alumni | Role::PlacementRep => {
            match user.department_id {
                Some(own) => Ok(Some(own)),
                None => Err(ApiError::Forbidden),
            }
        }
    }
}

/// authorize_mutation
///
/// Guard for create/update operations on department-owned records.
///
/// The principal's role must appear in `allowed_roles`, and unless the
/// principal is an ADMIN, the client-supplied `target_department` must equal
/// their own department. The department match is enforced here, server-side,
/// because the value arrives in an untrusted request body.
pub fn authorize_mutation(
    user: &AuthUser,
    allowed_roles: &[Role],
    target_department: Uuid,
) -> Result<(), ApiError> {
    if !allowed_roles.contains(&user.role) {
        return Err(ApiError::Forbidden);
    }
    if user.role == Role::Admin {
        return Ok(());
    }
    match user.department_id {
        Some(own) if own == target_department => Ok(()),
        _ => Err(ApiError::Forbidden),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: Role, department_id: Option<Uuid>) -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            role,
            department_id,
        }
    }

    #[test]
    fn staff_and_hod_are_pinned_to_their_own_department() {
        let own = Uuid::new_v4();
        let other = Uuid::new_v4();
        for role in [Role::Hod, Role::Staff] {
            let user = principal(role, Some(own));
            // Requested override is ignored.
            assert_eq!(department_scope(&user, Some(other)).unwrap(), Some(own));
            assert_eq!(department_scope(&user, None).unwrap(), Some(own));
        }
    }

    #[test]
    fn admin_scope_honours_the_requested_filter() {
        let requested = Uuid::new_v4();
        let admin = principal(Role::Admin, None);
        assert_eq!(
            department_scope(&admin, Some(requested)).unwrap(),
            Some(requested)
        );
        // Omitted filter means all departments.
        assert_eq!(department_scope(&admin, None).unwrap(), None);
    }

    #[test]
    fn students_alumni_and_prs_fail_closed_to_their_department() {
        let own = Uuid::new_v4();
        for role in [Role::Student, Role::Alumni, Role::PlacementRep] {
            let user = principal(role, Some(own));
            assert_eq!(
                department_scope(&user, Some(Uuid::new_v4())).unwrap(),
                Some(own)
            );
        }
    }

    #[test]
    fn non_admin_without_a_department_is_rejected() {
        let user = principal(Role::Staff, None);
        assert!(matches!(
            department_scope(&user, None),
            Err(ApiError::Forbidden)
        ));
    }

    #[test]
    fn staff_cannot_mutate_outside_their_department() {
        let own = Uuid::new_v4();
        let foreign = Uuid::new_v4();
        let staff = principal(Role::Staff, Some(own));

        assert!(authorize_mutation(&staff, Role::DEPARTMENT_MANAGERS, own).is_ok());
        assert!(matches!(
            authorize_mutation(&staff, Role::DEPARTMENT_MANAGERS, foreign),
            Err(ApiError::Forbidden)
        ));
    }

    #[test]
    fn admin_may_mutate_any_department() {
        let admin = principal(Role::Admin, None);
        assert!(authorize_mutation(&admin, Role::DEPARTMENT_MANAGERS, Uuid::new_v4()).is_ok());
    }

    #[test]
    fn role_outside_the_allowed_set_is_forbidden() {
        let dept = Uuid::new_v4();
        let student = principal(Role::Student, Some(dept));
        assert!(matches!(
            authorize_mutation(&student, Role::DEPARTMENT_MANAGERS, dept),
            Err(ApiError::Forbidden)
        ));
    }
}
