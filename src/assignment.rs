use crate::persistence::{PersistenceResult, UserStore};
use crate::project::{TalentAssignments, TalentRole};
use tracing::{debug, warn};

/// Pick the user responsible for `role`: the project's explicit choice when that user
/// exists, otherwise the only user holding the role, otherwise nobody.
pub fn resolve_assignee<U: UserStore + ?Sized>(
    users: &U,
    talent: &TalentAssignments,
    role: TalentRole,
) -> PersistenceResult<Option<i32>> {
    if let Some(user_id) = talent.for_role(role) {
        if users.get_user(user_id)?.is_some() {
            return Ok(Some(user_id));
        }
        warn!(user_id, %role, "assigned talent does not exist; falling back to role lookup");
    }

    let candidates = users.users_by_role(role)?;
    match candidates.as_slice() {
        [only] => Ok(Some(only.id)),
        [] => Ok(None),
        _ => {
            debug!(%role, candidates = candidates.len(), "several users hold role; leaving unassigned");
            Ok(None)
        }
    }
}
