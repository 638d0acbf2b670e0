//! The single visibility/authorization policy.
//!
//! Every role check on projects and their private records goes
//! through these functions; handlers never match on roles ad hoc.

use volunet_shared::account::Role;
use volunet_shared::project::{ModerationStatus, Project};

/// Whether the actor may see the target project with its
/// public contents.
///
/// Approved projects are public. Unapproved ones are visible to
/// admins and to their owning coordinator only.
pub fn can_view_project(role: Role, actor: u64, project: &Project) -> bool {
    project.moderation_status() == ModerationStatus::Approved
        || role.is_moderator()
        || (role == Role::Coordinator && project.coordinator == actor)
}

/// Whether the actor may edit, delete or advance the target project,
/// or manage its tasks.
pub fn can_mutate_project(role: Role, actor: u64, project: &Project) -> bool {
    role == Role::Admin || (role == Role::Coordinator && project.coordinator == actor)
}

/// Whether the actor may list the target project's applications,
/// donations and reports.
///
/// These are private to the owning coordinator and admins. A
/// volunteer only ever sees their own applications through the
/// dedicated query.
pub fn can_view_project_records(role: Role, actor: u64, project: &Project) -> bool {
    can_mutate_project(role, actor, project)
}
