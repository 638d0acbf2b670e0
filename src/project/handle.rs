use crate::policy;
use crate::project;
use crate::task;
use crate::{Error, RequirePermissionContext};
use axum::Json;
use chrono::Utc;
use serde_json::json;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use volunet_shared::account::Role;
use volunet_shared::project::handle::*;
use volunet_shared::project::*;

/// Create a new project owned by the acting coordinator.
///
/// New projects always start in the `Funding` stage with an empty
/// collected amount and a pending moderation trail.
pub async fn new_project(
    ctx: RequirePermissionContext,
    Json(descriptor): Json<CreateProjectDescriptor>,
) -> Result<Json<serde_json::Value>, Error> {
    if ctx.valid()? != Role::Coordinator {
        return Err(Error::PermissionDenied);
    }

    if descriptor.name.is_empty() {
        return Err(Error::Validation("name could not be empty".to_string()));
    }
    if descriptor.target_amount == 0 {
        return Err(Error::Validation(
            "target amount must be positive".to_string(),
        ));
    }

    let project = Project {
        id: {
            let mut hasher = DefaultHasher::new();

            descriptor.name.hash(&mut hasher);
            descriptor.description.hash(&mut hasher);
            ctx.account_id.hash(&mut hasher);

            let id = hasher.finish();

            if project::INSTANCE.contains_id(id) {
                return Err(Error::Conflict);
            }

            id
        },
        name: descriptor.name,
        description: descriptor.description,
        coordinator: ctx.account_id,
        target_amount: descriptor.target_amount,
        collected_amount: 0,
        image_url: descriptor.image_url,
        bank_details: descriptor.bank_details,
        status: ProjectStatus::Funding,
        moderation: vec![ModerationRecord {
            operator: ctx.account_id,
            status: ModerationStatus::Pending,
            comment: String::new(),
            time: Utc::now(),
        }],
        creation_time: Utc::now(),
    };

    tracing::info!(
        "project {} created by coordinator {}",
        project.id,
        ctx.account_id
    );

    project::save_project(&project);

    let id = project.id;
    project::INSTANCE.push(project);

    Ok(Json(json!({ "project_id": id })))
}

pub async fn get_projects(
    ctx: RequirePermissionContext,
    Json(descriptor): Json<GetProjectsDescriptor>,
) -> Result<Json<serde_json::Value>, Error> {
    let role = ctx.valid()?;

    let mut projects = Vec::new();

    for p in project::INSTANCE.inner().read().iter() {
        let pr = p.read();

        if policy::can_view_project(role, ctx.account_id, &pr)
            && descriptor
                .filters
                .iter()
                .all(|f| matches_get_projects_filter(f, &pr))
        {
            projects.push(pr.id);
        }
    }

    Ok(Json(json!({ "projects": projects })))
}

/// If the target project matches this filter. Visibility is decided
/// separately by the policy.
fn matches_get_projects_filter(filter: &GetProjectsFilter, project: &Project) -> bool {
    match filter {
        GetProjectsFilter::Coordinator(account) => &project.coordinator == account,
        GetProjectsFilter::Keyword(keywords) => keywords
            .split_whitespace()
            .all(|k| project.name.contains(k) || project.description.contains(k)),
        GetProjectsFilter::Moderation(status) => &project.moderation_status() == status,
        GetProjectsFilter::Status(status) => &project.status == status,
    }
}

pub async fn get_projects_info(
    ctx: RequirePermissionContext,
    Json(descriptor): Json<GetProjectsInfoDescriptor>,
) -> Result<Json<serde_json::Value>, Error> {
    let role = ctx.valid()?;

    let projects = project::INSTANCE.inner().read();
    let mut results = Vec::new();

    for id in descriptor.projects {
        results.push(
            match project::INSTANCE
                .index()
                .get(&id)
                .and_then(|index| projects.get(*index.value()))
            {
                Some(p) => {
                    let pr = p.read();

                    if policy::can_view_project_records(role, ctx.account_id, &pr) {
                        ProjectInfoResult::Full(pr.clone())
                    } else if policy::can_view_project(role, ctx.account_id, &pr) {
                        ProjectInfoResult::Public {
                            id: pr.id,
                            name: pr.name.clone(),
                            description: pr.description.clone(),
                            coordinator: pr.coordinator,
                            target_amount: pr.target_amount,
                            collected_amount: pr.collected_amount,
                            image_url: pr.image_url.clone(),
                            status: pr.status,
                        }
                    } else {
                        ProjectInfoResult::Forbidden(id)
                    }
                }
                None => ProjectInfoResult::NotFound(id),
            },
        );
    }

    Ok(Json(json!({ "results": results })))
}

pub async fn edit_project(
    ctx: RequirePermissionContext,
    Json(descriptor): Json<EditProjectDescriptor>,
) -> Result<Json<serde_json::Value>, Error> {
    let role = ctx.valid()?;

    let projects = project::INSTANCE.inner().read();
    let index = project::INSTANCE
        .index()
        .get(&descriptor.project)
        .map(|e| *e.value())
        .ok_or(Error::ProjectNotFound)?;
    let mut pw = projects.get(index).ok_or(Error::ProjectNotFound)?.write();

    if !policy::can_mutate_project(role, ctx.account_id, &pw) {
        return Err(Error::PermissionDenied);
    }

    // stage the edits so a failing variant leaves the project untouched
    let mut staged = pw.clone();
    for variant in descriptor.variants.iter() {
        apply_edit_project_variant(&mut staged, variant)?;
    }
    *pw = staged;

    project::save_project(&pw);

    Ok(Json(json!({})))
}

/// Apply this edition, return an err if error occurs.
fn apply_edit_project_variant(
    project: &mut Project,
    variant: &EditProjectVariant,
) -> Result<(), Error> {
    match variant {
        EditProjectVariant::BankDetails(value) => project.bank_details = value.clone(),
        EditProjectVariant::Description(value) => project.description = value.clone(),
        EditProjectVariant::ImageUrl(value) => project.image_url = value.clone(),

        EditProjectVariant::Name(value) => {
            if value.is_empty() {
                return Err(Error::Validation("name could not be empty".to_string()));
            }
            project.name = value.clone();
        }

        EditProjectVariant::Status(target) => {
            if !project.status.can_advance_to(*target) {
                return Err(Error::InvalidTransition(project.status, *target));
            }
            project.status = *target;
        }

        EditProjectVariant::TargetAmount(target) => {
            if *target == 0 {
                return Err(Error::Validation(
                    "target amount must be positive".to_string(),
                ));
            }
            if project.status != ProjectStatus::Funding {
                return Err(Error::Validation(
                    "target amount can only change while funding".to_string(),
                ));
            }
            project.target_amount = *target;
            // a lowered target may already be met
            if project.collected_amount >= project.target_amount {
                project.status = ProjectStatus::InProgress;
            }
        }
    }

    Ok(())
}

/// Delete the target project and cascade to its tasks, reports,
/// applications, donations and moderation trail.
pub async fn delete_project(
    ctx: RequirePermissionContext,
    Json(descriptor): Json<DeleteProjectDescriptor>,
) -> Result<Json<serde_json::Value>, Error> {
    let role = ctx.valid()?;

    {
        let projects = project::INSTANCE.inner().read();
        let index = project::INSTANCE
            .index()
            .get(&descriptor.project)
            .map(|e| *e.value())
            .ok_or(Error::ProjectNotFound)?;
        let pr = projects.get(index).ok_or(Error::ProjectNotFound)?.read();

        if !policy::can_mutate_project(role, ctx.account_id, &pr) {
            return Err(Error::PermissionDenied);
        }
    }

    project::INSTANCE.remove(descriptor.project);
    project::DONATIONS.remove_by_project(descriptor.project);
    task::INSTANCE.remove_by_project(descriptor.project);
    task::APPLICATIONS.remove_by_project(descriptor.project);
    task::REPORTS.remove_by_project(descriptor.project);

    tracing::info!(
        "project {} deleted by account {}",
        descriptor.project,
        ctx.account_id
    );

    Ok(Json(json!({})))
}

/// Append a moderation decision to the target project's trail.
///
/// Approving opens public visibility and does not touch the funding
/// stage. Rejected projects are terminal.
pub async fn moderate_project(
    ctx: RequirePermissionContext,
    Json(descriptor): Json<ModerateProjectDescriptor>,
) -> Result<Json<serde_json::Value>, Error> {
    if !ctx.valid()?.is_moderator() {
        return Err(Error::PermissionDenied);
    }

    let projects = project::INSTANCE.inner().read();
    let index = project::INSTANCE
        .index()
        .get(&descriptor.project)
        .map(|e| *e.value())
        .ok_or(Error::ProjectNotFound)?;
    let mut pw = projects.get(index).ok_or(Error::ProjectNotFound)?.write();

    let current = pw.moderation_status();
    if current != ModerationStatus::Pending {
        return Err(Error::AlreadyModerated(current));
    }

    let (status, comment) = match descriptor.variant {
        ModerateProjectVariant::Approve(msg) => {
            (ModerationStatus::Approved, msg.unwrap_or_default())
        }
        ModerateProjectVariant::Reject(msg) => {
            if msg.is_empty() {
                return Err(Error::Validation(
                    "rejection message could not be empty".to_string(),
                ));
            }
            (ModerationStatus::Rejected, msg)
        }
    };

    pw.moderation.push(ModerationRecord {
        operator: ctx.account_id,
        status,
        comment,
        time: Utc::now(),
    });

    tracing::info!(
        "project {} moderated to {:?} by admin {}",
        pw.id,
        status,
        ctx.account_id
    );

    project::save_project(&pw);

    Ok(Json(json!({})))
}

/// Apply a donation to the target project.
///
/// The ledger insert, the collected-amount increment and the
/// target-reached transition happen under one write guard on the
/// project entry, so concurrent donations serialize.
pub async fn donate(
    ctx: RequirePermissionContext,
    Json(descriptor): Json<DonateDescriptor>,
) -> Result<Json<serde_json::Value>, Error> {
    let role = ctx.valid()?;

    if descriptor.amount == 0 {
        return Err(Error::Validation("amount must be positive".to_string()));
    }

    let projects = project::INSTANCE.inner().read();
    let index = project::INSTANCE
        .index()
        .get(&descriptor.project)
        .map(|e| *e.value())
        .ok_or(Error::ProjectNotFound)?;
    let mut pw = projects.get(index).ok_or(Error::ProjectNotFound)?.write();

    if !policy::can_view_project(role, ctx.account_id, &pw) {
        return Err(Error::PermissionDenied);
    }
    // even the owner cannot fund a project that is not approved yet
    if pw.moderation_status() != ModerationStatus::Approved {
        return Err(Error::ProjectNotAcceptingFunds);
    }
    if pw.status != ProjectStatus::Funding {
        return Err(Error::ProjectNotAcceptingFunds);
    }

    let donation = Donation {
        id: {
            let mut hasher = DefaultHasher::new();
            pw.id.hash(&mut hasher);
            ctx.account_id.hash(&mut hasher);
            rand::random::<u64>().hash(&mut hasher);
            hasher.finish()
        },
        project: pw.id,
        donor: if descriptor.anonymous {
            None
        } else {
            Some(ctx.account_id)
        },
        amount: descriptor.amount,
        comment: descriptor.comment,
        time: Utc::now(),
    };

    pw.collected_amount = pw
        .collected_amount
        .checked_add(donation.amount)
        .ok_or_else(|| Error::Validation("amount too large".to_string()))?;
    if pw.collected_amount >= pw.target_amount {
        pw.status = ProjectStatus::InProgress;
        tracing::info!("project {} reached its target, now in progress", pw.id);
    }

    // ledger insert happens under the project's write guard
    project::DONATIONS.push(donation.clone());

    project::save_project(&pw);
    project::save_donation(&donation);

    Ok(Json(
        json!({ "donation_id": donation.id, "collected_amount": pw.collected_amount }),
    ))
}

pub async fn get_donations(
    ctx: RequirePermissionContext,
    Json(descriptor): Json<GetDonationsDescriptor>,
) -> Result<Json<serde_json::Value>, Error> {
    let role = ctx.valid()?;

    {
        let projects = project::INSTANCE.inner().read();
        let index = project::INSTANCE
            .index()
            .get(&descriptor.project)
            .map(|e| *e.value())
            .ok_or(Error::ProjectNotFound)?;
        let pr = projects.get(index).ok_or(Error::ProjectNotFound)?.read();

        if !policy::can_view_project_records(role, ctx.account_id, &pr) {
            return Err(Error::PermissionDenied);
        }
    }

    let donations: Vec<Donation> = project::DONATIONS
        .inner()
        .read()
        .iter()
        .filter(|donation| donation.project == descriptor.project)
        .cloned()
        .collect();

    Ok(Json(json!({ "donations": donations })))
}
