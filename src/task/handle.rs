use crate::account;
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
use volunet_shared::project::Project;
use volunet_shared::task::handle::*;
use volunet_shared::task::*;

/// A snapshot of the target project for policy checks, taken before
/// any task entry is locked.
fn project_snapshot(id: u64) -> Result<Project, Error> {
    let projects = project::INSTANCE.inner().read();
    let index = project::INSTANCE
        .index()
        .get(&id)
        .map(|e| *e.value())
        .ok_or(Error::ProjectNotFound)?;
    let project = projects
        .get(index)
        .ok_or(Error::ProjectNotFound)?
        .read()
        .clone();
    Ok(project)
}

/// Create a new task under a project the actor manages.
pub async fn new_task(
    ctx: RequirePermissionContext,
    Json(descriptor): Json<CreateTaskDescriptor>,
) -> Result<Json<serde_json::Value>, Error> {
    let role = ctx.valid()?;

    let project = project_snapshot(descriptor.project)?;
    if !policy::can_mutate_project(role, ctx.account_id, &project) {
        return Err(Error::PermissionDenied);
    }

    if descriptor.name.is_empty() {
        return Err(Error::Validation("name could not be empty".to_string()));
    }
    if descriptor.volunteers_needed == 0 {
        return Err(Error::Validation(
            "at least one volunteer is needed".to_string(),
        ));
    }
    if let Some(expenses) = &descriptor.expenses {
        if expenses.estimated_amount == 0 || expenses.purpose.is_empty() {
            return Err(Error::Validation(
                "expense requirement needs a positive amount and a purpose".to_string(),
            ));
        }
    }

    let task = Task {
        id: {
            let mut hasher = DefaultHasher::new();

            descriptor.project.hash(&mut hasher);
            descriptor.name.hash(&mut hasher);
            descriptor.description.hash(&mut hasher);

            let id = hasher.finish();

            if task::INSTANCE.contains_id(id) {
                return Err(Error::Conflict);
            }

            id
        },
        project: descriptor.project,
        name: descriptor.name,
        description: descriptor.description,
        kind: descriptor.kind,
        status: TaskStatus::Pending,
        assignee: None,
        volunteers_needed: descriptor.volunteers_needed,
        expenses: descriptor.expenses,
        creation_time: Utc::now(),
    };

    tracing::info!(
        "task {} created under project {} by account {}",
        task.id,
        task.project,
        ctx.account_id
    );

    task::save_task(&task);

    let id = task.id;
    task::INSTANCE.push(task);

    Ok(Json(json!({ "task_id": id })))
}

pub async fn get_tasks(
    ctx: RequirePermissionContext,
    Json(descriptor): Json<GetTasksDescriptor>,
) -> Result<Json<serde_json::Value>, Error> {
    let role = ctx.valid()?;

    let project = project_snapshot(descriptor.project)?;
    if !policy::can_view_project(role, ctx.account_id, &project) {
        return Err(Error::PermissionDenied);
    }

    let tasks: Vec<Task> = task::INSTANCE
        .inner()
        .read()
        .iter()
        .filter_map(|t| {
            let tr = t.read();
            (tr.project == descriptor.project).then(|| tr.clone())
        })
        .collect();

    Ok(Json(json!({ "tasks": tasks })))
}

/// Assign a volunteer to a task.
///
/// The volunteer must hold an approved application for the task's
/// project. Re-assignment overwrites the previous assignee; a
/// completed task cannot be assigned. The eligibility check and the
/// status flip run under the task's write guard.
pub async fn assign_task(
    ctx: RequirePermissionContext,
    Json(descriptor): Json<AssignTaskDescriptor>,
) -> Result<Json<serde_json::Value>, Error> {
    let role = ctx.valid()?;

    let tasks = task::INSTANCE.inner().read();
    let index = task::INSTANCE
        .index()
        .get(&descriptor.task)
        .map(|e| *e.value())
        .ok_or(Error::TaskNotFound)?;
    let mut tw = tasks.get(index).ok_or(Error::TaskNotFound)?.write();

    let project = project_snapshot(tw.project)?;
    if !policy::can_mutate_project(role, ctx.account_id, &project) {
        return Err(Error::PermissionDenied);
    }

    if tw.status == TaskStatus::Completed {
        return Err(Error::TaskAlreadyCompleted);
    }
    if !account::INSTANCE.contains_id(descriptor.volunteer) {
        return Err(Error::AccountNotFound);
    }
    if !task::APPLICATIONS.approved(tw.project, descriptor.volunteer) {
        return Err(Error::VolunteerNotEligible);
    }

    tw.assignee = Some(descriptor.volunteer);
    tw.status = TaskStatus::InProgress;

    tracing::info!(
        "task {} assigned to volunteer {} by account {}",
        tw.id,
        descriptor.volunteer,
        ctx.account_id
    );

    task::save_task(&tw);

    Ok(Json(json!({})))
}

/// Apply to a project's volunteer pool.
pub async fn apply(
    ctx: RequirePermissionContext,
    Json(descriptor): Json<ApplyDescriptor>,
) -> Result<Json<serde_json::Value>, Error> {
    let role = ctx.valid()?;
    if role != Role::Volunteer {
        return Err(Error::PermissionDenied);
    }

    let project = project_snapshot(descriptor.project)?;
    if !policy::can_view_project(role, ctx.account_id, &project) {
        return Err(Error::PermissionDenied);
    }

    let application = Application {
        id: {
            let mut hasher = DefaultHasher::new();
            descriptor.project.hash(&mut hasher);
            ctx.account_id.hash(&mut hasher);
            hasher.finish()
        },
        project: descriptor.project,
        volunteer: ctx.account_id,
        status: ApplicationStatus::Pending,
        message: descriptor.message,
        time: Utc::now(),
    };

    let id = application.id;
    task::APPLICATIONS.try_push(application.clone())?;

    tracing::info!(
        "volunteer {} applied to project {}",
        ctx.account_id,
        descriptor.project
    );

    task::save_application(&application);

    Ok(Json(json!({ "application_id": id })))
}

/// The acting volunteer's own applications, in every status.
pub async fn my_applications(
    ctx: RequirePermissionContext,
) -> Result<Json<serde_json::Value>, Error> {
    ctx.valid()?;

    let applications: Vec<Application> = task::APPLICATIONS
        .inner()
        .read()
        .iter()
        .filter_map(|a| {
            let ar = a.read();
            (ar.volunteer == ctx.account_id).then(|| ar.clone())
        })
        .collect();

    Ok(Json(json!({ "applications": applications })))
}

pub async fn get_applications(
    ctx: RequirePermissionContext,
    Json(descriptor): Json<GetApplicationsDescriptor>,
) -> Result<Json<serde_json::Value>, Error> {
    let role = ctx.valid()?;

    let project = project_snapshot(descriptor.project)?;
    if !policy::can_view_project_records(role, ctx.account_id, &project) {
        return Err(Error::PermissionDenied);
    }

    let applications: Vec<Application> = task::APPLICATIONS
        .inner()
        .read()
        .iter()
        .filter_map(|a| {
            let ar = a.read();
            (ar.project == descriptor.project).then(|| ar.clone())
        })
        .collect();

    Ok(Json(json!({ "applications": applications })))
}

/// Decide a pending application. Decisions are terminal.
pub async fn review_application(
    ctx: RequirePermissionContext,
    Json(descriptor): Json<ReviewApplicationDescriptor>,
) -> Result<Json<serde_json::Value>, Error> {
    let role = ctx.valid()?;

    let applications = task::APPLICATIONS.inner().read();
    let mut aw = applications
        .iter()
        .find(|a| a.read().id == descriptor.application)
        .ok_or(Error::ApplicationNotFound)?
        .write();

    let project = project_snapshot(aw.project)?;
    if !policy::can_mutate_project(role, ctx.account_id, &project) {
        return Err(Error::PermissionDenied);
    }

    if aw.status != ApplicationStatus::Pending {
        return Err(Error::AlreadyReviewed(aw.status));
    }

    aw.status = match descriptor.variant {
        ReviewApplicationVariant::Approve => ApplicationStatus::Approved,
        ReviewApplicationVariant::Reject => ApplicationStatus::Rejected,
    };

    tracing::info!(
        "application {} reviewed to {:?} by account {}",
        aw.id,
        aw.status,
        ctx.account_id
    );

    task::save_application(&aw);

    Ok(Json(json!({})))
}

/// Submit the completion report for a task.
///
/// Permitted only to the currently assigned volunteer while the task
/// is in progress. The report insert and the completion flip run
/// under the task's write guard, so a failing validation leaves
/// neither half applied.
pub async fn submit_report(
    ctx: RequirePermissionContext,
    Json(descriptor): Json<SubmitReportDescriptor>,
) -> Result<Json<serde_json::Value>, Error> {
    ctx.valid()?;

    let tasks = task::INSTANCE.inner().read();
    let index = task::INSTANCE
        .index()
        .get(&descriptor.task)
        .map(|e| *e.value())
        .ok_or(Error::TaskNotFound)?;
    let mut tw = tasks.get(index).ok_or(Error::TaskNotFound)?.write();

    if tw.assignee != Some(ctx.account_id) {
        return Err(Error::PermissionDenied);
    }
    if tw.status != TaskStatus::InProgress {
        return Err(Error::TaskNotInStatus(TaskStatus::InProgress));
    }

    if descriptor.summary.is_empty() {
        return Err(Error::Validation("summary could not be empty".to_string()));
    }
    if tw.expenses.is_some()
        && (descriptor.expense_amount.is_none() || descriptor.expense_purpose.is_none())
    {
        return Err(Error::Validation(
            "this task requires an expense amount and purpose".to_string(),
        ));
    }
    if descriptor.expense_amount == Some(0) {
        return Err(Error::Validation(
            "expense amount must be positive".to_string(),
        ));
    }

    let report = Report {
        id: {
            let mut hasher = DefaultHasher::new();
            tw.id.hash(&mut hasher);
            ctx.account_id.hash(&mut hasher);
            hasher.finish()
        },
        task: tw.id,
        project: tw.project,
        volunteer: ctx.account_id,
        summary: descriptor.summary,
        expense_amount: descriptor.expense_amount,
        expense_purpose: descriptor.expense_purpose,
        time: Utc::now(),
    };

    // both halves land under the task's write guard
    task::REPORTS.push(report.clone());
    tw.status = TaskStatus::Completed;

    tracing::info!(
        "task {} completed with report {} by volunteer {}",
        tw.id,
        report.id,
        ctx.account_id
    );

    task::save_task(&tw);
    task::save_report(&report);

    Ok(Json(json!({ "report_id": report.id })))
}

pub async fn get_reports(
    ctx: RequirePermissionContext,
    Json(descriptor): Json<GetReportsDescriptor>,
) -> Result<Json<serde_json::Value>, Error> {
    let role = ctx.valid()?;

    let project = project_snapshot(descriptor.project)?;
    if !policy::can_view_project_records(role, ctx.account_id, &project) {
        return Err(Error::PermissionDenied);
    }

    let reports: Vec<Report> = task::REPORTS
        .inner()
        .read()
        .iter()
        .filter(|report| report.project == descriptor.project)
        .cloned()
        .collect();

    Ok(Json(json!({ "reports": reports })))
}
