use super::*;

use hyper::StatusCode;
use serial_test::serial;
use tower::ServiceExt;
use volunet_shared::project::handle::*;
use volunet_shared::project::{ModerationStatus, ProjectStatus};

fn project_descriptor(name: &str) -> CreateProjectDescriptor {
    CreateProjectDescriptor {
        name: name.to_string(),
        description: "Warm meals for the neighbourhood.".to_string(),
        target_amount: 1000,
        image_url: None,
        bank_details: Some("IBAN XX00 0000".to_string()),
    }
}

async fn create_project(
    app: &axum::Router,
    auth: &(u64, String),
    name: &str,
) -> u64 {
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/project/create",
            auth,
            &project_descriptor(name),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    response_json(response)
        .await
        .get("project_id")
        .unwrap()
        .as_u64()
        .unwrap()
}

async fn approve_project(app: &axum::Router, admin: &(u64, String), project: u64) {
    assert_eq!(
        app.clone()
            .oneshot(post_json(
                "/api/project/moderate",
                admin,
                &ModerateProjectDescriptor {
                    project,
                    variant: ModerateProjectVariant::Approve(None),
                },
            ))
            .await
            .unwrap()
            .status(),
        StatusCode::OK
    );
}

async fn listed_projects(app: &axum::Router, auth: &(u64, String)) -> Vec<u64> {
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/project/get",
            auth,
            &GetProjectsDescriptor { filters: vec![] },
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    response_json(response)
        .await
        .get("projects")
        .unwrap()
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_u64().unwrap())
        .collect()
}

#[serial]
#[tokio::test]
async fn new_projects_start_pending_and_funding() {
    reset_all();

    let app = crate::router();
    let coordinator = push_account("coordinator@example.org", Role::Coordinator);

    let id = create_project(&app, &coordinator, "Community kitchen").await;

    let projects = crate::project::INSTANCE.inner().read();
    let pr = projects[0].read();
    assert_eq!(pr.id, id);
    assert_eq!(pr.status, ProjectStatus::Funding);
    assert_eq!(pr.collected_amount, 0);
    assert_eq!(pr.moderation_status(), ModerationStatus::Pending);
    assert_eq!(pr.coordinator, coordinator.0);
}

#[serial]
#[tokio::test]
async fn only_coordinators_create_projects() {
    reset_all();

    let app = crate::router();

    for email in ["volunteer@example.org", "donor@example.org"] {
        let auth = push_account(
            email,
            if email.starts_with("volunteer") {
                Role::Volunteer
            } else {
                Role::Donor
            },
        );
        assert_eq!(
            app.clone()
                .oneshot(post_json(
                    "/api/project/create",
                    &auth,
                    &project_descriptor("Community kitchen"),
                ))
                .await
                .unwrap()
                .status(),
            StatusCode::FORBIDDEN
        );
    }

    assert!(crate::project::INSTANCE.inner().read().is_empty());
}

#[serial]
#[tokio::test]
async fn unapproved_projects_are_hidden_from_the_public() {
    reset_all();

    let app = crate::router();
    let admin = push_account("admin@example.org", Role::Admin);
    let owner = push_account("owner@example.org", Role::Coordinator);
    let foreign = push_account("foreign@example.org", Role::Coordinator);
    let volunteer = push_account("volunteer@example.org", Role::Volunteer);
    let donor = push_account("donor@example.org", Role::Donor);

    let id = create_project(&app, &owner, "Community kitchen").await;

    assert_eq!(listed_projects(&app, &volunteer).await, Vec::<u64>::new());
    assert_eq!(listed_projects(&app, &donor).await, Vec::<u64>::new());
    assert_eq!(listed_projects(&app, &foreign).await, Vec::<u64>::new());
    assert_eq!(listed_projects(&app, &owner).await, vec![id]);
    assert_eq!(listed_projects(&app, &admin).await, vec![id]);

    approve_project(&app, &admin, id).await;

    assert_eq!(listed_projects(&app, &volunteer).await, vec![id]);
    assert_eq!(listed_projects(&app, &donor).await, vec![id]);
}

#[serial]
#[tokio::test]
async fn moderation_decisions_are_terminal() {
    reset_all();

    let app = crate::router();
    let admin = push_account("admin@example.org", Role::Admin);
    let owner = push_account("owner@example.org", Role::Coordinator);
    let volunteer = push_account("volunteer@example.org", Role::Volunteer);

    let id = create_project(&app, &owner, "Community kitchen").await;

    // non-moderators cannot decide
    assert_eq!(
        app.clone()
            .oneshot(post_json(
                "/api/project/moderate",
                &volunteer,
                &ModerateProjectDescriptor {
                    project: id,
                    variant: ModerateProjectVariant::Approve(None),
                },
            ))
            .await
            .unwrap()
            .status(),
        StatusCode::FORBIDDEN
    );

    // a rejection needs a message
    assert_eq!(
        app.clone()
            .oneshot(post_json(
                "/api/project/moderate",
                &admin,
                &ModerateProjectDescriptor {
                    project: id,
                    variant: ModerateProjectVariant::Reject(String::new()),
                },
            ))
            .await
            .unwrap()
            .status(),
        StatusCode::BAD_REQUEST
    );

    assert_eq!(
        app.clone()
            .oneshot(post_json(
                "/api/project/moderate",
                &admin,
                &ModerateProjectDescriptor {
                    project: id,
                    variant: ModerateProjectVariant::Reject("missing bank details".to_string()),
                },
            ))
            .await
            .unwrap()
            .status(),
        StatusCode::OK
    );

    // rejected is terminal, approval after the fact fails
    assert_eq!(
        app.clone()
            .oneshot(post_json(
                "/api/project/moderate",
                &admin,
                &ModerateProjectDescriptor {
                    project: id,
                    variant: ModerateProjectVariant::Approve(None),
                },
            ))
            .await
            .unwrap()
            .status(),
        StatusCode::CONFLICT
    );

    let projects = crate::project::INSTANCE.inner().read();
    let pr = projects[0].read();
    assert_eq!(pr.moderation_status(), ModerationStatus::Rejected);
    // the trail keeps the full history
    assert_eq!(pr.moderation.len(), 2);
}

#[serial]
#[tokio::test]
async fn stages_never_move_backward() {
    reset_all();

    let app = crate::router();
    let admin = push_account("admin@example.org", Role::Admin);
    let owner = push_account("owner@example.org", Role::Coordinator);

    let id = create_project(&app, &owner, "Community kitchen").await;
    approve_project(&app, &admin, id).await;

    // skipping a stage is rejected
    assert_eq!(
        app.clone()
            .oneshot(post_json(
                "/api/project/edit",
                &owner,
                &EditProjectDescriptor {
                    project: id,
                    variants: vec![EditProjectVariant::Status(ProjectStatus::Completed)],
                },
            ))
            .await
            .unwrap()
            .status(),
        StatusCode::CONFLICT
    );

    for target in [ProjectStatus::InProgress, ProjectStatus::Completed] {
        assert_eq!(
            app.clone()
                .oneshot(post_json(
                    "/api/project/edit",
                    &owner,
                    &EditProjectDescriptor {
                        project: id,
                        variants: vec![EditProjectVariant::Status(target)],
                    },
                ))
                .await
                .unwrap()
                .status(),
            StatusCode::OK
        );
    }

    // and nothing leaves completed
    assert_eq!(
        app.clone()
            .oneshot(post_json(
                "/api/project/edit",
                &owner,
                &EditProjectDescriptor {
                    project: id,
                    variants: vec![EditProjectVariant::Status(ProjectStatus::Funding)],
                },
            ))
            .await
            .unwrap()
            .status(),
        StatusCode::CONFLICT
    );

    let projects = crate::project::INSTANCE.inner().read();
    assert_eq!(projects[0].read().status, ProjectStatus::Completed);
}

#[serial]
#[tokio::test]
async fn foreign_coordinators_cannot_touch_projects() {
    reset_all();

    let app = crate::router();
    let admin = push_account("admin@example.org", Role::Admin);
    let owner = push_account("owner@example.org", Role::Coordinator);
    let foreign = push_account("foreign@example.org", Role::Coordinator);

    let id = create_project(&app, &owner, "Community kitchen").await;
    approve_project(&app, &admin, id).await;

    assert_eq!(
        app.clone()
            .oneshot(post_json(
                "/api/project/edit",
                &foreign,
                &EditProjectDescriptor {
                    project: id,
                    variants: vec![EditProjectVariant::Name("Hijacked".to_string())],
                },
            ))
            .await
            .unwrap()
            .status(),
        StatusCode::FORBIDDEN
    );

    assert_eq!(
        app.clone()
            .oneshot(post_json(
                "/api/project/delete",
                &foreign,
                &DeleteProjectDescriptor { project: id },
            ))
            .await
            .unwrap()
            .status(),
        StatusCode::FORBIDDEN
    );

    let projects = crate::project::INSTANCE.inner().read();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].read().name, "Community kitchen");
}

#[serial]
#[tokio::test]
async fn deleting_one_project_keeps_the_rest_addressable() {
    reset_all();

    let app = crate::router();
    let owner = push_account("owner@example.org", Role::Coordinator);

    let first = create_project(&app, &owner, "Community kitchen").await;
    let second = create_project(&app, &owner, "Winter shelter").await;

    assert_eq!(
        app.clone()
            .oneshot(post_json(
                "/api/project/delete",
                &owner,
                &DeleteProjectDescriptor { project: first },
            ))
            .await
            .unwrap()
            .status(),
        StatusCode::OK
    );

    // the survivor is still reachable through the refreshed index
    assert_eq!(
        app.clone()
            .oneshot(post_json(
                "/api/project/edit",
                &owner,
                &EditProjectDescriptor {
                    project: second,
                    variants: vec![EditProjectVariant::Description(
                        "Beds and blankets.".to_string(),
                    )],
                },
            ))
            .await
            .unwrap()
            .status(),
        StatusCode::OK
    );
    assert_eq!(listed_projects(&app, &owner).await, vec![second]);

    // deleting twice is a miss, not a panic
    assert_eq!(
        app.oneshot(post_json(
            "/api/project/delete",
            &owner,
            &DeleteProjectDescriptor { project: first },
        ))
        .await
        .unwrap()
        .status(),
        StatusCode::NOT_FOUND
    );
}

#[serial]
#[tokio::test]
async fn failed_edits_leave_the_project_untouched() {
    reset_all();

    let app = crate::router();
    let owner = push_account("owner@example.org", Role::Coordinator);

    let id = create_project(&app, &owner, "Community kitchen").await;

    // the first variant is fine, the second fails: nothing applies
    assert_eq!(
        app.clone()
            .oneshot(post_json(
                "/api/project/edit",
                &owner,
                &EditProjectDescriptor {
                    project: id,
                    variants: vec![
                        EditProjectVariant::Name("Soup kitchen".to_string()),
                        EditProjectVariant::Status(ProjectStatus::Completed),
                    ],
                },
            ))
            .await
            .unwrap()
            .status(),
        StatusCode::CONFLICT
    );

    let projects = crate::project::INSTANCE.inner().read();
    assert_eq!(projects[0].read().name, "Community kitchen");
}

#[serial]
#[tokio::test]
async fn info_hides_private_fields_from_the_public() {
    reset_all();

    let app = crate::router();
    let admin = push_account("admin@example.org", Role::Admin);
    let owner = push_account("owner@example.org", Role::Coordinator);
    let donor = push_account("donor@example.org", Role::Donor);

    let pending = create_project(&app, &owner, "Community kitchen").await;
    let approved = create_project(&app, &owner, "Winter shelter").await;
    approve_project(&app, &admin, approved).await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/project/get-info",
            &donor,
            &GetProjectsInfoDescriptor {
                projects: vec![pending, approved, 424242],
            },
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = response_json(response).await;
    let results = json.get("results").unwrap().as_array().unwrap();

    // pending projects exist but stay forbidden to strangers
    assert_eq!(
        results[0].get("Forbidden").unwrap().as_u64().unwrap(),
        pending
    );
    // approved projects come back as the public view, without bank details
    let public = results[1].get("Public").unwrap();
    assert_eq!(public.get("id").unwrap().as_u64().unwrap(), approved);
    assert!(public.get("bank_details").is_none());
    assert_eq!(
        results[2].get("NotFound").unwrap().as_u64().unwrap(),
        424242
    );

    // the owner gets the complete record
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/project/get-info",
            &owner,
            &GetProjectsInfoDescriptor {
                projects: vec![pending],
            },
        ))
        .await
        .unwrap();
    let json = response_json(response).await;
    let full = json.get("results").unwrap().as_array().unwrap()[0]
        .get("Full")
        .unwrap();
    assert_eq!(
        full.get("bank_details").unwrap().as_str().unwrap(),
        "IBAN XX00 0000"
    );
}
