use super::*;

use hyper::StatusCode;
use serial_test::serial;
use tower::ServiceExt;
use volunet_shared::project::handle::*;
use volunet_shared::project::ProjectStatus;

/// Seed an approved project in the funding stage, returning
/// (owner, admin, project id).
async fn funded_fixture(app: &axum::Router) -> ((u64, String), (u64, String), u64) {
    let admin = push_account("admin@example.org", Role::Admin);
    let owner = push_account("owner@example.org", Role::Coordinator);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/project/create",
            &owner,
            &CreateProjectDescriptor {
                name: "Community kitchen".to_string(),
                description: "Warm meals for the neighbourhood.".to_string(),
                target_amount: 1000,
                image_url: None,
                bank_details: None,
            },
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let id = response_json(response)
        .await
        .get("project_id")
        .unwrap()
        .as_u64()
        .unwrap();

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
        StatusCode::OK
    );

    (owner, admin, id)
}

async fn donate(
    app: &axum::Router,
    auth: &(u64, String),
    project: u64,
    amount: u64,
    anonymous: bool,
) -> axum::response::Response {
    app.clone()
        .oneshot(post_json(
            "/api/project/donate",
            auth,
            &DonateDescriptor {
                project,
                amount,
                comment: None,
                anonymous,
            },
        ))
        .await
        .unwrap()
}

#[serial]
#[tokio::test]
async fn reaching_the_target_moves_the_project_forward() {
    reset_all();

    let app = crate::router();
    let (_, _, id) = funded_fixture(&app).await;
    let donor = push_account("donor@example.org", Role::Donor);

    let response = donate(&app, &donor, id, 600, false).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response_json(response)
            .await
            .get("collected_amount")
            .unwrap()
            .as_u64()
            .unwrap(),
        600
    );
    {
        let projects = crate::project::INSTANCE.inner().read();
        assert_eq!(projects[0].read().status, ProjectStatus::Funding);
    }

    // the donation crossing the target flips the stage
    let response = donate(&app, &donor, id, 500, false).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response_json(response)
            .await
            .get("collected_amount")
            .unwrap()
            .as_u64()
            .unwrap(),
        1100
    );
    {
        let projects = crate::project::INSTANCE.inner().read();
        let pr = projects[0].read();
        assert_eq!(pr.status, ProjectStatus::InProgress);
        assert_eq!(pr.collected_amount, 1100);
    }

    // and further donations are turned away
    assert_eq!(
        donate(&app, &donor, id, 100, false).await.status(),
        StatusCode::CONFLICT
    );

    // the ledger matches what was collected
    let donations = crate::project::DONATIONS.inner().read();
    assert_eq!(donations.iter().map(|d| d.amount).sum::<u64>(), 1100);
}

#[serial]
#[tokio::test]
async fn zero_donations_are_rejected() {
    reset_all();

    let app = crate::router();
    let (_, _, id) = funded_fixture(&app).await;
    let donor = push_account("donor@example.org", Role::Donor);

    assert_eq!(
        donate(&app, &donor, id, 0, false).await.status(),
        StatusCode::BAD_REQUEST
    );

    assert!(crate::project::DONATIONS.inner().read().is_empty());
    let projects = crate::project::INSTANCE.inner().read();
    assert_eq!(projects[0].read().collected_amount, 0);
}

#[serial]
#[tokio::test]
async fn anonymous_donations_hide_the_donor() {
    reset_all();

    let app = crate::router();
    let (_, _, id) = funded_fixture(&app).await;
    let donor = push_account("donor@example.org", Role::Donor);

    assert_eq!(
        donate(&app, &donor, id, 100, true).await.status(),
        StatusCode::OK
    );
    assert_eq!(
        donate(&app, &donor, id, 200, false).await.status(),
        StatusCode::OK
    );

    let donations = crate::project::DONATIONS.inner().read();
    assert_eq!(donations[0].donor, None);
    assert_eq!(donations[1].donor, Some(donor.0));
}

#[serial]
#[tokio::test]
async fn donations_never_overflow_the_collected_amount() {
    reset_all();

    let app = crate::router();
    let admin = push_account("admin@example.org", Role::Admin);
    let owner = push_account("owner@example.org", Role::Coordinator);
    let donor = push_account("donor@example.org", Role::Donor);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/project/create",
            &owner,
            &CreateProjectDescriptor {
                name: "Endless appeal".to_string(),
                description: String::new(),
                target_amount: u64::MAX,
                image_url: None,
                bank_details: None,
            },
        ))
        .await
        .unwrap();
    let id = response_json(response)
        .await
        .get("project_id")
        .unwrap()
        .as_u64()
        .unwrap();
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
        StatusCode::OK
    );

    assert_eq!(donate(&app, &donor, id, 1, false).await.status(), StatusCode::OK);

    // a donation pushing the sum past u64::MAX is turned away whole
    assert_eq!(
        donate(&app, &donor, id, u64::MAX, false).await.status(),
        StatusCode::BAD_REQUEST
    );

    let projects = crate::project::INSTANCE.inner().read();
    let pr = projects[0].read();
    assert_eq!(pr.collected_amount, 1);
    assert_eq!(pr.status, ProjectStatus::Funding);
    assert_eq!(crate::project::DONATIONS.inner().read().len(), 1);
}

#[serial]
#[tokio::test]
async fn pending_projects_take_no_donations_even_from_the_owner() {
    reset_all();

    let app = crate::router();
    let owner = push_account("owner@example.org", Role::Coordinator);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/project/create",
            &owner,
            &CreateProjectDescriptor {
                name: "Community kitchen".to_string(),
                description: String::new(),
                target_amount: 1000,
                image_url: None,
                bank_details: None,
            },
        ))
        .await
        .unwrap();
    let id = response_json(response)
        .await
        .get("project_id")
        .unwrap()
        .as_u64()
        .unwrap();

    // the owner can see the pending project but cannot fund it
    assert_eq!(
        donate(&app, &owner, id, 100, false).await.status(),
        StatusCode::CONFLICT
    );
    assert!(crate::project::DONATIONS.inner().read().is_empty());
}

#[serial]
#[tokio::test]
async fn hidden_projects_take_no_donations() {
    reset_all();

    let app = crate::router();
    let owner = push_account("owner@example.org", Role::Coordinator);
    let donor = push_account("donor@example.org", Role::Donor);

    // the project is created but never approved
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/project/create",
            &owner,
            &CreateProjectDescriptor {
                name: "Community kitchen".to_string(),
                description: String::new(),
                target_amount: 1000,
                image_url: None,
                bank_details: None,
            },
        ))
        .await
        .unwrap();
    let id = response_json(response)
        .await
        .get("project_id")
        .unwrap()
        .as_u64()
        .unwrap();

    assert_eq!(
        donate(&app, &donor, id, 100, false).await.status(),
        StatusCode::FORBIDDEN
    );
    assert!(crate::project::DONATIONS.inner().read().is_empty());
}

#[serial]
#[tokio::test]
async fn the_ledger_stays_private() {
    reset_all();

    let app = crate::router();
    let (owner, admin, id) = funded_fixture(&app).await;
    let donor = push_account("donor@example.org", Role::Donor);

    assert_eq!(
        donate(&app, &donor, id, 300, false).await.status(),
        StatusCode::OK
    );

    // donors cannot read the ledger, even their own entries
    assert_eq!(
        app.clone()
            .oneshot(post_json(
                "/api/project/get-donations",
                &donor,
                &GetDonationsDescriptor { project: id },
            ))
            .await
            .unwrap()
            .status(),
        StatusCode::FORBIDDEN
    );

    for auth in [&owner, &admin] {
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/project/get-donations",
                auth,
                &GetDonationsDescriptor { project: id },
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        let donations = json.get("donations").unwrap().as_array().unwrap();
        assert_eq!(donations.len(), 1);
        assert_eq!(donations[0].get("amount").unwrap().as_u64().unwrap(), 300);
    }
}
