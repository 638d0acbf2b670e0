mod donation;
mod project;

use crate::account::{Account, Role};

/// Reset all static instances.
fn reset_all() {
    crate::account::INSTANCE.reset();
    crate::project::INSTANCE.reset();
    crate::project::DONATIONS.reset();
    crate::task::INSTANCE.reset();
    crate::task::APPLICATIONS.reset();
    crate::task::REPORTS.reset();
}

/// Push a verified account with the target role, returning its id
/// and a usable token.
fn push_account(email: &str, role: Role) -> (u64, String) {
    let mut account = Account::new(
        email.to_string(),
        "Test Account".to_string(),
        role,
        "password123456",
        true,
    )
    .unwrap();
    let token = account.tokens.new_token(account.id, 0);
    let id = account.id;
    crate::account::INSTANCE.push(account);
    (id, token)
}

/// Build an authenticated json POST request.
fn post_json(
    uri: &str,
    auth: &(u64, String),
    body: &impl serde::Serialize,
) -> hyper::Request<hyper::Body> {
    hyper::Request::builder()
        .uri(uri)
        .method("POST")
        .header(
            axum::http::header::CONTENT_TYPE,
            mime::APPLICATION_JSON.as_ref(),
        )
        .header("Token", &auth.1)
        .header("AccountId", auth.0)
        .body(serde_json::to_vec(body).unwrap().into())
        .unwrap()
}

/// Build an authenticated POST request without a body.
fn post_empty(uri: &str, auth: &(u64, String)) -> hyper::Request<hyper::Body> {
    hyper::Request::builder()
        .uri(uri)
        .method("POST")
        .header("Token", &auth.1)
        .header("AccountId", auth.0)
        .body(hyper::Body::empty())
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> serde_json::Value {
    serde_json::from_slice(&hyper::body::to_bytes(response.into_body()).await.unwrap()).unwrap()
}
