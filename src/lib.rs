use axum::{async_trait, http::StatusCode, response::IntoResponse, routing::post};
use serde::Serialize;
use volunet_shared::account::Role;
use volunet_shared::project::{ModerationStatus, ProjectStatus};
use volunet_shared::task::{ApplicationStatus, TaskStatus};

pub mod config;

pub mod account;
pub mod policy;
pub mod project;
pub mod task;

/// The module for unit testing, will only be availabled in dev env.
#[cfg(test)]
mod tests;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("target account not found")]
    AccountNotFound,
    #[error("target project not found")]
    ProjectNotFound,
    #[error("target task not found")]
    TaskNotFound,
    #[error("target application not found")]
    ApplicationNotFound,

    #[error("not logged in")]
    NotLoggedIn,
    #[error("non-ascii header value: {0}")]
    HeaderNonAscii(axum::http::header::ToStrError),
    #[error("auth headers missing or malformed")]
    InvalidAuthHeader,

    #[error("permission denied")]
    PermissionDenied,
    #[error("account has not been verified")]
    AccountUnverified,
    #[error("account is blocked")]
    AccountBlocked,
    #[error("email or password incorrect")]
    EmailOrPasswordIncorrect,
    #[error("email already registered")]
    EmailRegistered,

    #[error("{0}")]
    Validation(String),

    #[error("id conflicted")]
    Conflict,
    #[error("illegal stage change from {0:?} to {1:?}")]
    InvalidTransition(ProjectStatus, ProjectStatus),
    #[error("project has already been moderated: {0:?}")]
    AlreadyModerated(ModerationStatus),
    #[error("application has already been reviewed: {0:?}")]
    AlreadyReviewed(ApplicationStatus),
    #[error("volunteer already applied to this project")]
    DuplicateApplication,
    #[error("volunteer has no approved application for this project")]
    VolunteerNotEligible,
    #[error("project is not accepting donations")]
    ProjectNotAcceptingFunds,
    #[error("task is not in status {0:?}")]
    TaskNotInStatus(TaskStatus),
    #[error("task is already completed")]
    TaskAlreadyCompleted,
}

impl Error {
    pub fn to_status_code(&self) -> StatusCode {
        match self {
            Error::AccountNotFound
            | Error::ProjectNotFound
            | Error::TaskNotFound
            | Error::ApplicationNotFound => StatusCode::NOT_FOUND,

            Error::NotLoggedIn => StatusCode::UNAUTHORIZED,
            Error::HeaderNonAscii(_) | Error::InvalidAuthHeader => StatusCode::BAD_REQUEST,

            Error::Validation(_) => StatusCode::BAD_REQUEST,

            Error::EmailRegistered
            | Error::Conflict
            | Error::InvalidTransition(_, _)
            | Error::AlreadyModerated(_)
            | Error::AlreadyReviewed(_)
            | Error::DuplicateApplication
            | Error::VolunteerNotEligible
            | Error::ProjectNotAcceptingFunds
            | Error::TaskNotInStatus(_)
            | Error::TaskAlreadyCompleted => StatusCode::CONFLICT,

            _ => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for Error {
    #[inline]
    fn into_response(self) -> axum::response::Response {
        #[derive(Serialize)]
        struct ErrorInfo {
            error: String,
        }
        (
            self.to_status_code(),
            axum::Json(ErrorInfo {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Construct a router.
pub fn router() -> axum::Router {
    axum::Router::new()
        // account
        .route("/api/account/register", post(account::handle::register))
        .route("/api/account/login", post(account::handle::login))
        .route("/api/account/logout", post(account::handle::logout))
        .route("/api/account/view", post(account::handle::view_account))
        // account management
        .route(
            "/api/account/manage/create",
            post(account::handle::manage::make_account),
        )
        .route(
            "/api/account/manage/view",
            post(account::handle::manage::view_accounts),
        )
        .route(
            "/api/account/manage/modify",
            post(account::handle::manage::modify_account),
        )
        // projects
        .route("/api/project/create", post(project::handle::new_project))
        .route("/api/project/get", post(project::handle::get_projects))
        .route(
            "/api/project/get-info",
            post(project::handle::get_projects_info),
        )
        .route("/api/project/edit", post(project::handle::edit_project))
        .route("/api/project/delete", post(project::handle::delete_project))
        .route(
            "/api/project/moderate",
            post(project::handle::moderate_project),
        )
        // donations
        .route("/api/project/donate", post(project::handle::donate))
        .route(
            "/api/project/get-donations",
            post(project::handle::get_donations),
        )
        // tasks and volunteer workflow
        .route("/api/task/create", post(task::handle::new_task))
        .route("/api/task/get", post(task::handle::get_tasks))
        .route("/api/task/assign", post(task::handle::assign_task))
        .route("/api/task/submit-report", post(task::handle::submit_report))
        .route("/api/task/get-reports", post(task::handle::get_reports))
        .route("/api/application/create", post(task::handle::apply))
        .route("/api/application/mine", post(task::handle::my_applications))
        .route("/api/application/get", post(task::handle::get_applications))
        .route(
            "/api/application/review",
            post(task::handle::review_application),
        )
}

/// A context for checking the validation of action an account
/// performs, resolved from the `Token` and `AccountId` headers.
pub struct RequirePermissionContext {
    /// The access token of this account.
    pub token: String,
    /// The only id of this account.
    pub account_id: u64,
}

impl RequirePermissionContext {
    /// Indicates whether this context's token is valid and the
    /// account may act, returning the acting role.
    ///
    /// Blocked and unverified accounts hold a usable token but
    /// cannot perform any action.
    pub fn valid(&self) -> Result<Role, Error> {
        let metadata = self.metadata()?;
        if metadata.blocked {
            return Err(Error::AccountBlocked);
        }
        if !metadata.verified {
            return Err(Error::AccountUnverified);
        }
        Ok(metadata.role)
    }

    /// Metadata of the acting account, available even while the
    /// account is unverified so it can inspect its own state.
    pub fn metadata(&self) -> Result<volunet_shared::account::UserMetadata, Error> {
        account::INSTANCE.refresh(self.account_id);

        let accounts = account::INSTANCE.inner().read();
        let index = account::INSTANCE
            .index()
            .get(&self.account_id)
            .map(|e| *e.value())
            .ok_or(Error::AccountNotFound)?;
        let account = accounts.get(index).ok_or(Error::AccountNotFound)?.read();

        if !account.tokens.token_usable(&self.token) {
            return Err(Error::NotLoggedIn);
        }
        Ok(account.metadata())
    }
}

#[async_trait]
impl<S> axum::extract::FromRequestParts<S> for RequirePermissionContext {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get("Token")
            .ok_or(Error::InvalidAuthHeader)?
            .to_str()
            .map_err(Error::HeaderNonAscii)?
            .to_string();
        let account_id = parts
            .headers
            .get("AccountId")
            .ok_or(Error::InvalidAuthHeader)?
            .to_str()
            .map_err(Error::HeaderNonAscii)?
            .parse()
            .map_err(|_| Error::InvalidAuthHeader)?;

        let this = Self { token, account_id };

        // reject unusable tokens early so handlers can trust the id
        this.metadata()?;

        Ok(this)
    }
}
