use crate::account::{self, Account};
use crate::{Error, RequirePermissionContext};
use axum::Json;
use serde_json::json;

use volunet_shared::account::handle::*;
use volunet_shared::account::Role;

/// Register a new, unverified account.
///
/// The account stays unable to act until an admin verifies it.
pub async fn register(
    Json(descriptor): Json<RegisterDescriptor>,
) -> Result<Json<serde_json::Value>, Error> {
    if matches!(descriptor.role, Role::Admin) {
        return Err(Error::Validation(
            "cannot register an admin account".to_string(),
        ));
    }

    let account = Account::new(
        descriptor.email,
        descriptor.name,
        descriptor.role,
        &descriptor.password,
        false,
    )?;

    if account::INSTANCE.contains_id(account.id) {
        return Err(Error::EmailRegistered);
    }

    tracing::info!("account {} registered as {:?}", account.id, descriptor.role);

    account.save();
    let id = account.id;
    account::INSTANCE.push(account);

    Ok(Json(json!({ "account_id": id })))
}

pub async fn login(
    Json(descriptor): Json<LoginDescriptor>,
) -> Result<Json<serde_json::Value>, Error> {
    let id = account::id_from_email(&descriptor.email);
    let accounts = account::INSTANCE.inner().read();
    let index = account::INSTANCE
        .index()
        .get(&id)
        .map(|e| *e.value())
        .ok_or(Error::EmailOrPasswordIncorrect)?;
    let mut account = accounts
        .get(index)
        .ok_or(Error::EmailOrPasswordIncorrect)?
        .write();

    if account.attributes.blocked {
        return Err(Error::AccountBlocked);
    }

    let token = account.login(&descriptor.password)?;
    account.save();

    Ok(Json(json!({ "account_id": id, "token": token })))
}

pub async fn logout(ctx: RequirePermissionContext) -> Result<Json<serde_json::Value>, Error> {
    let accounts = account::INSTANCE.inner().read();
    let index = account::INSTANCE
        .index()
        .get(&ctx.account_id)
        .map(|e| *e.value())
        .ok_or(Error::AccountNotFound)?;
    let mut account = accounts.get(index).ok_or(Error::AccountNotFound)?.write();

    account.logout(&ctx.token)?;
    account.save();

    Ok(Json(json!({})))
}

/// View the acting account's own metadata. Available to blocked and
/// unverified accounts so they can inspect their state.
pub async fn view_account(ctx: RequirePermissionContext) -> Result<Json<serde_json::Value>, Error> {
    let metadata = ctx.metadata()?;
    Ok(Json(json!({ "metadata": metadata })))
}

pub mod manage {
    use crate::account::{self, Account};
    use crate::{Error, RequirePermissionContext};
    use axum::Json;
    use serde_json::json;

    use volunet_shared::account::handle::manage::*;
    use volunet_shared::account::Role;

    /// Create a pre-verified account with any role.
    pub async fn make_account(
        ctx: RequirePermissionContext,
        Json(descriptor): Json<MakeAccountDescriptor>,
    ) -> Result<Json<serde_json::Value>, Error> {
        if !matches!(ctx.valid()?, Role::Admin) {
            return Err(Error::PermissionDenied);
        }

        let account = Account::new(
            descriptor.email,
            descriptor.name,
            descriptor.role,
            &descriptor.password,
            true,
        )?;

        if account::INSTANCE.contains_id(account.id) {
            return Err(Error::EmailRegistered);
        }

        tracing::info!(
            "account {} created by admin {}",
            account.id,
            ctx.account_id
        );

        account.save();
        let id = account.id;
        account::INSTANCE.push(account);

        Ok(Json(json!({ "account_id": id })))
    }

    pub async fn view_accounts(
        ctx: RequirePermissionContext,
        Json(descriptor): Json<ViewAccountDescriptor>,
    ) -> Result<Json<serde_json::Value>, Error> {
        if !matches!(ctx.valid()?, Role::Admin) {
            return Err(Error::PermissionDenied);
        }

        let accounts = account::INSTANCE.inner().read();
        let mut results = Vec::new();

        for id in descriptor.accounts {
            results.push(
                match account::INSTANCE
                    .index()
                    .get(&id)
                    .and_then(|index| accounts.get(*index.value()))
                {
                    Some(account) => ViewAccountResult::Ok(account.read().metadata()),
                    None => ViewAccountResult::NotFound(id),
                },
            );
        }

        Ok(Json(json!({ "results": results })))
    }

    /// Apply modify variants to the target account: verify, block,
    /// rename or change role.
    pub async fn modify_account(
        ctx: RequirePermissionContext,
        Json(descriptor): Json<ModifyAccountDescriptor>,
    ) -> Result<Json<serde_json::Value>, Error> {
        if !matches!(ctx.valid()?, Role::Admin) {
            return Err(Error::PermissionDenied);
        }

        let accounts = account::INSTANCE.inner().read();
        let index = account::INSTANCE
            .index()
            .get(&descriptor.account)
            .map(|e| *e.value())
            .ok_or(Error::AccountNotFound)?;
        let mut account = accounts.get(index).ok_or(Error::AccountNotFound)?.write();

        // stage the edits so a failing variant leaves the account untouched
        let mut staged = account.attributes.clone();
        for variant in descriptor.variants {
            match variant {
                ModifyAccountVariant::SetBlocked(blocked) => staged.blocked = blocked,
                ModifyAccountVariant::SetName(name) => {
                    if name.is_empty() {
                        return Err(Error::Validation("name could not be empty".to_string()));
                    }
                    staged.name = name
                }
                ModifyAccountVariant::SetRole(role) => staged.role = role,
                ModifyAccountVariant::SetVerified(verified) => staged.verified = verified,
            }
        }
        account.attributes = staged;

        tracing::info!(
            "account {} modified by admin {}",
            account.id,
            ctx.account_id
        );

        account.save();

        Ok(Json(json!({})))
    }
}
