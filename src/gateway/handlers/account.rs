//! Account handlers

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use validator::Validate;

use super::super::state::AppState;
use super::super::types::{
    ApiError, ApiResult, CreateAccountRequest, ListAccountsRequest, error_codes, ok,
};
use crate::account::{
    Account, AccountId, CreateAccountParams, ListAccountsParams, OwnerName, parse_currency,
};
use crate::transfer::{Entry, StoreError};

pub(super) fn account_not_found(id: AccountId) -> ApiError {
    ApiError::not_found(error_codes::ACCOUNT_NOT_FOUND, format!("account {id} not found"))
}

fn check_id(id: AccountId) -> Result<(), ApiError> {
    if id < 1 {
        return Err(ApiError::bad_request(format!("invalid account id: {id}")));
    }
    Ok(())
}

/// POST /api/v1/accounts
///
/// New accounts start with a zero balance.
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateAccountRequest>,
) -> ApiResult<Account> {
    req.validate()?;
    let owner = OwnerName::new(&req.owner)?;
    let currency = parse_currency(&req.currency)?;

    let account = state
        .store()
        .create_account(&CreateAccountParams {
            owner: owner.into_inner(),
            balance: 0,
            currency,
        })
        .await?;

    tracing::info!(account_id = account.id, owner = %account.owner, currency = %currency, "Account created");
    ok(account)
}

/// GET /api/v1/accounts/{id}
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<AccountId>,
) -> ApiResult<Account> {
    check_id(id)?;
    match state.store().get_account(id).await {
        Ok(account) => ok(account),
        Err(StoreError::NotFound) => account_not_found(id).into_err(),
        Err(e) => Err(e.into()),
    }
}

/// GET /api/v1/accounts?owner=&page_id=&page_size=
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
    Query(req): Query<ListAccountsRequest>,
) -> ApiResult<Vec<Account>> {
    req.validate()?;
    let accounts = state
        .store()
        .list_accounts(&ListAccountsParams {
            owner: req.owner.clone(),
            limit: req.page_size,
            offset: req.offset(),
        })
        .await?;
    ok(accounts)
}

/// GET /api/v1/accounts/{id}/entries
pub async fn list_account_entries(
    State(state): State<Arc<AppState>>,
    Path(id): Path<AccountId>,
) -> ApiResult<Vec<Entry>> {
    check_id(id)?;
    let store = state.store();
    match store.get_account(id).await {
        Ok(_) => {}
        Err(StoreError::NotFound) => return account_not_found(id).into_err(),
        Err(e) => return Err(e.into()),
    }
    ok(store.list_entries(id).await?)
}
