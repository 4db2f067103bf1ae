//! Transfer handlers

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use validator::Validate;

use super::super::state::AppState;
use super::super::types::{ApiError, ApiResult, TransferRequest, error_codes, ok};
use super::account::account_not_found;
use crate::account::{Account, AccountId, Currency, parse_currency};
use crate::transfer::{StoreError, Transfer, TransferId, TransferParams, TransferResult};

/// Load an account and require it to hold `currency`
async fn valid_account(
    state: &AppState,
    id: AccountId,
    currency: Currency,
) -> Result<Account, ApiError> {
    let account = match state.store().get_account(id).await {
        Ok(account) => account,
        Err(StoreError::NotFound) => return Err(account_not_found(id)),
        Err(e) => return Err(e.into()),
    };

    if account.currency != currency {
        return Err(ApiError::new(
            axum::http::StatusCode::BAD_REQUEST,
            error_codes::CURRENCY_MISMATCH,
            format!(
                "account [{}] currency mismatch: {} vs {}",
                id, account.currency, currency
            ),
        ));
    }
    Ok(account)
}

/// POST /api/v1/transfers
///
/// Both accounts must exist and hold the request currency before the
/// transfer engine runs.
pub async fn create_transfer(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TransferRequest>,
) -> ApiResult<TransferResult> {
    req.validate()?;
    let currency = parse_currency(&req.currency)?;

    valid_account(&state, req.from_account_id, currency).await?;
    valid_account(&state, req.to_account_id, currency).await?;

    let params = TransferParams::new(req.from_account_id, req.to_account_id, req.amount);
    match state.coordinator.execute(params).await {
        Ok(result) => ok(result),
        Err(e) => {
            tracing::warn!(
                from = req.from_account_id,
                to = req.to_account_id,
                amount = req.amount,
                code = e.code(),
                "Transfer failed: {}",
                e
            );
            ApiError::from(e).into_err()
        }
    }
}

/// GET /api/v1/transfers/{id}
pub async fn get_transfer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TransferId>,
) -> ApiResult<Transfer> {
    match state.store().get_transfer(id).await {
        Ok(transfer) => ok(transfer),
        Err(StoreError::NotFound) => ApiError::not_found(
            error_codes::TRANSFER_NOT_FOUND,
            format!("transfer {id} not found"),
        )
        .into_err(),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::handlers::test_support::test_state;
    use axum::http::StatusCode;

    fn request(from: i64, to: i64, amount: i64, currency: &str) -> Json<TransferRequest> {
        Json(TransferRequest {
            from_account_id: from,
            to_account_id: to,
            amount,
            currency: currency.to_string(),
        })
    }

    #[tokio::test]
    async fn test_create_transfer_success() {
        let (state, store) = test_state(&[(100, Currency::Usd), (50, Currency::Usd)]).await;

        let (status, Json(body)) = create_transfer(State(state.clone()), request(1, 2, 30, "USD"))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::OK);
        let result = body.data.unwrap();
        assert_eq!(result.from_account.balance, 70);
        assert_eq!(result.to_account.balance, 80);

        let (_, Json(body)) = get_transfer(State(state), Path(result.transfer.id))
            .await
            .unwrap();
        assert_eq!(body.data.unwrap().amount, 30);
        assert_eq!(store.transfer_count(), 1);
    }

    #[tokio::test]
    async fn test_create_transfer_shape_errors() {
        let (state, store) = test_state(&[(100, Currency::Usd), (50, Currency::Usd)]).await;
        for req in [
            request(0, 2, 10, "USD"),
            request(1, 2, 0, "USD"),
            request(1, 2, -5, "USD"),
            request(1, 2, 10, "XYZ"),
        ] {
            let err = create_transfer(State(state.clone()), req).await.unwrap_err();
            assert_eq!(err.status, StatusCode::BAD_REQUEST);
        }
        assert_eq!(store.begun_count(), 0);
    }

    #[tokio::test]
    async fn test_create_transfer_missing_account() {
        let (state, store) = test_state(&[(100, Currency::Usd)]).await;
        let err = create_transfer(State(state), request(1, 99, 10, "USD"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, error_codes::ACCOUNT_NOT_FOUND);
        assert_eq!(store.transfer_count(), 0);
    }

    #[tokio::test]
    async fn test_create_transfer_currency_mismatch() {
        let (state, store) = test_state(&[(100, Currency::Usd), (50, Currency::Eur)]).await;
        let err = create_transfer(State(state), request(1, 2, 10, "USD"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, error_codes::CURRENCY_MISMATCH);
        assert_eq!(store.begun_count(), 0);
    }

    #[tokio::test]
    async fn test_create_transfer_engine_errors() {
        let (state, _) = test_state(&[(10, Currency::Cad), (0, Currency::Cad)]).await;

        let err = create_transfer(State(state.clone()), request(1, 1, 5, "CAD"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err = create_transfer(State(state), request(1, 2, 50, "CAD"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.code, error_codes::INSUFFICIENT_BALANCE);
    }

    #[tokio::test]
    async fn test_get_transfer_not_found() {
        let (state, _) = test_state(&[]).await;
        let err = get_transfer(State(state), Path(1)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, error_codes::TRANSFER_NOT_FOUND);
    }
}
