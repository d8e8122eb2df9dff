use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use loyalty_core::{AccountId, ClientId};
use loyalty_infra::executor::LedgerCommand;
use loyalty_infra::query::{PageRequest, TransactionFilter};
use loyalty_ledger::TransactionType;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route("/clients/:client_id/accounts/:account_id/credit", post(credit))
        .route("/clients/:client_id/accounts/:account_id/debit", post(debit))
        .route(
            "/clients/:client_id/accounts/:account_id/transactions",
            get(list_transactions),
        )
}

pub async fn credit(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Path(ids): Path<(String, String)>,
    Json(body): Json<dto::MovePointsRequest>,
) -> axum::response::Response {
    move_points(services, actor, ids, TransactionType::Credit, body).await
}

pub async fn debit(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Path(ids): Path<(String, String)>,
    Json(body): Json<dto::MovePointsRequest>,
) -> axum::response::Response {
    move_points(services, actor, ids, TransactionType::Debit, body).await
}

async fn move_points(
    services: Arc<AppServices>,
    actor: ActorContext,
    (client_id, account_id): (String, String),
    transaction_type: TransactionType,
    body: dto::MovePointsRequest,
) -> axum::response::Response {
    let client_id: ClientId = match errors::parse_param(&client_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let account_id: AccountId = match errors::parse_param(&account_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let command = LedgerCommand {
        client_id,
        account_id,
        transaction_type,
        amount: body.amount,
        description: body.description.unwrap_or_default(),
    };

    match services.executor().execute(actor.actor(), command).await {
        Ok(receipt) => (
            StatusCode::OK,
            Json(serde_json::json!({ "points": receipt.balance_after })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_transactions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Path((client_id, account_id)): Path<(String, String)>,
    Query(query): Query<dto::TransactionListQuery>,
) -> axum::response::Response {
    let client_id: ClientId = match errors::parse_param(&client_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let account_id: AccountId = match errors::parse_param(&account_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let mut filter = TransactionFilter::default();
    if let Some(s) = &query.transaction_type {
        filter.transaction_type = match errors::parse_transaction_type(s) {
            Ok(v) => Some(v),
            Err(resp) => return resp,
        };
    }
    if let Some(s) = &query.start_date {
        filter.start_date = match errors::parse_date(s, "start_date") {
            Ok(v) => Some(v),
            Err(resp) => return resp,
        };
    }
    if let Some(s) = &query.end_date {
        filter.end_date = match errors::parse_date(s, "end_date") {
            Ok(v) => Some(v),
            Err(resp) => return resp,
        };
    }

    let page = match PageRequest::new(query.limit, query.next_cursor) {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services
        .queries()
        .transactions(actor.actor(), client_id, account_id, filter, page)
        .await
    {
        Ok(result) => (
            StatusCode::OK,
            Json(dto::page_to_json(&result, dto::transaction_to_json)),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
