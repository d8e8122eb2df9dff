use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use loyalty_core::{AccountId, ClientId};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route(
            "/clients/:client_id/accounts",
            post(create_account).get(list_accounts),
        )
        .route("/clients/:client_id/accounts/:account_id", get(get_account))
}

pub async fn create_account(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Path(client_id): Path<String>,
    Json(body): Json<dto::CreateAccountRequest>,
) -> axum::response::Response {
    let client_id: ClientId = match errors::parse_param(&client_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services
        .directory()
        .create_account(actor.actor(), client_id, body.account_name)
        .await
    {
        Ok((account_id, account)) => (
            StatusCode::CREATED,
            Json(dto::account_to_json(account_id, &account)),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_accounts(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Path(client_id): Path<String>,
) -> axum::response::Response {
    let client_id: ClientId = match errors::parse_param(&client_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.directory().list_accounts(actor.actor(), client_id).await {
        Ok(accounts) => {
            let items = accounts
                .iter()
                .map(|(id, account)| dto::account_to_json(*id, account))
                .collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_account(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Path((client_id, account_id)): Path<(String, String)>,
) -> axum::response::Response {
    let client_id: ClientId = match errors::parse_param(&client_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let account_id: AccountId = match errors::parse_param(&account_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services
        .directory()
        .get_account(actor.actor(), client_id, account_id)
        .await
    {
        Ok(account) => (StatusCode::OK, Json(dto::account_to_json(account_id, &account))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
