use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use loyalty_clients::ClientPatch;
use loyalty_core::ClientId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route("/clients", post(register_client))
        .route("/clients/:client_id", get(get_client).patch(update_client))
}

pub async fn register_client(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Json(body): Json<dto::RegisterClientRequest>,
) -> axum::response::Response {
    match services
        .directory()
        .register_client(actor.actor(), body.name, body.email, body.identity_document)
        .await
    {
        Ok(client) => (
            StatusCode::CREATED,
            Json(dto::client_to_json(actor.uid(), &client)),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_client(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Path(client_id): Path<String>,
) -> axum::response::Response {
    let client_id: ClientId = match errors::parse_param(&client_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.directory().get_client(actor.actor(), client_id).await {
        Ok(client) => (StatusCode::OK, Json(dto::client_to_json(client_id, &client))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_client(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Path(client_id): Path<String>,
    Json(patch): Json<ClientPatch>,
) -> axum::response::Response {
    let client_id: ClientId = match errors::parse_param(&client_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services
        .directory()
        .update_client(actor.actor(), client_id, patch)
        .await
    {
        Ok(client) => (StatusCode::OK, Json(dto::client_to_json(client_id, &client))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
