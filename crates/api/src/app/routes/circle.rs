use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};

use loyalty_circle::{CircleConfigPatch, RelationshipType};
use loyalty_core::{AccountId, ClientId};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route("/clients/:client_id/family-circle", get(view_circle))
        .route("/clients/:client_id/family-circle/members", post(add_member))
        .route(
            "/clients/:client_id/family-circle/members/:member_id",
            delete(remove_member),
        )
        .route(
            "/clients/:client_id/accounts/:account_id/family-circle-config",
            get(get_config).patch(update_config),
        )
}

pub async fn view_circle(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Path(client_id): Path<String>,
) -> axum::response::Response {
    let client_id: ClientId = match errors::parse_param(&client_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.directory().view_circle(actor.actor(), client_id).await {
        Ok(role) => (
            StatusCode::OK,
            Json(serde_json::json!({ "family_circle": role })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn add_member(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Path(client_id): Path<String>,
    Json(body): Json<dto::AddCircleMemberRequest>,
) -> axum::response::Response {
    let client_id: ClientId = match errors::parse_param(&client_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let member_id: ClientId = match errors::parse_param(&body.member_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services
        .directory()
        .add_circle_member(
            actor.actor(),
            client_id,
            member_id,
            RelationshipType::new(body.relationship_type),
        )
        .await
    {
        Ok(member) => (StatusCode::OK, Json(dto::circle_member_to_json(&member))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn remove_member(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Path((client_id, member_id)): Path<(String, String)>,
) -> axum::response::Response {
    let client_id: ClientId = match errors::parse_param(&client_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let member_id: ClientId = match errors::parse_param(&member_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services
        .directory()
        .remove_circle_member(actor.actor(), client_id, member_id)
        .await
    {
        Ok(member) => (StatusCode::OK, Json(dto::circle_member_to_json(&member))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_config(
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
        .get_circle_config(actor.actor(), client_id, account_id)
        .await
    {
        Ok(config) => (StatusCode::OK, Json(dto::circle_config_to_json(&config))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_config(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Path((client_id, account_id)): Path<(String, String)>,
    Json(patch): Json<CircleConfigPatch>,
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
        .update_circle_config(actor.actor(), client_id, account_id, patch)
        .await
    {
        Ok(config) => (StatusCode::OK, Json(dto::circle_config_to_json(&config))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
