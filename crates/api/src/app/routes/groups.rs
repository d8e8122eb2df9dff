use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};

use loyalty_core::{ClientId, GroupId};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route("/groups", post(create_group).get(list_groups))
        .route("/groups/:group_id", get(get_group))
        .route(
            "/clients/:client_id/groups/:group_id",
            put(join_group).delete(leave_group),
        )
}

pub async fn create_group(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Json(body): Json<dto::CreateGroupRequest>,
) -> axum::response::Response {
    match services
        .directory()
        .create_group(actor.actor(), body.name, body.description)
        .await
    {
        Ok((group_id, group)) => (
            StatusCode::CREATED,
            Json(dto::group_to_json(group_id, &group)),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_groups(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.directory().list_groups().await {
        Ok(groups) => {
            let items = groups
                .iter()
                .map(|(id, group)| dto::group_to_json(*id, group))
                .collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_group(
    Extension(services): Extension<Arc<AppServices>>,
    Path(group_id): Path<String>,
) -> axum::response::Response {
    let group_id: GroupId = match errors::parse_param(&group_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.directory().get_group(group_id).await {
        Ok(group) => (StatusCode::OK, Json(dto::group_to_json(group_id, &group))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn join_group(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Path(ids): Path<(String, String)>,
) -> axum::response::Response {
    membership_change(services, actor, ids, true).await
}

pub async fn leave_group(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Path(ids): Path<(String, String)>,
) -> axum::response::Response {
    membership_change(services, actor, ids, false).await
}

async fn membership_change(
    services: Arc<AppServices>,
    actor: ActorContext,
    (client_id, group_id): (String, String),
    join: bool,
) -> axum::response::Response {
    let client_id: ClientId = match errors::parse_param(&client_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let group_id: GroupId = match errors::parse_param(&group_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let result = if join {
        services.directory().join_group(actor.actor(), client_id, group_id).await
    } else {
        services.directory().leave_group(actor.actor(), client_id, group_id).await
    };

    match result {
        Ok(group_ids) => (
            StatusCode::OK,
            Json(serde_json::json!({ "affinity_group_ids": group_ids })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
