use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use loyalty_infra::query::{AuditFilter, PageRequest};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new().route("/audit-logs", get(list_audit_records))
}

pub async fn list_audit_records(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Query(query): Query<dto::AuditListQuery>,
) -> axum::response::Response {
    let mut filter = AuditFilter::default();
    if let Some(s) = &query.action {
        filter.action = match errors::parse_param(s) {
            Ok(v) => Some(v),
            Err(resp) => return resp,
        };
    }
    if let Some(s) = &query.resource_type {
        filter.resource_type = match errors::parse_param(s) {
            Ok(v) => Some(v),
            Err(resp) => return resp,
        };
    }
    if let Some(s) = &query.client_id {
        filter.client_id = match errors::parse_param(s) {
            Ok(v) => Some(v),
            Err(resp) => return resp,
        };
    }
    if let Some(s) = &query.account_id {
        filter.account_id = match errors::parse_param(s) {
            Ok(v) => Some(v),
            Err(resp) => return resp,
        };
    }
    if let Some(s) = &query.group_id {
        filter.group_id = match errors::parse_param(s) {
            Ok(v) => Some(v),
            Err(resp) => return resp,
        };
    }
    if let Some(s) = &query.transaction_id {
        filter.transaction_id = match errors::parse_param(s) {
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

    match services.queries().audit_records(actor.actor(), filter, page).await {
        Ok(result) => (
            StatusCode::OK,
            Json(dto::page_to_json(&result, dto::audit_record_to_json)),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
