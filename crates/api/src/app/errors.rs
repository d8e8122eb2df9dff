use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use serde_json::json;

use loyalty_core::DomainError;
use loyalty_infra::error::ServiceError;
use loyalty_ledger::TransactionType;

/// Map a service failure onto the wire error taxonomy.
///
/// Store faults are the one class the caller cannot act on; they are logged
/// and collapsed to an opaque 500.
pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Domain(e) => domain_error_to_response(e),
        ServiceError::Store(e) => {
            tracing::error!("store failure: {e}");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", "internal error")
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let (status, code) = match &err {
        DomainError::Validation(_) | DomainError::InvalidId(_) => {
            (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
        }
        DomainError::CannotAddSelf => (StatusCode::BAD_REQUEST, "CANNOT_ADD_SELF"),
        DomainError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
        DomainError::PermissionDenied(_) => (StatusCode::FORBIDDEN, "PERMISSION_DENIED"),
        DomainError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        DomainError::InsufficientBalance { .. } => (StatusCode::CONFLICT, "INSUFFICIENT_BALANCE"),
        DomainError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
        DomainError::MemberAlreadyInCircle => (StatusCode::CONFLICT, "MEMBER_ALREADY_IN_CIRCLE"),
    };
    json_error(status, code, err.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Parse a path or query parameter whose `FromStr` failure is a domain error.
pub fn parse_param<T>(value: &str) -> Result<T, axum::response::Response>
where
    T: std::str::FromStr<Err = DomainError>,
{
    value.parse().map_err(domain_error_to_response)
}

pub fn parse_transaction_type(s: &str) -> Result<TransactionType, axum::response::Response> {
    match s {
        "credit" => Ok(TransactionType::Credit),
        "debit" => Ok(TransactionType::Debit),
        _ => Err(json_error(
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            "transaction_type must be one of: credit, debit",
        )),
    }
}

pub fn parse_date(s: &str, field: &'static str) -> Result<DateTime<Utc>, axum::response::Response> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|_| {
            json_error(
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                format!("{field} must be an RFC3339 timestamp"),
            )
        })
}
