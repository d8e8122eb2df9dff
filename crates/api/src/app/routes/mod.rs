use axum::{Router, routing::get};

pub mod accounts;
pub mod audit_logs;
pub mod circle;
pub mod clients;
pub mod groups;
pub mod ledger;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .merge(clients::router())
        .merge(accounts::router())
        .merge(ledger::router())
        .merge(circle::router())
        .merge(groups::router())
        .merge(audit_logs::router())
}
