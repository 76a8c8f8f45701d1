use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::reports::{handlers, services::ReportService};

pub fn routes(service: Arc<ReportService>) -> Router {
    Router::new()
        .route(
            "/api/reports",
            post(handlers::create_report).get(handlers::list_reports),
        )
        .route("/api/reports/calendar", get(handlers::calendar_reports))
        .route("/api/reports/export", get(handlers::export_reports))
        .route(
            "/api/reports/{id}",
            get(handlers::get_report)
                .put(handlers::update_report)
                .delete(handlers::delete_report),
        )
        .with_state(service)
}
