use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, AppQuery};
use crate::features::reports::dtos::{
    group_by_local_day, CalendarQueryParams, CreateReportDto, ReportExportRowDto,
    ReportQueryParams, ReportResponseDto, UpdateReportDto,
};
use crate::features::reports::models::CreateReport;
use crate::features::reports::services::ReportService;
use crate::shared::datetime::local_month_range;
use crate::shared::types::{ApiResponse, Meta};

/// Create a new report
#[utoipa::path(
    post,
    path = "/api/reports",
    request_body = CreateReportDto,
    responses(
        (status = 201, description = "Report created successfully", body = ApiResponse<ReportResponseDto>),
        (status = 400, description = "Validation error")
    ),
    tag = "reports"
)]
pub async fn create_report(
    State(service): State<Arc<ReportService>>,
    AppJson(dto): AppJson<CreateReportDto>,
) -> Result<(StatusCode, Json<ApiResponse<ReportResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let date = dto.resolved_date()?.unwrap_or_else(Utc::now);
    let data = CreateReport {
        location: dto.location,
        problem: dto.problem,
        solve: dto.solve,
        description: dto.description,
        images: dto.images,
        date,
        status: dto.status.unwrap_or_default(),
        priority: dto.priority.unwrap_or_default(),
    };

    let report = service.create(data).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(report.into()), None, None)),
    ))
}

/// List reports with filtering, sorting and pagination
#[utoipa::path(
    get,
    path = "/api/reports",
    params(ReportQueryParams),
    responses(
        (status = 200, description = "One page of matching reports", body = ApiResponse<Vec<ReportResponseDto>>),
        (status = 400, description = "Invalid query parameters")
    ),
    tag = "reports"
)]
pub async fn list_reports(
    State(service): State<Arc<ReportService>>,
    AppQuery(params): AppQuery<ReportQueryParams>,
) -> Result<Json<ApiResponse<Vec<ReportResponseDto>>>> {
    let filter = params.filter()?;
    let (reports, total) = service
        .list(
            &filter,
            params.sort,
            params.order,
            params.limit(),
            params.offset(),
        )
        .await?;

    let dtos: Vec<ReportResponseDto> = reports.into_iter().map(|r| r.into()).collect();
    Ok(Json(ApiResponse::success(
        Some(dtos),
        None,
        Some(Meta::paginated(total, params.page(), params.limit())),
    )))
}

/// Reports of one month grouped by local calendar day
#[utoipa::path(
    get,
    path = "/api/reports/calendar",
    params(CalendarQueryParams),
    responses(
        (status = 200, description = "Reports keyed by local day (YYYY-MM-DD)", body = ApiResponse<BTreeMap<String, Vec<ReportResponseDto>>>),
        (status = 400, description = "Invalid month or timezone")
    ),
    tag = "reports"
)]
pub async fn calendar_reports(
    State(service): State<Arc<ReportService>>,
    AppQuery(params): AppQuery<CalendarQueryParams>,
) -> Result<Json<ApiResponse<BTreeMap<String, Vec<ReportResponseDto>>>>> {
    let zone = params.zone()?;
    let (year, month) = params.year_month()?;
    let (start, end) = local_month_range(year, month, zone)?;

    let reports = service.list_between(start, end).await?;
    let days = group_by_local_day(reports, zone);

    Ok(Json(ApiResponse::success(Some(days), None, None)))
}

/// Export the filtered set as a downloadable JSON document
#[utoipa::path(
    get,
    path = "/api/reports/export",
    params(ReportQueryParams),
    responses(
        (status = 200, description = "All matching reports with localized display columns", body = Vec<ReportExportRowDto>),
        (status = 400, description = "Invalid query parameters")
    ),
    tag = "reports"
)]
pub async fn export_reports(
    State(service): State<Arc<ReportService>>,
    AppQuery(params): AppQuery<ReportQueryParams>,
) -> Result<impl IntoResponse> {
    let zone = params.zone()?;
    let filter = params.filter()?;

    let reports = service.list_all(&filter, params.sort, params.order).await?;
    let rows: Vec<ReportExportRowDto> = reports
        .into_iter()
        .map(|r| ReportExportRowDto::from_report(r, zone))
        .collect();

    Ok((
        [(
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"reports-export.json\"",
        )],
        Json(rows),
    ))
}

/// Get report by ID
#[utoipa::path(
    get,
    path = "/api/reports/{id}",
    params(
        ("id" = Uuid, Path, description = "Report ID")
    ),
    responses(
        (status = 200, description = "Report found", body = ApiResponse<ReportResponseDto>),
        (status = 404, description = "Report not found")
    ),
    tag = "reports"
)]
pub async fn get_report(
    State(service): State<Arc<ReportService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ReportResponseDto>>> {
    let report = service.get_by_id(id).await?;
    Ok(Json(ApiResponse::success(Some(report.into()), None, None)))
}

/// Update a report in place (partial update)
#[utoipa::path(
    put,
    path = "/api/reports/{id}",
    params(
        ("id" = Uuid, Path, description = "Report ID")
    ),
    request_body = UpdateReportDto,
    responses(
        (status = 200, description = "Report updated", body = ApiResponse<ReportResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Report not found")
    ),
    tag = "reports"
)]
pub async fn update_report(
    State(service): State<Arc<ReportService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateReportDto>,
) -> Result<Json<ApiResponse<ReportResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let report = service.update(id, dto.into_changes()?).await?;
    Ok(Json(ApiResponse::success(Some(report.into()), None, None)))
}

/// Delete a report (hard delete)
#[utoipa::path(
    delete,
    path = "/api/reports/{id}",
    params(
        ("id" = Uuid, Path, description = "Report ID")
    ),
    responses(
        (status = 200, description = "Report deleted"),
        (status = 404, description = "Report not found")
    ),
    tag = "reports"
)]
pub async fn delete_report(
    State(service): State<Arc<ReportService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Report deleted successfully".to_string()),
        None,
    )))
}
