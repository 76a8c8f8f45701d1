use utoipa::{Modify, OpenApi};

use crate::features::images::{dtos as images_dtos, handlers as images_handlers};
use crate::features::reports::{dtos as reports_dtos, handlers as reports_handlers};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Reports
        reports_handlers::report_handler::create_report,
        reports_handlers::report_handler::list_reports,
        reports_handlers::report_handler::calendar_reports,
        reports_handlers::report_handler::export_reports,
        reports_handlers::report_handler::get_report,
        reports_handlers::report_handler::update_report,
        reports_handlers::report_handler::delete_report,
        // Images
        images_handlers::image_handler::compress_images,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Reports
            reports_dtos::CreateReportDto,
            reports_dtos::UpdateReportDto,
            reports_dtos::ReportResponseDto,
            reports_dtos::ReportExportRowDto,
            reports_dtos::ReportSortField,
            reports_dtos::SortDirection,
            ApiResponse<reports_dtos::ReportResponseDto>,
            ApiResponse<Vec<reports_dtos::ReportResponseDto>>,
            // Images
            images_dtos::CompressImagesDto,
            images_dtos::CompressedImageDto,
            images_dtos::ImageOutcomeDto,
            ApiResponse<Vec<images_dtos::ImageOutcomeDto>>,
        )
    ),
    tags(
        (name = "reports", description = "Field report CRUD, listing, calendar and export"),
        (name = "images", description = "Client-upload image compression")
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
