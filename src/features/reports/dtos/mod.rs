mod report_dto;

pub use report_dto::{
    group_by_local_day, resolve_event_date, CalendarQueryParams, CreateReportDto, ReportExportRowDto,
    ReportFilter, ReportQueryParams, ReportResponseDto, ReportSortField, SortDirection,
    UpdateReportDto,
};
