use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::reports::models::{Report, ReportPriority, ReportStatus, UpdateReport};
use crate::shared::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::shared::datetime::{
    self, format_for_display, local_day_range, local_input_to_utc, parse_time_zone,
};
use crate::shared::validation::{DATE_REGEX, TIME_REGEX};

// Sort direction
#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Desc,
    Asc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Allow-listed sort fields for report listings. Anything outside this enum
/// is rejected at query deserialization.
#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReportSortField {
    #[default]
    Date,
    Location,
    Status,
    Priority,
    #[serde(alias = "createdAt")]
    CreatedAt,
    #[serde(alias = "updatedAt")]
    UpdatedAt,
}

impl ReportSortField {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ReportSortField::Date => "date",
            ReportSortField::Location => "location",
            ReportSortField::Status => "status",
            ReportSortField::Priority => "priority",
            ReportSortField::CreatedAt => "created_at",
            ReportSortField::UpdatedAt => "updated_at",
        }
    }
}

// Helper functions for defaults
fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

/// Typed filter over the report collection; all fields optional, combined
/// with AND. Built once from query params, converted to SQL by the service's
/// mapping function.
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub search: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: Option<ReportStatus>,
    pub priority: Option<ReportPriority>,
}

// Query params for listing reports
#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
pub struct ReportQueryParams {
    /// Page number (1-indexed; values below 1 are clamped to 1)
    #[serde(default = "default_page")]
    #[param(minimum = 1)]
    pub page: i64,

    /// Items per page (clamped to 1..=100)
    #[serde(default = "default_page_size")]
    #[param(minimum = 1, maximum = 100)]
    pub limit: i64,

    /// Full-text search across location, problem and description
    pub search: Option<String>,

    /// Range lower bound: RFC 3339 instant, or YYYY-MM-DD local day start
    #[serde(default, alias = "startDate")]
    pub start_date: Option<String>,

    /// Range upper bound: RFC 3339 instant, or YYYY-MM-DD local day end
    #[serde(default, alias = "endDate")]
    pub end_date: Option<String>,

    /// Filter by exact status
    pub status: Option<ReportStatus>,

    /// Filter by exact priority
    pub priority: Option<ReportPriority>,

    /// IANA zone used to interpret bare YYYY-MM-DD range bounds (default UTC)
    pub timezone: Option<String>,

    /// Sort field (default: date)
    #[serde(default)]
    pub sort: ReportSortField,

    /// Sort direction (default: desc)
    #[serde(default)]
    pub order: SortDirection,
}

impl Default for ReportQueryParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            search: None,
            start_date: None,
            end_date: None,
            status: None,
            priority: None,
            timezone: None,
            sort: ReportSortField::default(),
            order: SortDirection::default(),
        }
    }
}

impl ReportQueryParams {
    /// Clamped page number
    pub fn page(&self) -> i64 {
        self.page.max(1)
    }

    /// Calculate SQL OFFSET from page number
    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }

    /// Get clamped limit (respects MAX_PAGE_SIZE)
    pub fn limit(&self) -> i64 {
        self.limit.clamp(1, MAX_PAGE_SIZE)
    }

    pub fn zone(&self) -> Result<Tz> {
        match &self.timezone {
            Some(name) => Ok(parse_time_zone(name)?),
            None => Ok(chrono_tz::UTC),
        }
    }

    /// Build the typed filter, expanding bare dates to local-day bounds.
    pub fn filter(&self) -> Result<ReportFilter> {
        let zone = self.zone()?;

        let start_date = self
            .start_date
            .as_deref()
            .map(|raw| parse_range_bound(raw, zone, false))
            .transpose()?;
        let end_date = self
            .end_date
            .as_deref()
            .map(|raw| parse_range_bound(raw, zone, true))
            .transpose()?;

        Ok(ReportFilter {
            search: self
                .search
                .as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            start_date,
            end_date,
            status: self.status,
            priority: self.priority,
        })
    }
}

/// A range bound is either an exact instant or a whole local calendar day.
fn parse_range_bound(raw: &str, zone: Tz, end_of_day: bool) -> Result<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.with_timezone(&Utc));
    }

    if DATE_REGEX.is_match(raw) {
        let (start, end) = local_day_range(raw, zone)?;
        return Ok(if end_of_day { end } else { start });
    }

    Err(AppError::InvalidDate(format!(
        "invalid date filter '{}', expected RFC 3339 or YYYY-MM-DD",
        raw
    )))
}

/// Resolve the report event date from request fields.
///
/// `date` is either an RFC 3339 instant (stored as-is) or a bare YYYY-MM-DD
/// wall-clock date combined with `time` and an IANA `timezone` and converted
/// through the tzdb. Returns `None` when no date was supplied.
pub fn resolve_event_date(
    date: Option<&str>,
    time: Option<&str>,
    timezone: Option<&str>,
) -> Result<Option<DateTime<Utc>>> {
    let Some(date) = date else {
        if time.is_some() {
            return Err(AppError::InvalidDate(
                "time requires a date to apply to".to_string(),
            ));
        }
        return Ok(None);
    };

    if let Ok(instant) = DateTime::parse_from_rfc3339(date) {
        if time.is_some() {
            return Err(AppError::InvalidDate(
                "time cannot be combined with an exact instant".to_string(),
            ));
        }
        return Ok(Some(instant.with_timezone(&Utc)));
    }

    let zone = match timezone {
        Some(name) => parse_time_zone(name)?,
        None => chrono_tz::UTC,
    };
    let instant = local_input_to_utc(date, time.unwrap_or("00:00"), zone)?;
    Ok(Some(instant))
}

// Create request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateReportDto {
    #[validate(length(min = 1, message = "location is required"))]
    pub location: String,

    #[validate(length(min = 1, message = "problem is required"))]
    pub problem: String,

    #[validate(length(min = 1, message = "solve is required"))]
    pub solve: String,

    pub description: Option<String>,

    /// Encoded-image strings; insertion order is display order
    #[serde(default)]
    pub images: Vec<String>,

    /// RFC 3339 instant, or YYYY-MM-DD combined with `time`/`timezone`.
    /// Defaults to now when omitted.
    pub date: Option<String>,

    /// Wall-clock time (HH:MM) for a bare `date`
    #[validate(regex(path = *TIME_REGEX, message = "time must be HH:MM in 24-hour format"))]
    pub time: Option<String>,

    /// IANA timezone the wall-clock input was entered in (default UTC)
    pub timezone: Option<String>,

    pub status: Option<ReportStatus>,

    pub priority: Option<ReportPriority>,
}

impl CreateReportDto {
    pub fn resolved_date(&self) -> Result<Option<DateTime<Utc>>> {
        resolve_event_date(
            self.date.as_deref(),
            self.time.as_deref(),
            self.timezone.as_deref(),
        )
    }
}

// Update request; every field optional, partial-update semantics
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateReportDto {
    #[validate(length(min = 1, message = "location cannot be empty"))]
    pub location: Option<String>,

    #[validate(length(min = 1, message = "problem cannot be empty"))]
    pub problem: Option<String>,

    #[validate(length(min = 1, message = "solve cannot be empty"))]
    pub solve: Option<String>,

    pub description: Option<String>,

    pub images: Option<Vec<String>>,

    pub date: Option<String>,

    #[validate(regex(path = *TIME_REGEX, message = "time must be HH:MM in 24-hour format"))]
    pub time: Option<String>,

    pub timezone: Option<String>,

    pub status: Option<ReportStatus>,

    pub priority: Option<ReportPriority>,
}

impl UpdateReportDto {
    pub fn into_changes(self) -> Result<UpdateReport> {
        let date = resolve_event_date(
            self.date.as_deref(),
            self.time.as_deref(),
            self.timezone.as_deref(),
        )?;

        Ok(UpdateReport {
            location: self.location,
            problem: self.problem,
            solve: self.solve,
            description: self.description,
            images: self.images,
            date,
            status: self.status,
            priority: self.priority,
        })
    }
}

// Query params for the calendar view
#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
pub struct CalendarQueryParams {
    /// Calendar month to cover (YYYY-MM)
    pub month: String,

    /// IANA zone whose calendar days group the reports (default UTC)
    pub timezone: Option<String>,
}

impl CalendarQueryParams {
    pub fn zone(&self) -> Result<Tz> {
        match &self.timezone {
            Some(name) => Ok(parse_time_zone(name)?),
            None => Ok(chrono_tz::UTC),
        }
    }

    /// Parse YYYY-MM into (year, month)
    pub fn year_month(&self) -> Result<(i32, u32)> {
        let first = chrono::NaiveDate::parse_from_str(&format!("{}-01", self.month), "%Y-%m-%d")
            .map_err(|_| {
                AppError::InvalidDate(format!("invalid month '{}', expected YYYY-MM", self.month))
            })?;
        Ok((first.year(), first.month()))
    }
}

// Response DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportResponseDto {
    pub id: Uuid,
    pub location: String,
    pub problem: String,
    pub solve: String,
    pub description: Option<String>,
    pub images: Vec<String>,
    pub date: DateTime<Utc>,
    pub status: ReportStatus,
    pub priority: ReportPriority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Report> for ReportResponseDto {
    fn from(r: Report) -> Self {
        Self {
            id: r.id,
            location: r.location,
            problem: r.problem,
            solve: r.solve,
            description: r.description,
            images: r.images,
            date: r.date,
            status: r.status,
            priority: r.priority,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Export row: raw UTC instant plus the display rendering in the
/// requested zone
#[derive(Debug, Serialize, ToSchema)]
pub struct ReportExportRowDto {
    pub id: Uuid,
    pub location: String,
    pub problem: String,
    pub solve: String,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    pub local_date: String,
    pub local_time: String,
    pub status: ReportStatus,
    pub priority: ReportPriority,
    pub created_at: DateTime<Utc>,
}

impl ReportExportRowDto {
    pub fn from_report(r: Report, zone: Tz) -> Self {
        let display = format_for_display(r.date, zone);
        Self {
            id: r.id,
            location: r.location,
            problem: r.problem,
            solve: r.solve,
            description: r.description,
            date: r.date,
            local_date: display.date,
            local_time: display.time,
            status: r.status,
            priority: r.priority,
            created_at: r.created_at,
        }
    }
}

/// Group reports into calendar-day buckets keyed by the local date
/// (YYYY-MM-DD) in `zone`. BTreeMap keeps days in order; within a day the
/// incoming query order is preserved.
pub fn group_by_local_day(
    reports: Vec<Report>,
    zone: Tz,
) -> std::collections::BTreeMap<String, Vec<ReportResponseDto>> {
    let mut days: std::collections::BTreeMap<String, Vec<ReportResponseDto>> =
        std::collections::BTreeMap::new();
    for report in reports {
        let key = datetime::utc_to_local_input(report.date, zone).date;
        days.entry(key).or_default().push(report.into());
    }
    days
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::faker::lorem::en::Sentence;
    use fake::Fake;

    fn valid_create_dto() -> CreateReportDto {
        CreateReportDto {
            location: "Warehouse A".to_string(),
            problem: Sentence(3..6).fake(),
            solve: Sentence(3..6).fake(),
            description: Some(Sentence(5..10).fake()),
            images: vec![],
            date: Some("2024-01-15".to_string()),
            time: Some("14:30".to_string()),
            timezone: Some("America/New_York".to_string()),
            status: None,
            priority: None,
        }
    }

    #[test]
    fn test_create_dto_valid() {
        assert!(valid_create_dto().validate().is_ok());
    }

    #[test]
    fn test_create_dto_missing_location_names_field() {
        let dto = CreateReportDto {
            location: "".to_string(),
            ..valid_create_dto()
        };
        let err = dto.validate().unwrap_err();
        assert!(err.to_string().contains("location"));
    }

    #[test]
    fn test_create_dto_rejects_malformed_time() {
        let dto = CreateReportDto {
            time: Some("25:99".to_string()),
            ..valid_create_dto()
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_resolved_date_wall_clock_ny() {
        let dto = valid_create_dto();
        let instant = dto.resolved_date().unwrap().unwrap();
        assert_eq!(instant.to_rfc3339(), "2024-01-15T19:30:00+00:00");
    }

    #[test]
    fn test_resolve_event_date_rfc3339() {
        let instant = resolve_event_date(Some("2024-01-15T19:30:00Z"), None, None)
            .unwrap()
            .unwrap();
        assert_eq!(instant.to_rfc3339(), "2024-01-15T19:30:00+00:00");
    }

    #[test]
    fn test_resolve_event_date_defaults_to_midnight_utc() {
        let instant = resolve_event_date(Some("2024-01-15"), None, None)
            .unwrap()
            .unwrap();
        assert_eq!(instant.to_rfc3339(), "2024-01-15T00:00:00+00:00");
    }

    #[test]
    fn test_resolve_event_date_absent() {
        assert_eq!(resolve_event_date(None, None, None).unwrap(), None);
    }

    #[test]
    fn test_resolve_event_date_time_without_date() {
        assert!(resolve_event_date(None, Some("14:30"), None).is_err());
    }

    #[test]
    fn test_resolve_event_date_unknown_zone() {
        let err = resolve_event_date(Some("2024-01-15"), Some("14:30"), Some("Nope/Nowhere"))
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidDate(_)));
    }

    #[test]
    fn test_resolve_event_date_dst_gap() {
        let err = resolve_event_date(
            Some("2024-03-10"),
            Some("02:30"),
            Some("America/New_York"),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidDate(_)));
    }

    #[test]
    fn test_query_params_clamping() {
        let params = ReportQueryParams {
            page: -3,
            limit: 500,
            ..Default::default()
        };
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), MAX_PAGE_SIZE);
        assert_eq!(params.offset(), 0);

        let params = ReportQueryParams {
            page: 3,
            limit: 25,
            ..Default::default()
        };
        assert_eq!(params.offset(), 50);
    }

    #[test]
    fn test_query_params_filter_expands_bare_dates() {
        let params = ReportQueryParams {
            start_date: Some("2024-01-15".to_string()),
            end_date: Some("2024-01-15".to_string()),
            timezone: Some("America/New_York".to_string()),
            ..Default::default()
        };
        let filter = params.filter().unwrap();
        // The NY local day [00:00, 24:00) maps to 05:00Z..05:00Z next day
        assert_eq!(
            filter.start_date.unwrap().to_rfc3339(),
            "2024-01-15T05:00:00+00:00"
        );
        let event = local_input_to_utc("2024-01-15", "14:30", chrono_tz::America::New_York)
            .unwrap();
        assert!(filter.start_date.unwrap() <= event);
        assert!(event <= filter.end_date.unwrap());
    }

    #[test]
    fn test_query_params_filter_accepts_instants() {
        let params = ReportQueryParams {
            start_date: Some("2024-01-15T00:00:00Z".to_string()),
            ..Default::default()
        };
        let filter = params.filter().unwrap();
        assert_eq!(
            filter.start_date.unwrap().to_rfc3339(),
            "2024-01-15T00:00:00+00:00"
        );
    }

    #[test]
    fn test_query_params_filter_rejects_garbage_dates() {
        let params = ReportQueryParams {
            start_date: Some("next tuesday".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            params.filter(),
            Err(AppError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_query_params_blank_search_is_dropped() {
        let params = ReportQueryParams {
            search: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(params.filter().unwrap().search.is_none());
    }

    #[test]
    fn test_calendar_params() {
        let params = CalendarQueryParams {
            month: "2024-01".to_string(),
            timezone: Some("America/New_York".to_string()),
        };
        assert_eq!(params.year_month().unwrap(), (2024, 1));
        assert!(params.zone().is_ok());

        let bad = CalendarQueryParams {
            month: "January 2024".to_string(),
            timezone: None,
        };
        assert!(bad.year_month().is_err());
    }

    #[test]
    fn test_sort_field_sql_allow_list() {
        assert_eq!(ReportSortField::Date.as_sql(), "date");
        assert_eq!(ReportSortField::CreatedAt.as_sql(), "created_at");
        assert!(serde_json::from_str::<ReportSortField>("\"location\"").is_ok());
        assert!(serde_json::from_str::<ReportSortField>("\"createdAt\"").is_ok());
        // Unknown fields never reach the SQL layer
        assert!(serde_json::from_str::<ReportSortField>("\"images\"").is_err());
        assert!(serde_json::from_str::<ReportSortField>("\"; DROP TABLE\"").is_err());
    }

    #[test]
    fn test_group_by_local_day_splits_on_zone_boundary() {
        use crate::features::reports::models::{ReportPriority, ReportStatus};

        let make = |iso: &str| Report {
            id: Uuid::new_v4(),
            location: "Dock 4".to_string(),
            problem: "Leak".to_string(),
            solve: "Patched".to_string(),
            description: None,
            images: vec![],
            date: DateTime::parse_from_rfc3339(iso).unwrap().with_timezone(&Utc),
            status: ReportStatus::Pending,
            priority: ReportPriority::Medium,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        // 03:00Z is still Jan 14 in New York; 15:00Z is Jan 15
        let days = group_by_local_day(
            vec![make("2024-01-15T03:00:00Z"), make("2024-01-15T15:00:00Z")],
            chrono_tz::America::New_York,
        );
        assert_eq!(
            days.keys().cloned().collect::<Vec<_>>(),
            vec!["2024-01-14".to_string(), "2024-01-15".to_string()]
        );
        assert_eq!(days["2024-01-14"].len(), 1);
        assert_eq!(days["2024-01-15"].len(), 1);
    }
}
