use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

/// Report status enum matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "report_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ReportStatus {
    Pending,
    InProgress,
    Resolved,
    Cancelled,
}

impl Default for ReportStatus {
    fn default() -> Self {
        ReportStatus::Pending
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportStatus::Pending => write!(f, "pending"),
            ReportStatus::InProgress => write!(f, "in-progress"),
            ReportStatus::Resolved => write!(f, "resolved"),
            ReportStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Report priority enum matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "report_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReportPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl Default for ReportPriority {
    fn default() -> Self {
        ReportPriority::Medium
    }
}

impl std::fmt::Display for ReportPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportPriority::Low => write!(f, "low"),
            ReportPriority::Medium => write!(f, "medium"),
            ReportPriority::High => write!(f, "high"),
            ReportPriority::Critical => write!(f, "critical"),
        }
    }
}

/// Database model for a field report
#[derive(Debug, Clone, FromRow)]
pub struct Report {
    pub id: Uuid,
    pub location: String,
    pub problem: String,
    pub solve: String,
    pub description: Option<String>,
    /// Encoded-image strings; insertion order is display order
    pub images: Vec<String>,
    /// The event's wall-clock moment as entered by the reporter, stored in UTC
    pub date: DateTime<Utc>,
    pub status: ReportStatus,
    pub priority: ReportPriority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data for creating a new report
#[derive(Debug)]
pub struct CreateReport {
    pub location: String,
    pub problem: String,
    pub solve: String,
    pub description: Option<String>,
    pub images: Vec<String>,
    pub date: DateTime<Utc>,
    pub status: ReportStatus,
    pub priority: ReportPriority,
}

/// Partial update of a report; `None` fields are left untouched
#[derive(Debug, Default)]
pub struct UpdateReport {
    pub location: Option<String>,
    pub problem: Option<String>,
    pub solve: Option<String>,
    pub description: Option<String>,
    pub images: Option<Vec<String>>,
    pub date: Option<DateTime<Utc>>,
    pub status: Option<ReportStatus>,
    pub priority: Option<ReportPriority>,
}

impl UpdateReport {
    pub fn is_empty(&self) -> bool {
        self.location.is_none()
            && self.problem.is_none()
            && self.solve.is_none()
            && self.description.is_none()
            && self.images.is_none()
            && self.date.is_none()
            && self.status.is_none()
            && self.priority.is_none()
    }
}
