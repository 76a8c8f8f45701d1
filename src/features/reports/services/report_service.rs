use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::reports::dtos::{ReportFilter, ReportSortField, SortDirection};
use crate::features::reports::models::{CreateReport, Report, UpdateReport};

const REPORT_COLUMNS: &str =
    "id, location, problem, solve, description, images, date, status, priority, \
     created_at, updated_at";

/// Service for report operations
pub struct ReportService {
    pool: PgPool,
}

impl ReportService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The single place a [`ReportFilter`] becomes SQL. Every present field
    /// contributes exactly one AND-ed clause; absent fields contribute
    /// nothing.
    fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &ReportFilter) {
        let mut prefix = " WHERE ";

        if let Some(search) = &filter.search {
            builder
                .push(prefix)
                .push("search_vec @@ websearch_to_tsquery('simple', ")
                .push_bind(search.clone())
                .push(")");
            prefix = " AND ";
        }

        if let Some(start) = filter.start_date {
            builder.push(prefix).push("date >= ").push_bind(start);
            prefix = " AND ";
        }

        if let Some(end) = filter.end_date {
            builder.push(prefix).push("date <= ").push_bind(end);
            prefix = " AND ";
        }

        if let Some(status) = filter.status {
            builder.push(prefix).push("status = ").push_bind(status);
            prefix = " AND ";
        }

        if let Some(priority) = filter.priority {
            builder.push(prefix).push("priority = ").push_bind(priority);
        }
    }

    /// Deterministic ordering: requested field and direction, ties broken by
    /// id ascending. Field and direction come from allow-list enums, never
    /// from raw input.
    fn push_order(builder: &mut QueryBuilder<'_, Postgres>, sort: ReportSortField, order: SortDirection) {
        builder
            .push(" ORDER BY ")
            .push(sort.as_sql())
            .push(" ")
            .push(order.as_sql())
            .push(", id ASC");
    }

    /// Count the filtered set, ignoring pagination.
    pub async fn count(&self, filter: &ReportFilter) -> Result<i64> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM reports");
        Self::push_filter(&mut builder, filter);

        builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count reports: {:?}", e);
                AppError::Database(e)
            })
    }

    /// List one page of the filtered, sorted collection. Returns the page
    /// items and the total match count.
    pub async fn list(
        &self,
        filter: &ReportFilter,
        sort: ReportSortField,
        order: SortDirection,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Report>, i64)> {
        let total = self.count(filter).await?;

        let mut builder =
            QueryBuilder::new(format!("SELECT {} FROM reports", REPORT_COLUMNS));
        Self::push_filter(&mut builder, filter);
        Self::push_order(&mut builder, sort, order);
        builder.push(" LIMIT ").push_bind(limit);
        builder.push(" OFFSET ").push_bind(offset);

        let reports = builder
            .build_query_as::<Report>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list reports: {:?}", e);
                AppError::Database(e)
            })?;

        Ok((reports, total))
    }

    /// The whole filtered set in sorted order; used by export.
    pub async fn list_all(
        &self,
        filter: &ReportFilter,
        sort: ReportSortField,
        order: SortDirection,
    ) -> Result<Vec<Report>> {
        let mut builder =
            QueryBuilder::new(format!("SELECT {} FROM reports", REPORT_COLUMNS));
        Self::push_filter(&mut builder, filter);
        Self::push_order(&mut builder, sort, order);

        builder
            .build_query_as::<Report>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to export reports: {:?}", e);
                AppError::Database(e)
            })
    }

    /// Reports whose event date falls inside [start, end], oldest first;
    /// feeds the calendar view.
    pub async fn list_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Report>> {
        sqlx::query_as::<_, Report>(&format!(
            "SELECT {} FROM reports WHERE date >= $1 AND date <= $2 \
             ORDER BY date ASC, id ASC",
            REPORT_COLUMNS
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list reports in range: {:?}", e);
            AppError::Database(e)
        })
    }

    /// Create a new report; the server assigns id and timestamps.
    pub async fn create(&self, data: CreateReport) -> Result<Report> {
        let report = sqlx::query_as::<_, Report>(&format!(
            "INSERT INTO reports (location, problem, solve, description, images, date, status, priority) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {}",
            REPORT_COLUMNS
        ))
        .bind(data.location)
        .bind(data.problem)
        .bind(data.solve)
        .bind(data.description)
        .bind(data.images)
        .bind(data.date)
        .bind(data.status)
        .bind(data.priority)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create report: {:?}", e);
            AppError::Database(e)
        })?;

        tracing::info!("Created report: {}", report.id);

        Ok(report)
    }

    /// Get report by ID
    pub async fn get_by_id(&self, id: Uuid) -> Result<Report> {
        sqlx::query_as::<_, Report>(&format!(
            "SELECT {} FROM reports WHERE id = $1",
            REPORT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get report: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound(format!("Report {} not found", id)))
    }

    /// Apply a partial update in place. id and created_at are immutable;
    /// updated_at refreshes on every call. Last writer wins on concurrent
    /// updates to one id.
    pub async fn update(&self, id: Uuid, changes: UpdateReport) -> Result<Report> {
        if changes.is_empty() {
            // Nothing to change; still confirm the id exists
            return self.get_by_id(id).await;
        }

        let mut builder = QueryBuilder::new("UPDATE reports SET updated_at = NOW()");

        if let Some(location) = changes.location {
            builder.push(", location = ").push_bind(location);
        }
        if let Some(problem) = changes.problem {
            builder.push(", problem = ").push_bind(problem);
        }
        if let Some(solve) = changes.solve {
            builder.push(", solve = ").push_bind(solve);
        }
        if let Some(description) = changes.description {
            builder.push(", description = ").push_bind(description);
        }
        if let Some(images) = changes.images {
            builder.push(", images = ").push_bind(images);
        }
        if let Some(date) = changes.date {
            builder.push(", date = ").push_bind(date);
        }
        if let Some(status) = changes.status {
            builder.push(", status = ").push_bind(status);
        }
        if let Some(priority) = changes.priority {
            builder.push(", priority = ").push_bind(priority);
        }

        builder.push(" WHERE id = ").push_bind(id);
        builder.push(format!(" RETURNING {}", REPORT_COLUMNS));

        let report = builder
            .build_query_as::<Report>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update report: {:?}", e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound(format!("Report {} not found", id)))?;

        tracing::info!("Updated report: {}", id);

        Ok(report)
    }

    /// Hard delete. Deleting an id twice reports not-found the second time.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let deleted = sqlx::query_scalar::<_, Uuid>(
            "DELETE FROM reports WHERE id = $1 RETURNING id",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete report: {:?}", e);
            AppError::Database(e)
        })?;

        match deleted {
            Some(_) => {
                tracing::info!("Deleted report: {}", id);
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Report {} not found", id))),
        }
    }
}
