//! Repository for the `jobs` and `job_line_items` tables.

use sqlx::{PgConnection, PgPool};

use reloop_core::types::DbId;

use crate::models::job::{Job, JobLineItem};

/// Column list for `jobs` queries.
const JOB_COLUMNS: &str = "\
    id, job_reference, status, booking_id, driver_id, completed_at, \
    created_at, updated_at";

/// Column list for `job_line_items` queries.
const LINE_ITEM_COLUMNS: &str = "\
    id, job_id, category, quantity, sanitised, wipe_method, sanitised_at, \
    grade, graded_at, resale_value_pence, created_at, updated_at";

/// Provides read/write operations for jobs and their line items.
pub struct JobRepo;

impl JobRepo {
    /// Find a job by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Job>, sqlx::Error> {
        let query = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1");
        sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find the job linked to a booking, if one exists.
    pub async fn find_by_booking(
        pool: &PgPool,
        booking_id: DbId,
    ) -> Result<Option<Job>, sqlx::Error> {
        let query = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE booking_id = $1");
        sqlx::query_as::<_, Job>(&query)
            .bind(booking_id)
            .fetch_optional(pool)
            .await
    }

    /// Create the job for a booking in `booked` status.
    ///
    /// The unique index on `booking_id` makes a second job per booking
    /// impossible; a creation race resolves to the existing row.
    pub async fn create_for_booking(
        pool: &PgPool,
        job_reference: &str,
        booking_id: DbId,
        driver_id: Option<DbId>,
    ) -> Result<Job, sqlx::Error> {
        let query = format!(
            "INSERT INTO jobs (job_reference, status, booking_id, driver_id) \
             VALUES ($1, 'booked', $2, $3) \
             ON CONFLICT (booking_id) DO NOTHING \
             RETURNING {JOB_COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, Job>(&query)
            .bind(job_reference)
            .bind(booking_id)
            .bind(driver_id)
            .fetch_optional(pool)
            .await?;
        match inserted {
            Some(job) => Ok(job),
            None => Self::find_by_booking(pool, booking_id)
                .await?
                .ok_or(sqlx::Error::RowNotFound),
        }
    }

    /// Conditionally move a job from `expected` to `new_status`.
    ///
    /// Same optimistic guard as
    /// [`BookingRepo::update_status_guarded`](crate::repositories::BookingRepo::update_status_guarded).
    /// `completed_at` is stamped first-write-wins when `stamp_completed`
    /// is set.
    pub async fn update_status_guarded(
        conn: &mut PgConnection,
        id: DbId,
        expected: &str,
        new_status: &str,
        stamp_completed: bool,
    ) -> Result<bool, sqlx::Error> {
        let stamp = if stamp_completed {
            ", completed_at = COALESCE(completed_at, NOW())"
        } else {
            ""
        };
        let query = format!(
            "UPDATE jobs SET status = $3, updated_at = NOW(){stamp} \
             WHERE id = $1 AND status = $2"
        );
        let result = sqlx::query(&query)
            .bind(id)
            .bind(expected)
            .bind(new_status)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set the assigned driver.
    pub async fn set_driver(pool: &PgPool, id: DbId, driver_id: DbId) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE jobs SET driver_id = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(driver_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Line items
    // -----------------------------------------------------------------------

    /// List the line items of a job, in insertion order.
    pub async fn list_line_items(
        pool: &PgPool,
        job_id: DbId,
    ) -> Result<Vec<JobLineItem>, sqlx::Error> {
        let query =
            format!("SELECT {LINE_ITEM_COLUMNS} FROM job_line_items WHERE job_id = $1 ORDER BY id");
        sqlx::query_as::<_, JobLineItem>(&query)
            .bind(job_id)
            .fetch_all(pool)
            .await
    }

    /// Find a single line item by ID.
    pub async fn find_line_item(
        pool: &PgPool,
        line_id: DbId,
    ) -> Result<Option<JobLineItem>, sqlx::Error> {
        let query = format!("SELECT {LINE_ITEM_COLUMNS} FROM job_line_items WHERE id = $1");
        sqlx::query_as::<_, JobLineItem>(&query)
            .bind(line_id)
            .fetch_optional(pool)
            .await
    }

    /// Add a line item to a job.
    pub async fn add_line_item(
        pool: &PgPool,
        job_id: DbId,
        category: &str,
        quantity: i32,
    ) -> Result<JobLineItem, sqlx::Error> {
        let query = format!(
            "INSERT INTO job_line_items (job_id, category, quantity) \
             VALUES ($1, $2, $3) \
             RETURNING {LINE_ITEM_COLUMNS}"
        );
        sqlx::query_as::<_, JobLineItem>(&query)
            .bind(job_id)
            .bind(category)
            .bind(quantity)
            .fetch_one(pool)
            .await
    }

    /// Record sanitisation of a line item, set-once.
    ///
    /// Returns `false` when the line was already sanitised; the existing
    /// wipe method and timestamp are left untouched.
    pub async fn mark_line_sanitised(
        pool: &PgPool,
        line_id: DbId,
        wipe_method: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE job_line_items \
             SET sanitised = true, wipe_method = $2, sanitised_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND sanitised = false",
        )
        .bind(line_id)
        .bind(wipe_method)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record the grade and resale value of a line item, set-once.
    ///
    /// Returns `false` when the line was already graded.
    pub async fn set_line_grade(
        pool: &PgPool,
        line_id: DbId,
        grade: &str,
        resale_value_pence: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE job_line_items \
             SET grade = $2, resale_value_pence = $3, graded_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND grade IS NULL",
        )
        .bind(line_id)
        .bind(grade)
        .bind(resale_value_pence)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Number of line items on the job not yet sanitised.
    pub async fn unsanitised_count(pool: &PgPool, job_id: DbId) -> Result<i64, sqlx::Error> {
        let count: Option<i64> = sqlx::query_scalar(
            "SELECT COUNT(*) FROM job_line_items WHERE job_id = $1 AND sanitised = false",
        )
        .bind(job_id)
        .fetch_one(pool)
        .await?;
        Ok(count.unwrap_or(0))
    }

    /// Number of line items on the job not yet graded.
    pub async fn ungraded_count(pool: &PgPool, job_id: DbId) -> Result<i64, sqlx::Error> {
        let count: Option<i64> = sqlx::query_scalar(
            "SELECT COUNT(*) FROM job_line_items WHERE job_id = $1 AND grade IS NULL",
        )
        .bind(job_id)
        .fetch_one(pool)
        .await?;
        Ok(count.unwrap_or(0))
    }
}
