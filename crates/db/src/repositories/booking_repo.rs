//! Repository for the `bookings` table.

use sqlx::{PgConnection, PgPool};

use reloop_core::types::DbId;

use crate::models::booking::Booking;

/// Column list for `bookings` queries.
const COLUMNS: &str = "\
    id, booking_number, status, scheduled_date, client_id, driver_id, job_id, \
    scheduled_at, collected_at, sanitised_at, graded_at, completed_at, \
    created_at, updated_at";

/// Stage-timestamp columns a transition may stamp. Guarded by an allow
/// list because the column name is interpolated into SQL.
const STAGE_COLUMNS: &[&str] = &[
    "scheduled_at",
    "collected_at",
    "sanitised_at",
    "graded_at",
    "completed_at",
];

/// Provides read/write operations for bookings.
pub struct BookingRepo;

impl BookingRepo {
    /// Find a booking by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Booking>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM bookings WHERE id = $1");
        sqlx::query_as::<_, Booking>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Create a new booking in `pending` status.
    pub async fn create(
        pool: &PgPool,
        booking_number: &str,
        client_id: DbId,
        scheduled_date: Option<chrono::NaiveDate>,
    ) -> Result<Booking, sqlx::Error> {
        let query = format!(
            "INSERT INTO bookings (booking_number, status, client_id, scheduled_date) \
             VALUES ($1, 'pending', $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Booking>(&query)
            .bind(booking_number)
            .bind(client_id)
            .bind(scheduled_date)
            .fetch_one(pool)
            .await
    }

    /// Conditionally move a booking from `expected` to `new_status`.
    ///
    /// The write only lands if the stored status still equals `expected`
    /// (the optimistic-concurrency guard). When `stamp_column` is given,
    /// the corresponding stage timestamp is set if and only if it is still
    /// NULL; first write wins, later transitions never touch it.
    ///
    /// Returns `true` if a row was updated, `false` if a concurrent writer
    /// got there first.
    pub async fn update_status_guarded(
        conn: &mut PgConnection,
        id: DbId,
        expected: &str,
        new_status: &str,
        stamp_column: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let stamp = match stamp_column {
            Some(col) if STAGE_COLUMNS.contains(&col) => {
                format!(", {col} = COALESCE({col}, NOW())")
            }
            Some(col) => {
                return Err(sqlx::Error::Protocol(format!(
                    "unknown stage column '{col}'"
                )));
            }
            None => String::new(),
        };
        let query = format!(
            "UPDATE bookings SET status = $3, updated_at = NOW(){stamp} \
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
        let result = sqlx::query(
            "UPDATE bookings SET driver_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(driver_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Link the booking to its job. The link is immutable: the write only
    /// lands while `job_id` is still NULL.
    pub async fn set_job(pool: &PgPool, id: DbId, job_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE bookings SET job_id = $2, updated_at = NOW() \
             WHERE id = $1 AND job_id IS NULL",
        )
        .bind(id)
        .bind(job_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
