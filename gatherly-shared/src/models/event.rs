/// Event model and database operations
///
/// Events are created by a user (who is atomically also their first
/// attendee), updated only by their creator, and archived rather than
/// deleted. Archival is an explicit state: scheduling columns always hold
/// real timestamps, and an archived event is closed to registration and
/// further mutation.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE event_status AS ENUM ('active', 'archived');
///
/// CREATE TABLE events (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     creator_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     name VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL,
///     location VARCHAR(255) NOT NULL,
///     start_at TIMESTAMPTZ NOT NULL,
///     close_registration TIMESTAMPTZ NOT NULL,
///     max_attendees INTEGER NOT NULL CHECK (max_attendees > 0),
///     status event_status NOT NULL DEFAULT 'active',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

/// Event lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    /// Event is live; registration is governed by the close deadline
    Active,

    /// Event was soft-deleted by its creator; registration and mutation
    /// are blocked regardless of the deadline
    Archived,
}

impl EventStatus {
    pub fn is_archived(&self) -> bool {
        matches!(self, EventStatus::Archived)
    }
}

/// Error type for event operations
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// Referenced event does not exist
    #[error("Event not found")]
    NotFound,

    /// Requester is not the event's creator
    #[error("You can only modify your own events")]
    NotOwner,

    /// Event is archived; no further mutation allowed
    #[error("Event is archived")]
    Archived,

    /// Update supplied no field that differs from the stored value
    #[error("No fields to update")]
    NothingToUpdate,

    /// Scheduling invariant violated
    #[error("{0}")]
    InvalidSchedule(String),

    /// Underlying store failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Event record
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Event {
    /// Unique event ID
    pub id: Uuid,

    /// Owning user
    pub creator_id: Uuid,

    /// Event name
    pub name: String,

    /// Event description
    pub description: String,

    /// Venue or address
    pub location: String,

    /// When the event starts
    #[serde(with = "chrono::serde::ts_seconds")]
    pub start_at: DateTime<Utc>,

    /// Registration deadline; must precede `start_at`
    #[serde(with = "chrono::serde::ts_seconds")]
    pub close_registration: DateTime<Utc>,

    /// Capacity (always > 0)
    pub max_attendees: i32,

    /// Lifecycle state
    pub status: EventStatus,

    /// When the event was created
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new event
#[derive(Debug, Clone)]
pub struct CreateEvent {
    pub name: String,
    pub description: String,
    pub location: String,
    pub start_at: DateTime<Utc>,
    pub close_registration: DateTime<Utc>,
    pub max_attendees: i32,
}

/// Input for a partial event update
///
/// Only `Some` fields are considered; a field equal to its stored value
/// does not count as an update.
#[derive(Debug, Clone, Default)]
pub struct UpdateEvent {
    pub name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_at: Option<DateTime<Utc>>,
    pub close_registration: Option<DateTime<Utc>>,
    pub max_attendees: Option<i32>,
}

/// Search status filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventFilter {
    /// Events the requester created (requires identity)
    MyEvents,

    /// Events the requester is registered for (requires identity)
    Attending,

    /// Active events whose registration deadline is strictly in the future
    Open,

    /// Archived events, plus events whose deadline has passed
    Archive,
}

impl EventFilter {
    /// Filters that only make sense for an authenticated requester
    pub fn requires_identity(&self) -> bool {
        matches!(self, EventFilter::MyEvents | EventFilter::Attending)
    }
}

/// Creator summary carried on search results
#[derive(Debug, Clone, Serialize)]
pub struct CreatorSummary {
    pub creator_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// One search result: event fields plus the creator summary
#[derive(Debug, Clone, Serialize)]
pub struct EventSummary {
    pub event_id: Uuid,
    pub name: String,
    pub description: String,
    pub location: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub start_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub close_registration: DateTime<Utc>,
    pub max_attendees: i32,
    pub status: EventStatus,
    pub creator: CreatorSummary,
}

/// Flat row shape produced by the search join
#[derive(Debug, sqlx::FromRow)]
struct EventSummaryRow {
    id: Uuid,
    name: String,
    description: String,
    location: String,
    start_at: DateTime<Utc>,
    close_registration: DateTime<Utc>,
    max_attendees: i32,
    status: EventStatus,
    creator_id: Uuid,
    creator_first_name: String,
    creator_last_name: String,
    creator_email: String,
}

impl From<EventSummaryRow> for EventSummary {
    fn from(row: EventSummaryRow) -> Self {
        Self {
            event_id: row.id,
            name: row.name,
            description: row.description,
            location: row.location,
            start_at: row.start_at,
            close_registration: row.close_registration,
            max_attendees: row.max_attendees,
            status: row.status,
            creator: CreatorSummary {
                creator_id: row.creator_id,
                first_name: row.creator_first_name,
                last_name: row.creator_last_name,
                email: row.creator_email,
            },
        }
    }
}

/// Validates the scheduling invariant `now < close_registration < start`
///
/// Applied at creation and to the merged result of every update; both
/// timestamps must be strictly in the future.
///
/// # Returns
///
/// `Ok(())` if the schedule is valid, `Err` with a client-facing message
/// otherwise.
///
/// # Example
///
/// ```
/// use chrono::{Duration, Utc};
/// use gatherly_shared::models::event::validate_schedule;
///
/// let now = Utc::now();
/// assert!(validate_schedule(now, now + Duration::hours(2), now + Duration::hours(1)).is_ok());
/// assert!(validate_schedule(now, now + Duration::hours(1), now + Duration::hours(2)).is_err());
/// ```
pub fn validate_schedule(
    now: DateTime<Utc>,
    start_at: DateTime<Utc>,
    close_registration: DateTime<Utc>,
) -> Result<(), String> {
    if start_at <= now {
        return Err("Start time must be in the future.".to_string());
    }

    if close_registration >= start_at || close_registration <= now {
        return Err(
            "Close registration must be before the start time and after the current time."
                .to_string(),
        );
    }

    Ok(())
}

impl Event {
    /// Creates an event and registers the creator as its first attendee
    ///
    /// Both inserts run in one transaction: creation is never observable
    /// without the creator's attendance record.
    ///
    /// # Errors
    ///
    /// `EventError::InvalidSchedule` if the scheduling invariant fails,
    /// `EventError::Database` otherwise.
    pub async fn create(
        pool: &PgPool,
        creator_id: Uuid,
        data: CreateEvent,
    ) -> Result<Self, EventError> {
        validate_schedule(Utc::now(), data.start_at, data.close_registration)
            .map_err(EventError::InvalidSchedule)?;

        let mut tx = pool.begin().await?;

        let event = sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events (creator_id, name, description, location, start_at,
                                close_registration, max_attendees)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, creator_id, name, description, location, start_at,
                      close_registration, max_attendees, status, created_at
            "#,
        )
        .bind(creator_id)
        .bind(data.name)
        .bind(data.description)
        .bind(data.location)
        .bind(data.start_at)
        .bind(data.close_registration)
        .bind(data.max_attendees)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO attendees (event_id, user_id) VALUES ($1, $2)")
            .bind(event.id)
            .bind(creator_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(event)
    }

    /// Finds an event by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Event>(
            r#"
            SELECT id, creator_id, name, description, location, start_at,
                   close_registration, max_attendees, status, created_at
            FROM events
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Applies a partial update on behalf of the requester
    ///
    /// Only the creator may update. Supplied fields are merged over the
    /// stored row; if nothing differs the update is rejected, and the
    /// merged schedule must still satisfy `now < close_registration <
    /// start`. The whole sequence holds a row lock, so an archive that
    /// commits first is observed before the write.
    ///
    /// # Errors
    ///
    /// `NotFound`, `NotOwner`, `Archived`, `NothingToUpdate`,
    /// `InvalidSchedule` or `Database`.
    pub async fn update(
        pool: &PgPool,
        requester_id: Uuid,
        event_id: Uuid,
        data: UpdateEvent,
    ) -> Result<Self, EventError> {
        let mut tx = pool.begin().await?;

        let current = sqlx::query_as::<_, Event>(
            r#"
            SELECT id, creator_id, name, description, location, start_at,
                   close_registration, max_attendees, status, created_at
            FROM events
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(event_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(EventError::NotFound)?;

        if current.creator_id != requester_id {
            return Err(EventError::NotOwner);
        }

        if current.status.is_archived() {
            return Err(EventError::Archived);
        }

        let name = data.name.unwrap_or_else(|| current.name.clone());
        let description = data
            .description
            .unwrap_or_else(|| current.description.clone());
        let location = data.location.unwrap_or_else(|| current.location.clone());
        let start_at = data.start_at.unwrap_or(current.start_at);
        let close_registration = data.close_registration.unwrap_or(current.close_registration);
        let max_attendees = data.max_attendees.unwrap_or(current.max_attendees);

        let unchanged = name == current.name
            && description == current.description
            && location == current.location
            && start_at == current.start_at
            && close_registration == current.close_registration
            && max_attendees == current.max_attendees;
        if unchanged {
            return Err(EventError::NothingToUpdate);
        }

        validate_schedule(Utc::now(), start_at, close_registration)
            .map_err(EventError::InvalidSchedule)?;

        let event = sqlx::query_as::<_, Event>(
            r#"
            UPDATE events
            SET name = $2,
                description = $3,
                location = $4,
                start_at = $5,
                close_registration = $6,
                max_attendees = $7
            WHERE id = $1
            RETURNING id, creator_id, name, description, location, start_at,
                      close_registration, max_attendees, status, created_at
            "#,
        )
        .bind(event_id)
        .bind(name)
        .bind(description)
        .bind(location)
        .bind(start_at)
        .bind(close_registration)
        .bind(max_attendees)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(event)
    }

    /// Archives (soft-deletes) an event on behalf of the requester
    ///
    /// Idempotent: archiving an already archived event succeeds again.
    ///
    /// # Errors
    ///
    /// `NotFound`, `NotOwner` or `Database`.
    pub async fn archive(
        pool: &PgPool,
        requester_id: Uuid,
        event_id: Uuid,
    ) -> Result<(), EventError> {
        let current = Self::find_by_id(pool, event_id)
            .await?
            .ok_or(EventError::NotFound)?;

        if current.creator_id != requester_id {
            return Err(EventError::NotOwner);
        }

        sqlx::query("UPDATE events SET status = 'archived' WHERE id = $1")
            .bind(event_id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Searches events by substring and status filter
    ///
    /// `query` matches name or description case-insensitively. `user_id`
    /// is required for `MyEvents` and `Attending`; the caller enforces
    /// that before reaching here. Results are offset-paginated and carry
    /// no total count.
    pub async fn search(
        pool: &PgPool,
        query: Option<&str>,
        filter: Option<EventFilter>,
        user_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<EventSummary>, sqlx::Error> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT e.id, e.name, e.description, e.location, e.start_at, \
             e.close_registration, e.max_attendees, e.status, e.creator_id, \
             u.first_name AS creator_first_name, u.last_name AS creator_last_name, \
             u.email AS creator_email \
             FROM events e JOIN users u ON u.id = e.creator_id",
        );

        if filter == Some(EventFilter::Attending) {
            qb.push(" JOIN attendees a ON a.event_id = e.id AND a.user_id = ");
            qb.push_bind(user_id);
        }

        qb.push(" WHERE TRUE");

        if let Some(q) = query {
            let pattern = format!("%{}%", q);
            qb.push(" AND (e.name ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR e.description ILIKE ");
            qb.push_bind(pattern);
            qb.push(")");
        }

        match filter {
            Some(EventFilter::MyEvents) => {
                qb.push(" AND e.creator_id = ");
                qb.push_bind(user_id);
            }
            Some(EventFilter::Open) => {
                qb.push(" AND e.status = 'active' AND e.close_registration > NOW()");
            }
            Some(EventFilter::Archive) => {
                qb.push(" AND (e.status = 'archived' OR e.close_registration <= NOW())");
            }
            Some(EventFilter::Attending) | None => {}
        }

        qb.push(" ORDER BY e.start_at ASC LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let rows: Vec<EventSummaryRow> = qb.build_query_as().fetch_all(pool).await?;

        Ok(rows.into_iter().map(EventSummary::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_validate_schedule_accepts_valid_window() {
        let now = Utc::now();
        let result = validate_schedule(now, now + Duration::hours(2), now + Duration::hours(1));
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_schedule_rejects_past_start() {
        let now = Utc::now();
        let result = validate_schedule(now, now - Duration::hours(1), now - Duration::hours(2));
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("future"));
    }

    #[test]
    fn test_validate_schedule_rejects_close_after_start() {
        let now = Utc::now();
        let result = validate_schedule(now, now + Duration::hours(1), now + Duration::hours(2));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_schedule_rejects_close_equal_to_start() {
        let now = Utc::now();
        let start = now + Duration::hours(1);
        assert!(validate_schedule(now, start, start).is_err());
    }

    #[test]
    fn test_validate_schedule_rejects_past_close() {
        let now = Utc::now();
        let result = validate_schedule(now, now + Duration::hours(1), now - Duration::minutes(5));
        assert!(result.is_err());
    }

    #[test]
    fn test_event_filter_identity_requirements() {
        assert!(EventFilter::MyEvents.requires_identity());
        assert!(EventFilter::Attending.requires_identity());
        assert!(!EventFilter::Open.requires_identity());
        assert!(!EventFilter::Archive.requires_identity());
    }

    #[test]
    fn test_event_filter_parses_wire_values() {
        for (raw, expected) in [
            ("\"MY_EVENTS\"", EventFilter::MyEvents),
            ("\"ATTENDING\"", EventFilter::Attending),
            ("\"OPEN\"", EventFilter::Open),
            ("\"ARCHIVE\"", EventFilter::Archive),
        ] {
            let parsed: EventFilter = serde_json::from_str(raw).unwrap();
            assert_eq!(parsed, expected);
        }

        assert!(serde_json::from_str::<EventFilter>("\"DRAFTS\"").is_err());
    }

    #[test]
    fn test_event_serializes_timestamps_as_unix_seconds() {
        let now = Utc::now();
        let event = Event {
            id: Uuid::new_v4(),
            creator_id: Uuid::new_v4(),
            name: "Rust meetup".to_string(),
            description: "Monthly".to_string(),
            location: "Downtown".to_string(),
            start_at: now + Duration::hours(2),
            close_registration: now + Duration::hours(1),
            max_attendees: 50,
            status: EventStatus::Active,
            created_at: now,
        };

        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert!(json["start_at"].is_i64());
        assert!(json["close_registration"].is_i64());
        assert_eq!(json["status"], "active");
    }
}
