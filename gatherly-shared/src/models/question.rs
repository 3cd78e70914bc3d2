/// Question model: questions on events and up/down voting
///
/// Asking is gated on being a registered attendee who is not the event's
/// creator (creators are auto-attendees, so both checks are explicit).
/// Votes are directionless markers: one row in `votes` per (question,
/// user), inserted in the same transaction as the tally mutation so a
/// tally change can never commit without its marker.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE questions (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     event_id UUID NOT NULL REFERENCES events(id) ON DELETE CASCADE,
///     asked_by UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     question TEXT NOT NULL,
///     votes INTEGER NOT NULL DEFAULT 0,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE votes (
///     question_id UUID NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
///     voter_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     voted_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (question_id, voter_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::is_unique_violation;
use crate::models::attendee;

/// Error type for question creation and deletion
#[derive(Debug, thiserror::Error)]
pub enum QuestionError {
    /// Referenced event does not exist
    #[error("Event not found")]
    EventNotFound,

    /// Requester is not registered for the event
    #[error("You cannot ask questions on events you are not registered for")]
    NotAttendee,

    /// Event creators cannot ask questions on their own events
    #[error("Event creators cannot ask questions about their own events")]
    OwnEvent,

    /// Referenced question does not exist
    #[error("Question not found")]
    NotFound,

    /// Requester is neither the asker nor the owning event's creator
    #[error("You can only delete your own questions or questions from events you created")]
    NotPermitted,

    /// Underlying store failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Error type for voting
#[derive(Debug, thiserror::Error)]
pub enum VoteError {
    /// Referenced question does not exist
    #[error("Question not found")]
    QuestionNotFound,

    /// Requester already voted on this question, in either direction
    #[error("You have already voted on this question")]
    AlreadyVoted,

    /// Underlying store failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Vote direction
///
/// There is no vote-change path: the first vote in either direction is
/// the only one a user gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

/// Question record
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Question {
    /// Unique question ID
    pub id: Uuid,

    /// Owning event
    pub event_id: Uuid,

    /// Asking user
    pub asked_by: Uuid,

    /// Question text
    pub question: String,

    /// Running vote tally (signed; down-votes may push it negative)
    pub votes: i32,

    /// When the question was asked
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
}

impl Question {
    /// Asks a question on an event
    ///
    /// The requester must be a registered attendee and must not be the
    /// event's creator; both rules are enforced independently.
    ///
    /// # Errors
    ///
    /// `EventNotFound`, `NotAttendee`, `OwnEvent` or `Database`.
    pub async fn ask(
        pool: &PgPool,
        event_id: Uuid,
        user_id: Uuid,
        text: &str,
    ) -> Result<Self, QuestionError> {
        let creator: Option<(Uuid,)> = sqlx::query_as("SELECT creator_id FROM events WHERE id = $1")
            .bind(event_id)
            .fetch_optional(pool)
            .await?;
        let (creator_id,) = creator.ok_or(QuestionError::EventNotFound)?;

        if !attendee::is_attendee(pool, event_id, user_id).await? {
            return Err(QuestionError::NotAttendee);
        }

        if creator_id == user_id {
            return Err(QuestionError::OwnEvent);
        }

        let question = sqlx::query_as::<_, Question>(
            r#"
            INSERT INTO questions (event_id, asked_by, question)
            VALUES ($1, $2, $3)
            RETURNING id, event_id, asked_by, question, votes, created_at
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .bind(text)
        .fetch_one(pool)
        .await?;

        Ok(question)
    }

    /// Deletes a question on behalf of the requester
    ///
    /// Permitted for the asker and for the creator of the owning event.
    ///
    /// # Errors
    ///
    /// `NotFound`, `NotPermitted` or `Database`.
    pub async fn delete(
        pool: &PgPool,
        question_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), QuestionError> {
        let row: Option<(Uuid, Uuid)> = sqlx::query_as(
            r#"
            SELECT q.asked_by, e.creator_id
            FROM questions q
            JOIN events e ON e.id = q.event_id
            WHERE q.id = $1
            "#,
        )
        .bind(question_id)
        .fetch_optional(pool)
        .await?;
        let (asked_by, creator_id) = row.ok_or(QuestionError::NotFound)?;

        if user_id != asked_by && user_id != creator_id {
            return Err(QuestionError::NotPermitted);
        }

        sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(question_id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Casts a vote on a question
    ///
    /// The vote marker insert and the tally mutation commit as one
    /// transaction; the composite primary key on `votes` rejects a second
    /// vote in either direction.
    ///
    /// # Errors
    ///
    /// `QuestionNotFound`, `AlreadyVoted` or `Database`.
    pub async fn cast_vote(
        pool: &PgPool,
        question_id: Uuid,
        voter_id: Uuid,
        direction: VoteDirection,
    ) -> Result<(), VoteError> {
        let mut tx = pool.begin().await?;

        let exists: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM questions WHERE id = $1 FOR UPDATE")
                .bind(question_id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Err(VoteError::QuestionNotFound);
        }

        let marker = sqlx::query("INSERT INTO votes (question_id, voter_id) VALUES ($1, $2)")
            .bind(question_id)
            .bind(voter_id)
            .execute(&mut *tx)
            .await;

        match marker {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => return Err(VoteError::AlreadyVoted),
            Err(e) => return Err(e.into()),
        }

        let delta = match direction {
            VoteDirection::Up => 1,
            VoteDirection::Down => -1,
        };

        sqlx::query("UPDATE questions SET votes = votes + $2 WHERE id = $1")
            .bind(question_id)
            .bind(delta)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Lists questions attached to an event, most-voted first
    pub async fn list_for_event(pool: &PgPool, event_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Question>(
            r#"
            SELECT id, event_id, asked_by, question, votes, created_at
            FROM questions
            WHERE event_id = $1
            ORDER BY votes DESC, created_at ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vote_direction_wire_values() {
        assert_eq!(serde_json::to_string(&VoteDirection::Up).unwrap(), "\"up\"");
        assert_eq!(
            serde_json::to_string(&VoteDirection::Down).unwrap(),
            "\"down\""
        );
    }

    #[test]
    fn test_question_serializes_created_at_as_unix_seconds() {
        let question = Question {
            id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            asked_by: Uuid::new_v4(),
            question: "Will there be recordings?".to_string(),
            votes: 3,
            created_at: Utc::now(),
        };

        let json: serde_json::Value = serde_json::to_value(&question).unwrap();
        assert!(json["created_at"].is_i64());
        assert_eq!(json["votes"], 3);
    }
}
