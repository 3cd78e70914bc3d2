/// Database models for Gatherly
///
/// Each module owns one entity and its SQL operations. Business rules that
/// must hold across concurrent requests (registration uniqueness, capacity,
/// one vote per user) are enforced here, inside transactions, against the
/// schema's constraints.
///
/// # Models
///
/// - `user`: Accounts, credentials, session tokens
/// - `event`: Event lifecycle (create, update, archive, search)
/// - `attendee`: Event registration and attendance queries
/// - `question`: Questions on events and up/down voting

pub mod attendee;
pub mod event;
pub mod question;
pub mod user;
