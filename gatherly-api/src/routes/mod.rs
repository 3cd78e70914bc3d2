/// API route handlers
///
/// Organized by resource:
///
/// - `health`: Health check endpoint
/// - `users`: Account creation, login, logout
/// - `events`: Event lifecycle, registration and search
/// - `questions`: Questions on events and voting

pub mod events;
pub mod health;
pub mod questions;
pub mod users;
