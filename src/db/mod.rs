//! Persistence for users, check-in entries and groups.
//!
//! Handlers talk to a [`Store`] trait object so the service runs against
//! PostgreSQL in production and an in-memory map when no database is
//! configured (local runs and tests).

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::AppResult;
use crate::models::entry::{Entry, EntryFilter, NewEntry};
use crate::models::group::{Group, GroupSummary, VibeOutcome};
use crate::models::user::{NewUser, User};

pub mod memory;
pub mod pool;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub const DUPLICATE_USER: &str = "User already exists";

#[async_trait]
pub trait Store: Send + Sync {
    /// Case-insensitive lookup.
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Fails with a validation error when the email (case-insensitive) is taken.
    async fn create_user(&self, user: NewUser) -> AppResult<User>;

    /// `group_id` must already be normalized.
    async fn list_group_members(&self, group_id: &str) -> AppResult<Vec<User>>;

    /// Returns `None` when the user already has an entry for that UTC day.
    async fn create_entry(&self, entry: NewEntry) -> AppResult<Option<Entry>>;

    /// Oldest first.
    async fn list_entries(&self, filter: &EntryFilter) -> AppResult<Vec<Entry>>;

    async fn group_summary(
        &self,
        group_id: &str,
        user_id: Option<&str>,
        date: NaiveDate,
    ) -> AppResult<GroupSummary>;

    /// Creates the group when it does not exist yet.
    async fn set_announcement(&self, group_id: &str, announcement: &str) -> AppResult<Group>;

    /// Records at most one vibe per user per group per day and bumps the counter
    /// in the same atomic step.
    async fn record_vibe(
        &self,
        group_id: &str,
        user_id: &str,
        date: NaiveDate,
    ) -> AppResult<VibeOutcome>;

    async fn ping(&self) -> bool;

    fn backend_name(&self) -> &'static str;
}
