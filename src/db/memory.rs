use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{Store, DUPLICATE_USER};
use crate::error::{AppError, AppResult};
use crate::models::entry::{Entry, EntryFilter, NewEntry};
use crate::models::group::{Group, GroupSummary, VibeOutcome};
use crate::models::user::{NewUser, User};

/// Process-local store. Every operation holds one lock for its whole duration,
/// which gives the same atomicity the PostgreSQL constraints provide.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    entries: Vec<Entry>,
    groups: HashMap<String, Group>,
    vibes: HashSet<(String, String, NaiveDate)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let inner = self.inner.lock().await;
        let email = email.to_lowercase();
        Ok(inner
            .users
            .iter()
            .find(|u| u.email.to_lowercase() == email)
            .cloned())
    }

    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let mut inner = self.inner.lock().await;
        // Same folding as LOWER(email) in the Postgres unique index
        let email = user.email.to_lowercase();
        if inner.users.iter().any(|u| u.email.to_lowercase() == email) {
            return Err(AppError::Validation(DUPLICATE_USER.into()));
        }

        let user = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            group_id: user.group_id,
            avatar_url: user.avatar_url,
            created_at: Utc::now(),
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn list_group_members(&self, group_id: &str) -> AppResult<Vec<User>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .users
            .iter()
            .filter(|u| u.group_id == group_id)
            .cloned()
            .collect())
    }

    async fn create_entry(&self, entry: NewEntry) -> AppResult<Option<Entry>> {
        let mut inner = self.inner.lock().await;
        if !inner.users.iter().any(|u| u.id == entry.user_id) {
            return Err(AppError::Validation("Unknown user".into()));
        }

        let day = entry.entry_date();
        let already = inner
            .entries
            .iter()
            .any(|e| e.user_id == entry.user_id && e.timestamp.date_naive() == day);
        if already {
            return Ok(None);
        }

        let entry = entry.into_entry(Uuid::new_v4());
        inner.entries.push(entry.clone());
        Ok(Some(entry))
    }

    async fn list_entries(&self, filter: &EntryFilter) -> AppResult<Vec<Entry>> {
        let inner = self.inner.lock().await;
        let members: Option<HashSet<Uuid>> = filter.group_id.as_ref().map(|group_id| {
            inner
                .users
                .iter()
                .filter(|u| &u.group_id == group_id)
                .map(|u| u.id)
                .collect()
        });

        let mut entries: Vec<Entry> = inner
            .entries
            .iter()
            .filter(|e| filter.user_id.map_or(true, |id| e.user_id == id))
            .filter(|e| members.as_ref().map_or(true, |m| m.contains(&e.user_id)))
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.timestamp);
        Ok(entries)
    }

    async fn group_summary(
        &self,
        group_id: &str,
        user_id: Option<&str>,
        date: NaiveDate,
    ) -> AppResult<GroupSummary> {
        let inner = self.inner.lock().await;
        let group = inner
            .groups
            .get(group_id)
            .cloned()
            .unwrap_or_else(|| Group::empty(group_id));

        let user_vibed_today = user_id.map_or(false, |user_id| {
            inner
                .vibes
                .contains(&(group_id.to_string(), user_id.to_string(), date))
        });

        Ok(GroupSummary {
            announcement: group.announcement,
            vibes: group.vibes,
            user_vibed_today,
        })
    }

    async fn set_announcement(&self, group_id: &str, announcement: &str) -> AppResult<Group> {
        let mut inner = self.inner.lock().await;
        let group = inner
            .groups
            .entry(group_id.to_string())
            .or_insert_with(|| Group::empty(group_id));
        group.announcement = announcement.to_string();
        Ok(group.clone())
    }

    async fn record_vibe(
        &self,
        group_id: &str,
        user_id: &str,
        date: NaiveDate,
    ) -> AppResult<VibeOutcome> {
        let mut inner = self.inner.lock().await;
        if !inner
            .vibes
            .insert((group_id.to_string(), user_id.to_string(), date))
        {
            return Ok(VibeOutcome::AlreadyVibed);
        }

        let group = inner
            .groups
            .entry(group_id.to_string())
            .or_insert_with(|| Group::empty(group_id));
        group.vibes += 1;
        Ok(VibeOutcome::Recorded { vibes: group.vibes })
    }

    async fn ping(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
