use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use super::{Store, DUPLICATE_USER};
use crate::error::{AppError, AppResult};
use crate::models::entry::{Entry, EntryFilter, NewEntry};
use crate::models::group::{Group, GroupSummary, VibeOutcome};
use crate::models::user::{NewUser, User};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, group_id, avatar_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(&user.group_id)
        .bind(&user.avatar_url)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            // users_email_lower_key
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(AppError::Validation(DUPLICATE_USER.into()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list_group_members(&self, group_id: &str) -> AppResult<Vec<User>> {
        let members = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE group_id = $1 ORDER BY created_at",
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(members)
    }

    async fn create_entry(&self, entry: NewEntry) -> AppResult<Option<Entry>> {
        // The (user_id, entry_date) unique key turns a second check-in into a no-op.
        let result = sqlx::query_as::<_, Entry>(
            r#"
            INSERT INTO entries (
                id, user_id, recorded_at, entry_date, mood, stress_level, energy_level,
                sleep_quality, note, sentiment_score, burnout_risk, ai_intervention, tags
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (user_id, entry_date) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(entry.user_id)
        .bind(entry.timestamp)
        .bind(entry.entry_date())
        .bind(entry.mood)
        .bind(entry.stress_level)
        .bind(entry.energy_level)
        .bind(entry.sleep_quality)
        .bind(&entry.note)
        .bind(entry.sentiment_score)
        .bind(entry.burnout_risk)
        .bind(&entry.ai_intervention)
        .bind(&entry.tags)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(entry) => Ok(entry),
            Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => {
                Err(AppError::Validation("Unknown user".into()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list_entries(&self, filter: &EntryFilter) -> AppResult<Vec<Entry>> {
        let entries = sqlx::query_as::<_, Entry>(
            r#"
            SELECT e.* FROM entries e
            JOIN users u ON u.id = e.user_id
            WHERE ($1::uuid IS NULL OR e.user_id = $1)
              AND ($2::text IS NULL OR u.group_id = $2)
            ORDER BY e.recorded_at ASC
            "#,
        )
        .bind(filter.user_id)
        .bind(&filter.group_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    async fn group_summary(
        &self,
        group_id: &str,
        user_id: Option<&str>,
        date: NaiveDate,
    ) -> AppResult<GroupSummary> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT group_id, announcement, vibes FROM groups WHERE group_id = $1",
        )
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await?
        .unwrap_or_else(|| Group::empty(group_id));

        let user_vibed_today = match user_id {
            Some(user_id) => {
                sqlx::query_scalar::<_, bool>(
                    r#"
                    SELECT EXISTS (
                        SELECT 1 FROM group_vibes
                        WHERE group_id = $1 AND user_id = $2 AND vibe_date = $3
                    )
                    "#,
                )
                .bind(group_id)
                .bind(user_id)
                .bind(date)
                .fetch_one(&self.pool)
                .await?
            }
            None => false,
        };

        Ok(GroupSummary {
            announcement: group.announcement,
            vibes: group.vibes,
            user_vibed_today,
        })
    }

    async fn set_announcement(&self, group_id: &str, announcement: &str) -> AppResult<Group> {
        let group = sqlx::query_as::<_, Group>(
            r#"
            INSERT INTO groups (group_id, announcement)
            VALUES ($1, $2)
            ON CONFLICT (group_id) DO UPDATE SET
                announcement = EXCLUDED.announcement,
                updated_at = NOW()
            RETURNING group_id, announcement, vibes
            "#,
        )
        .bind(group_id)
        .bind(announcement)
        .fetch_one(&self.pool)
        .await?;
        Ok(group)
    }

    async fn record_vibe(
        &self,
        group_id: &str,
        user_id: &str,
        date: NaiveDate,
    ) -> AppResult<VibeOutcome> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO groups (group_id) VALUES ($1) ON CONFLICT (group_id) DO NOTHING")
            .bind(group_id)
            .execute(&mut *tx)
            .await?;

        // A concurrent insert of the same key blocks here until the other
        // transaction commits, then conflicts.
        let inserted = sqlx::query(
            r#"
            INSERT INTO group_vibes (group_id, user_id, vibe_date)
            VALUES ($1, $2, $3)
            ON CONFLICT (group_id, user_id, vibe_date) DO NOTHING
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .bind(date)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            tx.rollback().await?;
            return Ok(VibeOutcome::AlreadyVibed);
        }

        let vibes = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE groups SET vibes = vibes + 1, updated_at = NOW()
            WHERE group_id = $1
            RETURNING vibes
            "#,
        )
        .bind(group_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(VibeOutcome::Recorded { vibes })
    }

    async fn ping(&self) -> bool {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::entry::Mood;
    use crate::models::user::Role;
    use chrono::{TimeZone, Utc};

    fn new_user(email: &str, group_id: &str) -> NewUser {
        NewUser {
            name: "Test".into(),
            email: email.into(),
            password_hash: "hash".into(),
            role: Role::Member,
            group_id: group_id.into(),
            avatar_url: None,
        }
    }

    fn new_entry(user_id: Uuid, hour: u32) -> NewEntry {
        NewEntry {
            user_id,
            timestamp: Utc.with_ymd_and_hms(2026, 5, 4, hour, 0, 0).unwrap(),
            mood: Mood::Good,
            stress_level: 5,
            energy_level: 5,
            sleep_quality: 5,
            note: "ok".into(),
            sentiment_score: Some(0.2),
            burnout_risk: false,
            ai_intervention: None,
            tags: vec!["calm".into()],
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    async fn test_pg_duplicate_email_is_case_insensitive(pool: PgPool) {
        let store = PgStore::new(pool);
        store.create_user(new_user("Ada@Example.com", "TEAM1")).await.unwrap();

        let err = store
            .create_user(new_user("ada@example.COM", "TEAM1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg == DUPLICATE_USER));

        let found = store.find_user_by_email("ADA@EXAMPLE.COM").await.unwrap();
        assert!(found.is_some());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    async fn test_pg_one_entry_per_day(pool: PgPool) {
        let store = PgStore::new(pool);
        let user = store.create_user(new_user("e@example.com", "TEAM1")).await.unwrap();

        let first = store.create_entry(new_entry(user.id, 8)).await.unwrap();
        assert!(first.is_some());
        let second = store.create_entry(new_entry(user.id, 20)).await.unwrap();
        assert!(second.is_none());

        let entries = store
            .list_entries(&EntryFilter {
                group_id: Some("TEAM1".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].tags, vec!["calm".to_string()]);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    async fn test_pg_vibe_daily_limit(pool: PgPool) {
        let store = PgStore::new(pool);
        let day = NaiveDate::from_ymd_opt(2026, 5, 4).unwrap();

        let first = store.record_vibe("TEAM1", "u1", day).await.unwrap();
        assert_eq!(first, VibeOutcome::Recorded { vibes: 1 });
        let again = store.record_vibe("TEAM1", "u1", day).await.unwrap();
        assert_eq!(again, VibeOutcome::AlreadyVibed);
        let next_day = store
            .record_vibe("TEAM1", "u1", day.succ_opt().unwrap())
            .await
            .unwrap();
        assert_eq!(next_day, VibeOutcome::Recorded { vibes: 2 });

        let summary = store.group_summary("TEAM1", Some("u1"), day).await.unwrap();
        assert!(summary.user_vibed_today);
        assert_eq!(summary.vibes, 2);
    }
}
