//! # MindPulse — Request/Response DTOs
//!
//! API contract types shared by the handlers. Field names are camelCase on the
//! wire because the browser client was written against that shape.
//!
//! Conventions:
//! - `*Request`  → deserialized from client JSON body or query params
//! - `*Response` → serialized to client JSON
//! - Presence and range checks are expressed via `validator` derive macros;
//!   required fields default to empty so a missing field surfaces as a 400
//!   validation error rather than a body rejection

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::entry::{Mood, NewEntry};
use crate::models::user::{Role, User};
use crate::services::ai::{ChatTurn, ReportEntry};

// ============================================================================
// Auth
// ============================================================================

/// POST /api/login
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// POST /api/signup
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[serde(default)]
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Defaults to `member`
    pub role: Option<Role>,

    #[serde(default)]
    #[validate(length(min = 1, max = 32, message = "Group code must be 1-32 characters"))]
    pub group_code: String,

    #[serde(default)]
    #[validate(length(min = 1, max = 128, message = "Password must be 1-128 characters"))]
    pub password: String,
}

/// Response for signup and login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
}

/// GET /api/users?groupId=
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsersQuery {
    pub group_id: Option<String>,
}

// ============================================================================
// Entries
// ============================================================================

/// POST /api/entries
///
/// The client also sends its own provisional `id`; unknown fields are ignored
/// and the server assigns the identifier.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEntryRequest {
    pub user_id: Option<Uuid>,

    /// Defaults to server-now
    pub timestamp: Option<DateTime<Utc>>,

    pub mood: Option<Mood>,

    #[validate(range(min = 1, max = 10, message = "stressLevel must be between 1 and 10"))]
    pub stress_level: Option<i32>,

    #[validate(range(min = 1, max = 10, message = "energyLevel must be between 1 and 10"))]
    pub energy_level: Option<i32>,

    #[validate(range(min = 1, max = 10, message = "sleepQuality must be between 1 and 10"))]
    pub sleep_quality: Option<i32>,

    #[serde(default)]
    #[validate(length(max = 5000, message = "Note must be under 5000 characters"))]
    pub note: String,

    #[validate(range(min = -1.0, max = 1.0, message = "sentimentScore must be between -1 and 1"))]
    pub sentiment_score: Option<f64>,

    #[serde(default)]
    pub burnout_risk: bool,

    pub ai_intervention: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,
}

impl CreateEntryRequest {
    /// Runs range checks and the presence checks `validator` cannot express.
    pub fn into_new_entry(self) -> AppResult<NewEntry> {
        self.validate()?;

        let missing = |field: &str| AppError::Validation(format!("{field} is required"));

        Ok(NewEntry {
            user_id: self.user_id.ok_or_else(|| missing("userId"))?,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            mood: self.mood.ok_or_else(|| missing("mood"))?,
            stress_level: self.stress_level.ok_or_else(|| missing("stressLevel"))?,
            energy_level: self.energy_level.ok_or_else(|| missing("energyLevel"))?,
            sleep_quality: self.sleep_quality.ok_or_else(|| missing("sleepQuality"))?,
            note: self.note,
            sentiment_score: self.sentiment_score,
            burnout_risk: self.burnout_risk,
            ai_intervention: self.ai_intervention,
            tags: self.tags,
        })
    }
}

// ============================================================================
// AI
// ============================================================================

/// POST /api/ai/analyze
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub note: String,

    #[validate(range(min = 1, max = 10, message = "stressLevel must be between 1 and 10"))]
    pub stress_level: Option<i32>,
}

/// POST /api/ai/chat
#[derive(Debug, Deserialize, Validate)]
pub struct ChatRequest {
    #[serde(default)]
    pub history: Vec<ChatTurn>,

    #[serde(default)]
    #[validate(length(min = 1, message = "Message is required"))]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub text: String,
}

/// POST /api/ai/report
#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    #[serde(default)]
    pub entries: Vec<ReportEntry>,
}

// ============================================================================
// Groups
// ============================================================================

/// GET /api/groups/:groupId?userId=
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupQuery {
    pub user_id: Option<String>,
}

/// POST /api/groups/:groupId/announcement
#[derive(Debug, Deserialize, Validate)]
pub struct AnnouncementRequest {
    #[serde(default)]
    #[validate(length(max = 2000, message = "Announcement must be under 2000 characters"))]
    pub announcement: String,
}

#[derive(Debug, Serialize)]
pub struct AnnouncementResponse {
    pub success: bool,
    pub announcement: String,
}

/// POST /api/groups/:groupId/vibes
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VibeRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "userId is required"))]
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct VibeResponse {
    pub success: bool,
    pub vibes: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry_body() -> serde_json::Value {
        json!({
            "id": "client-side-id",
            "userId": "6f1c1b0e-6a55-4a4e-9d37-0b8a1f0a2f11",
            "mood": "Good",
            "stressLevel": 4,
            "energyLevel": 6,
            "sleepQuality": 7,
            "note": "Shipped the release",
            "tags": ["work"]
        })
    }

    #[test]
    fn test_create_entry_ignores_client_id() {
        let req: CreateEntryRequest = serde_json::from_value(entry_body()).unwrap();
        let entry = req.into_new_entry().unwrap();
        assert_eq!(entry.mood, Mood::Good);
        assert_eq!(entry.tags, vec!["work".to_string()]);
        assert!(!entry.burnout_risk);
    }

    #[test]
    fn test_create_entry_rejects_out_of_range_levels() {
        let mut body = entry_body();
        body["stressLevel"] = json!(11);
        let req: CreateEntryRequest = serde_json::from_value(body).unwrap();
        assert!(matches!(req.into_new_entry(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_create_entry_requires_mood() {
        let mut body = entry_body();
        body.as_object_mut().unwrap().remove("mood");
        let req: CreateEntryRequest = serde_json::from_value(body).unwrap();
        match req.into_new_entry() {
            Err(AppError::Validation(msg)) => assert_eq!(msg, "mood is required"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_signup_missing_group_code_fails_validation() {
        let req: SignupRequest = serde_json::from_value(json!({
            "name": "Ada",
            "email": "ada@example.com",
            "password": "hunter22"
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_report_request_accepts_no_entries() {
        let req: ReportRequest = serde_json::from_value(json!({})).unwrap();
        assert!(req.entries.is_empty());

        let req: ReportRequest = serde_json::from_value(json!({ "entries": [] })).unwrap();
        assert!(req.entries.is_empty());
    }

    #[test]
    fn test_signup_role_is_optional() {
        let req: SignupRequest = serde_json::from_value(json!({
            "name": "Ada",
            "email": "ada@example.com",
            "groupCode": "team1",
            "password": "hunter22"
        }))
        .unwrap();
        assert!(req.validate().is_ok());
        assert!(req.role.is_none());
    }
}
