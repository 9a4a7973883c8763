use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub group_id: String,
    pub announcement: String,
    pub vibes: i64,
}

impl Group {
    pub fn empty(group_id: &str) -> Self {
        Self {
            group_id: group_id.to_string(),
            announcement: String::new(),
            vibes: 0,
        }
    }
}

/// GET /api/groups/:groupId
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    pub announcement: String,
    pub vibes: i64,
    pub user_vibed_today: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VibeOutcome {
    Recorded { vibes: i64 },
    AlreadyVibed,
}

/// Group codes are case-insensitive; every boundary stores and looks them up upper-cased.
pub fn normalize_group_code(code: &str) -> String {
    code.trim().to_uppercase()
}
