use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One user's daily check-in plus the AI-derived annotations.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: Uuid,
    pub user_id: Uuid,
    #[sqlx(rename = "recorded_at")]
    pub timestamp: DateTime<Utc>,
    pub mood: Mood,
    pub stress_level: i32,
    pub energy_level: i32,
    pub sleep_quality: i32,
    pub note: String,
    pub sentiment_score: Option<f64>,
    pub burnout_risk: bool,
    pub ai_intervention: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "mood")]
pub enum Mood {
    Great,
    Good,
    Neutral,
    Bad,
    Awful,
}

#[derive(Debug, Clone)]
pub struct NewEntry {
    pub user_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub mood: Mood,
    pub stress_level: i32,
    pub energy_level: i32,
    pub sleep_quality: i32,
    pub note: String,
    pub sentiment_score: Option<f64>,
    pub burnout_risk: bool,
    pub ai_intervention: Option<String>,
    pub tags: Vec<String>,
}

impl NewEntry {
    /// The UTC calendar day an entry counts against.
    pub fn entry_date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    pub fn into_entry(self, id: Uuid) -> Entry {
        Entry {
            id,
            user_id: self.user_id,
            timestamp: self.timestamp,
            mood: self.mood,
            stress_level: self.stress_level,
            energy_level: self.energy_level,
            sleep_quality: self.sleep_quality,
            note: self.note,
            sentiment_score: self.sentiment_score,
            burnout_risk: self.burnout_risk,
            ai_intervention: self.ai_intervention,
            tags: self.tags,
        }
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryFilter {
    pub user_id: Option<Uuid>,
    pub group_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_entry_date_is_utc_day() {
        let entry = NewEntry {
            user_id: Uuid::new_v4(),
            timestamp: Utc.with_ymd_and_hms(2026, 3, 1, 23, 59, 0).unwrap(),
            mood: Mood::Good,
            stress_level: 3,
            energy_level: 7,
            sleep_quality: 8,
            note: String::new(),
            sentiment_score: None,
            burnout_risk: false,
            ai_intervention: None,
            tags: vec![],
        };
        assert_eq!(entry.entry_date(), NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
    }

    #[test]
    fn test_mood_wire_names() {
        assert_eq!(serde_json::to_string(&Mood::Awful).unwrap(), "\"Awful\"");
        let mood: Mood = serde_json::from_str("\"Neutral\"").unwrap();
        assert_eq!(mood, Mood::Neutral);
        assert!(serde_json::from_str::<Mood>("\"neutral\"").is_err());
    }
}
