use serde::Serialize;

use crate::models::entry::Entry;

const STORMY_STRESS: f64 = 7.0;
const RAINY_SENTIMENT: f64 = -0.3;
const CLOUDY_SENTIMENT: f64 = 0.2;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum Weather {
    Stormy,
    Rainy,
    Cloudy,
    Sunny,
}

impl Weather {
    pub fn description(self) -> &'static str {
        match self {
            Weather::Stormy => "High stress detected. Let's support each other.",
            Weather::Rainy => "Mood is low. A good time for a team break.",
            Weather::Cloudy => "Things are okay, but could be brighter.",
            Weather::Sunny => "Great vibes! The team is feeling positive.",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WeatherReport {
    pub label: Weather,
    pub description: &'static str,
}

/// Aggregate mood statistics for a group dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupPulse {
    pub entry_count: usize,
    pub average_stress: f64,
    pub average_sentiment: f64,
    pub burnout_risk_count: usize,
    pub weather: WeatherReport,
}

impl GroupPulse {
    /// Entries without a sentiment score count as neutral (0).
    pub fn from_entries(entries: &[Entry]) -> Self {
        let count = entries.len();
        let (average_stress, average_sentiment) = if count == 0 {
            (0.0, 0.0)
        } else {
            let stress: f64 = entries.iter().map(|e| f64::from(e.stress_level)).sum();
            let sentiment: f64 = entries.iter().map(|e| e.sentiment_score.unwrap_or(0.0)).sum();
            (stress / count as f64, sentiment / count as f64)
        };

        let label = weather_for(average_stress, average_sentiment);

        Self {
            entry_count: count,
            average_stress,
            average_sentiment,
            burnout_risk_count: entries.iter().filter(|e| e.burnout_risk).count(),
            weather: WeatherReport {
                label,
                description: label.description(),
            },
        }
    }
}

pub fn weather_for(average_stress: f64, average_sentiment: f64) -> Weather {
    if average_stress > STORMY_STRESS {
        Weather::Stormy
    } else if average_sentiment < RAINY_SENTIMENT {
        Weather::Rainy
    } else if average_sentiment < CLOUDY_SENTIMENT {
        Weather::Cloudy
    } else {
        Weather::Sunny
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::entry::Mood;
    use chrono::Utc;
    use uuid::Uuid;

    fn entry(stress: i32, sentiment: Option<f64>, burnout: bool) -> Entry {
        Entry {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            mood: Mood::Neutral,
            stress_level: stress,
            energy_level: 5,
            sleep_quality: 5,
            note: String::new(),
            sentiment_score: sentiment,
            burnout_risk: burnout,
            ai_intervention: None,
            tags: vec![],
        }
    }

    #[test]
    fn test_empty_group_is_cloudy() {
        let pulse = GroupPulse::from_entries(&[]);
        assert_eq!(pulse.entry_count, 0);
        assert_eq!(pulse.average_stress, 0.0);
        assert_eq!(pulse.weather.label, Weather::Cloudy);
    }

    #[test]
    fn test_high_stress_is_stormy_even_with_good_mood() {
        let pulse = GroupPulse::from_entries(&[entry(9, Some(0.9), true), entry(8, Some(0.8), false)]);
        assert_eq!(pulse.average_stress, 8.5);
        assert_eq!(pulse.burnout_risk_count, 1);
        assert_eq!(pulse.weather.label, Weather::Stormy);
    }

    #[test]
    fn test_missing_sentiment_counts_as_neutral() {
        let pulse = GroupPulse::from_entries(&[entry(3, Some(0.6), false), entry(3, None, false)]);
        assert!((pulse.average_sentiment - 0.3).abs() < 1e-9);
        assert_eq!(pulse.weather.label, Weather::Sunny);
    }

    #[test]
    fn test_weather_thresholds() {
        assert_eq!(weather_for(7.0, -0.5), Weather::Rainy);
        assert_eq!(weather_for(7.1, -0.5), Weather::Stormy);
        assert_eq!(weather_for(5.0, -0.3), Weather::Cloudy);
        assert_eq!(weather_for(5.0, 0.2), Weather::Sunny);
    }

    #[test]
    fn test_pulse_json_shape() {
        let json = serde_json::to_value(GroupPulse::from_entries(&[entry(4, Some(0.5), false)])).unwrap();
        assert_eq!(json["entryCount"], 1);
        assert_eq!(json["weather"]["label"], "Sunny");
        assert_eq!(json["weather"]["description"], Weather::Sunny.description());
    }
}
