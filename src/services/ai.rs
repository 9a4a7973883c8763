//! Chat-completion gateway.
//!
//! Composes the three fixed prompts (entry analysis, chat, group report),
//! forwards them to an OpenAI-compatible `/chat/completions` endpoint and
//! parses the JSON the model returns. No retries: a failed call is reported
//! once and the caller decides whether a fallback applies.

use std::time::Duration;

use anyhow::{anyhow, Context};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;

use crate::config::Config;
use crate::models::entry::Mood;

const ANALYZE_SYSTEM_PROMPT: &str = r#"You are an expert mental health AI. Analyze the user's daily note for stress/burnout.
Return strict JSON with the following structure:
{
  "sentimentScore": number (-1 to 1),
  "burnoutRisk": boolean,
  "aiIntervention": string (short helpful tip),
  "tags": string[] (max 3 one-word tags)
}"#;

const CHAT_SYSTEM_PROMPT: &str =
    "You are a mental health assistant. Be concise, empathetic, and supportive.";

const REPORT_SYSTEM_PROMPT: &str = r#"Analyze the following group mood data.
Return strict JSON:
{
  "overallWellnessScore": number (0-100),
  "burnoutRiskLevel": "Low" | "Medium" | "High",
  "summary": string (brief executive summary),
  "recommendations": string[] (3 actionable tips)
}"#;

const MAX_TAGS: usize = 3;

pub const OFFLINE_TAG: &str = "Offline Mode";
const OFFLINE_INTERVENTION: &str = "Take a deep breath and stay hydrated. (Offline/Demo Mode)";

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("AI service is not configured")]
    NotConfigured,

    #[error(transparent)]
    Call(#[from] anyhow::Error),
}

/// Sentiment and burnout annotations for a single check-in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub sentiment_score: f64,
    pub burnout_risk: bool,
    pub ai_intervention: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProviderReport {
    overall_wellness_score: f64,
    burnout_risk_level: RiskLevel,
    summary: String,
    #[serde(default)]
    recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupReport {
    pub overall_wellness_score: f64,
    pub burnout_risk_level: RiskLevel,
    pub summary: String,
    pub recommendations: Vec<String>,
    pub last_updated: DateTime<Utc>,
}

/// One turn of client-side chat history.
///
/// The client sends either `{role, parts: [{text}]}` or a flat `{role, text}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    #[serde(default)]
    pub parts: Vec<ChatPart>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatPart {
    #[serde(default)]
    pub text: String,
}

impl ChatTurn {
    fn content(&self) -> String {
        self.parts
            .first()
            .map(|p| p.text.as_str())
            .filter(|t| !t.is_empty())
            .or(self.text.as_deref())
            .unwrap_or_default()
            .to_string()
    }
}

/// The client calls the assistant `model`; the provider calls it `assistant`.
fn provider_role(role: &str) -> &str {
    match role {
        "model" => "assistant",
        other => other,
    }
}

/// The subset of a check-in the group report needs.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry {
    pub stress_level: i32,
    pub mood: Mood,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Short keys keep the report prompt small.
#[derive(Debug, Serialize)]
struct CompactEntry<'a> {
    s: i32,
    m: Mood,
    t: &'a [String],
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProviderMessage {
    pub role: String,
    pub content: String,
}

impl ProviderMessage {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

#[derive(Clone)]
pub struct AiGateway {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl AiGateway {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.ai_timeout_secs))
            .build()
            .context("Failed to build AI HTTP client")?;

        Ok(Self {
            client,
            api_key: config.ai_api_key.clone(),
            model: config.ai_model.clone(),
            base_url: config.ai_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// First characters of the key, for startup diagnostics.
    pub fn masked_key(&self) -> Option<String> {
        self.api_key
            .as_ref()
            .map(|k| format!("{}...****", k.chars().take(8).collect::<String>()))
    }

    pub async fn analyze_entry(&self, note: &str, stress_level: i32) -> Result<Analysis, AiError> {
        let content = self
            .complete(analysis_messages(note, stress_level), true)
            .await?;
        Ok(parse_analysis(&content)?)
    }

    pub async fn chat(&self, history: &[ChatTurn], message: &str) -> Result<String, AiError> {
        self.complete(chat_messages(history, message), false).await
    }

    pub async fn group_report(&self, entries: &[ReportEntry]) -> Result<GroupReport, AiError> {
        let content = self.complete(report_messages(entries)?, true).await?;
        let report: ProviderReport = parse_json(&content)?;

        Ok(GroupReport {
            overall_wellness_score: report.overall_wellness_score.clamp(0.0, 100.0),
            burnout_risk_level: report.burnout_risk_level,
            summary: report.summary,
            recommendations: report.recommendations,
            last_updated: Utc::now(),
        })
    }

    async fn complete(&self, messages: Vec<ProviderMessage>, json_mode: bool) -> Result<String, AiError> {
        let api_key = self.api_key.as_deref().ok_or(AiError::NotConfigured)?;

        let mut body = json!({
            "model": self.model,
            "messages": messages,
        });
        if json_mode {
            body["response_format"] = json!({ "type": "json_object" });
        }

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .context("AI provider unreachable")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("AI provider error {}: {}", status, body).into());
        }

        let completion: serde_json::Value = response
            .json()
            .await
            .context("AI provider returned invalid JSON")?;

        completion["choices"][0]["message"]["content"]
            .as_str()
            .filter(|text| !text.trim().is_empty())
            .map(str::to_string)
            .ok_or_else(|| anyhow!("Empty AI response").into())
    }
}

pub fn analysis_messages(note: &str, stress_level: i32) -> Vec<ProviderMessage> {
    vec![
        ProviderMessage::new("system", ANALYZE_SYSTEM_PROMPT),
        ProviderMessage::new(
            "user",
            format!("User Note: \"{note}\". User reported stress level: {stress_level}/10."),
        ),
    ]
}

pub fn chat_messages(history: &[ChatTurn], message: &str) -> Vec<ProviderMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ProviderMessage::new("system", CHAT_SYSTEM_PROMPT));
    messages.extend(
        history
            .iter()
            .map(|turn| ProviderMessage::new(provider_role(&turn.role), turn.content())),
    );
    messages.push(ProviderMessage::new("user", message));
    messages
}

pub fn report_messages(entries: &[ReportEntry]) -> anyhow::Result<Vec<ProviderMessage>> {
    let compact: Vec<CompactEntry<'_>> = entries
        .iter()
        .map(|e| CompactEntry {
            s: e.stress_level,
            m: e.mood,
            t: &e.tags,
        })
        .collect();

    Ok(vec![
        ProviderMessage::new("system", REPORT_SYSTEM_PROMPT),
        ProviderMessage::new("user", serde_json::to_string(&compact)?),
    ])
}

/// Deterministic answer used when the provider cannot be reached.
pub fn offline_analysis(stress_level: i32) -> Analysis {
    Analysis {
        sentiment_score: 0.0,
        burnout_risk: stress_level > 7,
        ai_intervention: OFFLINE_INTERVENTION.into(),
        tags: vec![OFFLINE_TAG.into()],
    }
}

fn parse_analysis(content: &str) -> anyhow::Result<Analysis> {
    let mut analysis: Analysis = parse_json(content)?;
    analysis.sentiment_score = analysis.sentiment_score.clamp(-1.0, 1.0);
    analysis.tags.truncate(MAX_TAGS);
    Ok(analysis)
}

fn parse_json<T: DeserializeOwned>(content: &str) -> anyhow::Result<T> {
    serde_json::from_str(strip_code_fence(content)).context("AI response was not the expected JSON")
}

/// Models sometimes wrap JSON in a markdown fence even in JSON mode.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(role: &str, body: serde_json::Value) -> ChatTurn {
        let mut value = body;
        value["role"] = json!(role);
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_chat_maps_model_role_to_assistant() {
        let history = vec![
            turn("user", json!({ "parts": [{ "text": "I feel tired" }] })),
            turn("model", json!({ "parts": [{ "text": "That sounds hard." }] })),
        ];
        let messages = chat_messages(&history, "Any tips?");

        let roles: Vec<&str> = messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
        assert_eq!(messages[2].content, "That sounds hard.");
        assert_eq!(messages[3].content, "Any tips?");
    }

    #[test]
    fn test_chat_turn_accepts_flat_text() {
        let flat = turn("model", json!({ "text": "flat reply" }));
        assert_eq!(flat.content(), "flat reply");

        let empty_part = turn("user", json!({ "parts": [{ "text": "" }], "text": "fallback" }));
        assert_eq!(empty_part.content(), "fallback");

        let nothing = turn("user", json!({}));
        assert_eq!(nothing.content(), "");
    }

    #[test]
    fn test_analysis_prompt_includes_note_and_stress() {
        let messages = analysis_messages("Deadline week", 8);
        assert_eq!(messages[0].role, "system");
        assert!(messages[0].content.contains("sentimentScore"));
        assert_eq!(
            messages[1].content,
            "User Note: \"Deadline week\". User reported stress level: 8/10."
        );
    }

    #[test]
    fn test_report_prompt_compacts_entries() {
        let entries: Vec<ReportEntry> = serde_json::from_value(json!([
            { "stressLevel": 6, "mood": "Bad", "tags": ["work"], "note": "not sent" },
            { "stressLevel": 2, "mood": "Great" }
        ]))
        .unwrap();

        let messages = report_messages(&entries).unwrap();
        assert_eq!(
            messages[1].content,
            r#"[{"s":6,"m":"Bad","t":["work"]},{"s":2,"m":"Great","t":[]}]"#
        );
    }

    #[test]
    fn test_offline_analysis_is_deterministic() {
        let calm = offline_analysis(3);
        assert_eq!(calm.sentiment_score, 0.0);
        assert!(!calm.burnout_risk);
        assert_eq!(calm.tags, vec![OFFLINE_TAG.to_string()]);

        assert!(!offline_analysis(7).burnout_risk);
        assert!(offline_analysis(8).burnout_risk);
    }

    #[test]
    fn test_parse_analysis_clamps_and_truncates() {
        let parsed = parse_analysis(
            r#"{"sentimentScore": -3.5, "burnoutRisk": true, "aiIntervention": "Rest", "tags": ["a","b","c","d"]}"#,
        )
        .unwrap();
        assert_eq!(parsed.sentiment_score, -1.0);
        assert_eq!(parsed.tags.len(), 3);
    }

    #[test]
    fn test_parse_json_strips_code_fence() {
        let fenced = "```json\n{\"sentimentScore\":0.4,\"burnoutRisk\":false,\"aiIntervention\":\"Walk\"}\n```";
        let parsed = parse_analysis(fenced).unwrap();
        assert_eq!(parsed.sentiment_score, 0.4);
        assert!(parsed.tags.is_empty());
    }

    #[test]
    fn test_parse_analysis_rejects_garbage() {
        assert!(parse_analysis("I think you are fine").is_err());
    }

    #[tokio::test]
    async fn test_gateway_without_key_is_not_configured() {
        let gateway = AiGateway::new(&Config::for_tests()).unwrap();
        assert!(!gateway.is_configured());
        let err = gateway.analyze_entry("note", 5).await.unwrap_err();
        assert!(matches!(err, AiError::NotConfigured));
    }

    #[tokio::test]
    async fn test_gateway_unreachable_provider_is_call_error() {
        let config = Config {
            ai_api_key: Some("sk-test-key-123".into()),
            ..Config::for_tests()
        };
        let gateway = AiGateway::new(&config).unwrap();
        assert_eq!(gateway.masked_key().as_deref(), Some("sk-test-...****"));

        let err = gateway.chat(&[], "hello").await.unwrap_err();
        assert!(matches!(err, AiError::Call(_)));
    }
}
