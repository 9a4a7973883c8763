use axum::{extract::State, Json};
use validator::Validate;

use crate::dto::{AnalyzeRequest, ChatRequest, ChatResponse, ReportRequest};
use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::services::ai::{offline_analysis, AiError, Analysis, GroupReport};
use crate::AppState;

/// Scores a check-in note. Provider failures degrade to the offline analysis
/// so the check-in flow never blocks on the AI service.
pub async fn analyze(
    State(state): State<AppState>,
    AppJson(body): AppJson<AnalyzeRequest>,
) -> AppResult<Json<Analysis>> {
    if !state.ai.is_configured() {
        return Err(AppError::AiUnavailable);
    }
    body.validate()?;
    let stress_level = body
        .stress_level
        .ok_or_else(|| AppError::Validation("stressLevel is required".into()))?;

    tracing::info!(stress_level, "AI analyze request");

    let analysis = match state.ai.analyze_entry(&body.note, stress_level).await {
        Ok(analysis) => analysis,
        Err(AiError::NotConfigured) => return Err(AppError::AiUnavailable),
        Err(AiError::Call(e)) => {
            tracing::warn!(error = %e, "AI provider unavailable, using offline analysis");
            offline_analysis(stress_level)
        }
    };

    Ok(Json(analysis))
}

pub async fn chat(
    State(state): State<AppState>,
    AppJson(body): AppJson<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    if !state.ai.is_configured() {
        return Err(AppError::AiUnavailable);
    }
    body.validate()?;

    let text = state.ai.chat(&body.history, &body.message).await?;

    tracing::info!(history_len = body.history.len(), "AI chat reply sent");
    Ok(Json(ChatResponse { text }))
}

pub async fn report(
    State(state): State<AppState>,
    AppJson(body): AppJson<ReportRequest>,
) -> AppResult<Json<GroupReport>> {
    if !state.ai.is_configured() {
        return Err(AppError::AiUnavailable);
    }

    // An empty list is still sent to the provider
    tracing::info!(entries = body.entries.len(), "Generating group report");

    let report = state
        .ai
        .group_report(&body.entries)
        .await
        .map_err(|e| match e {
            AiError::NotConfigured => AppError::AiUnavailable,
            AiError::Call(e) => AppError::Upstream(format!("Report generation failed: {e:#}")),
        })?;

    Ok(Json(report))
}
