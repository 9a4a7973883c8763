use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use validator::Validate;

use crate::dto::{AnnouncementRequest, AnnouncementResponse, GroupQuery, VibeRequest, VibeResponse};
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppQuery};
use crate::models::entry::EntryFilter;
use crate::models::group::{normalize_group_code, GroupSummary, VibeOutcome};
use crate::services::pulse::GroupPulse;
use crate::AppState;

/// Vibes roll over at UTC midnight.
fn vibe_day() -> NaiveDate {
    Utc::now().date_naive()
}

pub async fn get_group(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    AppQuery(query): AppQuery<GroupQuery>,
) -> AppResult<Json<GroupSummary>> {
    let group_id = normalize_group_code(&group_id);
    let user_id = query.user_id.as_deref().filter(|u| !u.is_empty());

    let summary = state
        .store
        .group_summary(&group_id, user_id, vibe_day())
        .await?;
    Ok(Json(summary))
}

pub async fn update_announcement(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    AppJson(body): AppJson<AnnouncementRequest>,
) -> AppResult<Json<AnnouncementResponse>> {
    body.validate()?;
    let group_id = normalize_group_code(&group_id);

    let group = state
        .store
        .set_announcement(&group_id, &body.announcement)
        .await?;

    tracing::info!(group_id = %group.group_id, "Announcement updated");
    Ok(Json(AnnouncementResponse {
        success: true,
        announcement: group.announcement,
    }))
}

pub async fn send_vibe(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    AppJson(body): AppJson<VibeRequest>,
) -> AppResult<Json<VibeResponse>> {
    body.validate()?;
    let group_id = normalize_group_code(&group_id);

    match state
        .store
        .record_vibe(&group_id, &body.user_id, vibe_day())
        .await?
    {
        VibeOutcome::Recorded { vibes } => {
            tracing::info!(group_id = %group_id, user_id = %body.user_id, vibes, "Vibe recorded");
            Ok(Json(VibeResponse {
                success: true,
                vibes,
            }))
        }
        VibeOutcome::AlreadyVibed => Err(AppError::Validation("Daily vibe limit reached".into())),
    }
}

pub async fn group_pulse(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> AppResult<Json<GroupPulse>> {
    let filter = EntryFilter {
        group_id: Some(normalize_group_code(&group_id)),
        ..Default::default()
    };
    let entries = state.store.list_entries(&filter).await?;
    Ok(Json(GroupPulse::from_entries(&entries)))
}
