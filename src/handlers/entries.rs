use axum::{
    extract::State,
    Json,
};

use crate::dto::CreateEntryRequest;
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppQuery};
use crate::models::entry::{Entry, EntryFilter};
use crate::models::group::normalize_group_code;
use crate::AppState;

pub async fn create_entry(
    State(state): State<AppState>,
    AppJson(body): AppJson<CreateEntryRequest>,
) -> AppResult<Json<Entry>> {
    let new_entry = body.into_new_entry()?;
    let user_id = new_entry.user_id;
    let entry_date = new_entry.entry_date();

    let entry = state.store.create_entry(new_entry).await?.ok_or_else(|| {
        tracing::info!(user_id = %user_id, %entry_date, "Duplicate daily check-in rejected");
        AppError::Validation("Daily check-in already submitted".into())
    })?;

    tracing::info!(
        user_id = %entry.user_id,
        entry_id = %entry.id,
        burnout_risk = entry.burnout_risk,
        "Check-in saved"
    );
    Ok(Json(entry))
}

pub async fn list_entries(
    State(state): State<AppState>,
    AppQuery(mut filter): AppQuery<EntryFilter>,
) -> AppResult<Json<Vec<Entry>>> {
    filter.group_id = filter
        .group_id
        .filter(|g| !g.trim().is_empty())
        .map(|g| normalize_group_code(&g));

    let entries = state.store.list_entries(&filter).await?;
    Ok(Json(entries))
}
