use axum::{
    extract::State,
    Json,
};
use validator::Validate;

use crate::auth::password::{hash_password, verify_password};
use crate::db::DUPLICATE_USER;
use crate::dto::{AuthResponse, LoginRequest, SignupRequest, UsersQuery};
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppQuery};
use crate::models::group::normalize_group_code;
use crate::models::user::{avatar_url_for, NewUser, User};
use crate::AppState;

pub async fn login(
    State(state): State<AppState>,
    AppJson(body): AppJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    body.validate().map_err(|_| AppError::Unauthorized)?;

    let user = state
        .store
        .find_user_by_email(body.email.trim())
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !verify_password(&body.password, &user.password_hash)? {
        tracing::info!(user_id = %user.id, "Login rejected: password mismatch");
        return Err(AppError::Unauthorized);
    }

    tracing::info!(user_id = %user.id, group_id = %user.group_id, "User logged in");
    Ok(Json(AuthResponse { user }))
}

pub async fn signup(
    State(state): State<AppState>,
    AppJson(body): AppJson<SignupRequest>,
) -> AppResult<Json<AuthResponse>> {
    body.validate()?;

    let email = body.email.trim();
    if state.store.find_user_by_email(email).await?.is_some() {
        return Err(AppError::Validation(DUPLICATE_USER.into()));
    }

    // The store re-checks the email under its own uniqueness guarantee.
    let user = state
        .store
        .create_user(NewUser {
            name: body.name.trim().to_string(),
            email: email.to_string(),
            password_hash: hash_password(&body.password)?,
            role: body.role.unwrap_or_default(),
            group_id: normalize_group_code(&body.group_code),
            avatar_url: avatar_url_for(body.name.trim()),
        })
        .await?;

    tracing::info!(user_id = %user.id, group_id = %user.group_id, role = ?user.role, "User signed up");
    Ok(Json(AuthResponse { user }))
}

pub async fn list_users(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<UsersQuery>,
) -> AppResult<Json<Vec<User>>> {
    let group_id = query
        .group_id
        .filter(|g| !g.trim().is_empty())
        .ok_or_else(|| AppError::Validation("GroupId required".into()))?;

    let members = state
        .store
        .list_group_members(&normalize_group_code(&group_id))
        .await?;
    Ok(Json(members))
}
