use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{extractors::AuthUser, password::Password},
    error::{AppError, DataResponse},
    extract::{ApiJson, ApiPath},
    state::AppState,
    users::{
        dto::{CreateUserRequest, PublicUser, UpdateUserRequest},
        repo::DuplicateEmail,
        repo_types::{NewUser, Role, UserChanges},
        services::{normalize_email, normalize_user_name},
    },
};

/// The store's unique constraint backs up the pre-check: two writers can
/// both pass the lookup, and the loser must still see a 409.
fn email_conflict(err: anyhow::Error) -> AppError {
    match err.downcast::<DuplicateEmail>() {
        Ok(DuplicateEmail(email)) => {
            warn!(email = %email, "email already registered");
            AppError::Conflict("Email already registered".into())
        }
        Err(err) => AppError::Internal(err),
    }
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/user",
            get(list_users)
                .post(create_user)
                .put(update_current)
                .delete(delete_current),
        )
        .route("/user/token", get(check_token))
        .route("/user/:id", get(get_user))
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<PublicUser>>, AppError> {
    let users = state.users.list().await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<PublicUser>, AppError> {
    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<DataResponse<PublicUser>>), AppError> {
    let user_name = normalize_user_name(&payload.user_name)?;
    let email = normalize_email(&payload.email)?;
    let password = Password::parse(&payload.password)?;

    // Ensure email is not taken
    if state.users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let password_hash = password.hash().await?;
    let user = state
        .users
        .create(NewUser {
            user_name,
            email,
            password_hash,
            role: Role::User,
        })
        .await
        .map_err(email_conflict)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse::new("User created", user.into())),
    ))
}

#[instrument(skip(state, payload), fields(user_id = %auth.id))]
pub async fn update_current(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(payload): ApiJson<UpdateUserRequest>,
) -> Result<Json<DataResponse<PublicUser>>, AppError> {
    let mut changes = UserChanges::default();

    if let Some(name) = payload.user_name.as_deref() {
        changes.user_name = Some(normalize_user_name(name)?);
    }
    if let Some(raw) = payload.email.as_deref() {
        let email = normalize_email(raw)?;
        if let Some(other) = state.users.find_by_email(&email).await? {
            if other.id != auth.id {
                warn!(email = %email, "email already registered");
                return Err(AppError::Conflict("Email already registered".into()));
            }
        }
        changes.email = Some(email);
    }
    if let Some(raw) = payload.password.as_deref() {
        changes.password_hash = Some(Password::parse(raw)?.hash().await?);
    }

    let user = state
        .users
        .update(auth.id, changes)
        .await
        .map_err(email_conflict)?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    info!("user updated");
    Ok(Json(DataResponse::new("User updated", user.into())))
}

#[instrument(skip(state), fields(user_id = %auth.id))]
pub async fn delete_current(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<DataResponse<PublicUser>>, AppError> {
    if !state.users.delete(auth.id).await? {
        warn!("delete of missing user");
        return Err(AppError::NotFound("User not found".into()));
    }
    info!("user deleted");
    Ok(Json(DataResponse::new("User deleted", auth.public())))
}

/// Session check: answers from the token alone.
#[instrument(skip_all, fields(user_id = %auth.id))]
pub async fn check_token(auth: AuthUser) -> Json<PublicUser> {
    Json(auth.public())
}
