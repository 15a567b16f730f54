use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    cats::{
        dto::{AreaQuery, CreateCatRequest, UpdateCatRequest},
        repo_types::Cat,
        services::{bounding_box, cat_changes, ensure_admin, ensure_owner, new_cat},
    },
    error::{AppError, DataResponse},
    extract::{ApiJson, ApiPath, ApiQuery},
    state::AppState,
};

pub fn cat_routes() -> Router<AppState> {
    Router::new()
        .route("/cat", get(list_cats).post(create_cat))
        .route("/cat/user", get(list_my_cats))
        .route("/cat/area", get(list_cats_in_area))
        .route(
            "/cat/admin/:id",
            put(update_cat_admin).delete(delete_cat_admin),
        )
        .route(
            "/cat/:id",
            get(get_cat).put(update_cat).delete(delete_cat),
        )
}

async fn load_cat(state: &AppState, id: Uuid) -> Result<Cat, AppError> {
    state.cats.find_by_id(id).await?.ok_or_else(|| {
        warn!(cat_id = %id, "cat not found");
        AppError::NotFound("Cat not found".into())
    })
}

#[instrument(skip(state))]
pub async fn list_cats(State(state): State<AppState>) -> Result<Json<Vec<Cat>>, AppError> {
    Ok(Json(state.cats.list().await?))
}

#[instrument(skip(state))]
pub async fn get_cat(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Cat>, AppError> {
    Ok(Json(load_cat(&state, id).await?))
}

#[instrument(skip(state), fields(user_id = %auth.id))]
pub async fn list_my_cats(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<Cat>>, AppError> {
    Ok(Json(state.cats.list_by_owner(auth.id).await?))
}

/// GET /cat/area?topRight=lng,lat&bottomLeft=lng,lat
#[instrument(skip(state))]
pub async fn list_cats_in_area(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<AreaQuery>,
) -> Result<Json<Vec<Cat>>, AppError> {
    let bbox = bounding_box(&q.bottom_left, &q.top_right)?;
    Ok(Json(state.cats.list_within(bbox).await?))
}

#[instrument(skip(state, payload), fields(user_id = %auth.id))]
pub async fn create_cat(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(payload): ApiJson<CreateCatRequest>,
) -> Result<(StatusCode, Json<DataResponse<Cat>>), AppError> {
    let new = new_cat(payload, &auth)?;

    // Token may outlive its user
    if state.users.find_by_id(auth.id).await?.is_none() {
        return Err(AppError::Unauthorized("User not found".into()));
    }

    let cat = state.cats.create(new).await?;
    info!(cat_id = %cat.id, "cat created");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse::new("Cat created", cat)),
    ))
}

#[instrument(skip(state, payload), fields(user_id = %auth.id))]
pub async fn update_cat(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateCatRequest>,
) -> Result<Json<DataResponse<Cat>>, AppError> {
    let cat = load_cat(&state, id).await?;
    ensure_owner(&auth, &cat, "update")
        .inspect_err(|_| warn!(cat_id = %id, "update by non-owner"))?;
    if payload.owner.is_some() {
        ensure_admin(&auth, "change cat owner")
            .inspect_err(|_| warn!(cat_id = %id, "owner change by non-admin"))?;
    }

    let changes = cat_changes(payload)?;
    let cat = state
        .cats
        .update(id, changes)
        .await?
        .ok_or_else(|| AppError::NotFound("Cat not found".into()))?;
    info!(cat_id = %id, "cat updated");
    Ok(Json(DataResponse::new("Cat updated", cat)))
}

#[instrument(skip(state), fields(user_id = %auth.id))]
pub async fn delete_cat(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<DataResponse<Cat>>, AppError> {
    let cat = load_cat(&state, id).await?;
    ensure_owner(&auth, &cat, "delete")
        .inspect_err(|_| warn!(cat_id = %id, "delete by non-owner"))?;

    let cat = state
        .cats
        .delete(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Cat not found".into()))?;
    info!(cat_id = %id, "cat deleted");
    Ok(Json(DataResponse::new("Cat deleted", cat)))
}

/// Admin path: the full payload applies, owner reassignment included.
#[instrument(skip(state, payload), fields(user_id = %auth.id))]
pub async fn update_cat_admin(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateCatRequest>,
) -> Result<Json<DataResponse<Cat>>, AppError> {
    load_cat(&state, id).await?;
    ensure_admin(&auth, "update cat via admin route")
        .inspect_err(|_| warn!(cat_id = %id, "admin update by non-admin"))?;

    if let Some(owner_id) = payload.owner {
        if state.users.find_by_id(owner_id).await?.is_none() {
            return Err(AppError::BadRequest("Unknown owner".into()));
        }
    }

    let changes = cat_changes(payload)?;
    let cat = state
        .cats
        .update(id, changes)
        .await?
        .ok_or_else(|| AppError::NotFound("Cat not found".into()))?;
    info!(cat_id = %id, owner_id = %cat.owner.id, "cat updated by admin");
    Ok(Json(DataResponse::new("Cat updated", cat)))
}

#[instrument(skip(state), fields(user_id = %auth.id))]
pub async fn delete_cat_admin(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<DataResponse<Cat>>, AppError> {
    load_cat(&state, id).await?;
    ensure_admin(&auth, "delete cat via admin route")
        .inspect_err(|_| warn!(cat_id = %id, "admin delete by non-admin"))?;

    let cat = state
        .cats
        .delete(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Cat not found".into()))?;
    info!(cat_id = %id, "cat deleted by admin");
    Ok(Json(DataResponse::new("Cat deleted", cat)))
}
