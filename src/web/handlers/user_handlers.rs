use axum::{
    extract::State,
    response::Json,
};
use serde::Deserialize;

use crate::models::{
    CreateUserViewModel, CurrentUser, ResultEnvelope, UpdateUserViewModel, UserDto, UserView,
};
use crate::web::extractors::{IdPath, QueryParams, ValidatedJson};
use crate::web::responses::ApiError;
use crate::web::router::AppState;

pub const USER_CREATED_MESSAGE: &str = "User created successfully!";
pub const USER_UPDATED_MESSAGE: &str = "User updated successfully!";
pub const USER_REMOVED_MESSAGE: &str = "User removed successfully!";
pub const USER_FOUND_MESSAGE: &str = "User found successfully!";
pub const USERS_FOUND_MESSAGE: &str = "Users found successfully!";
pub const NO_USER_WITH_ID_MESSAGE: &str = "No user was found with the given ID.";
pub const NO_USER_WITH_EMAIL_MESSAGE: &str = "No user was found with the given email.";
pub const NO_USER_WITH_NAME_MATCH_MESSAGE: &str = "No user was found with the given name";
pub const NO_USER_WITH_EMAIL_MATCH_MESSAGE: &str = "No user was found with the given email";

type EnvelopeResult<T> = Result<Json<ResultEnvelope<T>>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct NameQuery {
    #[serde(default)]
    pub name: String,
}

/// Searches answer `data: null` rather than `[]` when nothing matches
fn search_envelope(found: Vec<UserView>, empty_message: &str) -> ResultEnvelope<Vec<UserView>> {
    if found.is_empty() {
        ResultEnvelope::empty(empty_message)
    } else {
        ResultEnvelope::ok(USER_FOUND_MESSAGE, found)
    }
}

pub async fn create_user(
    State(state): State<AppState>,
    caller: CurrentUser,
    ValidatedJson(request): ValidatedJson<CreateUserViewModel>,
) -> EnvelopeResult<UserView> {
    let user = state.user_service.create(UserDto::from(request)).await?;

    tracing::info!(user_id = user.id, by = caller.id, "User created");
    Ok(Json(ResultEnvelope::ok(USER_CREATED_MESSAGE, user)))
}

pub async fn update_user(
    State(state): State<AppState>,
    caller: CurrentUser,
    ValidatedJson(request): ValidatedJson<UpdateUserViewModel>,
) -> EnvelopeResult<UserView> {
    let user = state.user_service.update(UserDto::from(request)).await?;

    tracing::info!(user_id = user.id, by = caller.id, "User updated");
    Ok(Json(ResultEnvelope::ok(USER_UPDATED_MESSAGE, user)))
}

pub async fn remove_user(
    State(state): State<AppState>,
    caller: CurrentUser,
    IdPath(id): IdPath,
) -> EnvelopeResult<()> {
    state.user_service.remove(id).await?;

    tracing::info!(user_id = id, by = caller.id, "User removed");
    Ok(Json(ResultEnvelope::empty(USER_REMOVED_MESSAGE)))
}

pub async fn get_user(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> EnvelopeResult<UserView> {
    let envelope = match state.user_service.get(id).await? {
        Some(user) => ResultEnvelope::ok(USER_FOUND_MESSAGE, user),
        None => ResultEnvelope::empty(NO_USER_WITH_ID_MESSAGE),
    };

    Ok(Json(envelope))
}

pub async fn get_all_users(State(state): State<AppState>) -> EnvelopeResult<Vec<UserView>> {
    let users = state.user_service.get_all().await?;

    Ok(Json(ResultEnvelope::ok(USERS_FOUND_MESSAGE, users)))
}

pub async fn get_user_by_email(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<EmailQuery>,
) -> EnvelopeResult<UserView> {
    let envelope = match state.user_service.get_by_email(&query.email).await? {
        Some(user) => ResultEnvelope::ok(USER_FOUND_MESSAGE, user),
        None => ResultEnvelope::empty(NO_USER_WITH_EMAIL_MESSAGE),
    };

    Ok(Json(envelope))
}

pub async fn search_users_by_name(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<NameQuery>,
) -> EnvelopeResult<Vec<UserView>> {
    let found = state.user_service.search_by_name(&query.name).await?;

    Ok(Json(search_envelope(found, NO_USER_WITH_NAME_MATCH_MESSAGE)))
}

pub async fn search_users_by_email(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<EmailQuery>,
) -> EnvelopeResult<Vec<UserView>> {
    let found = state.user_service.search_by_email(&query.email).await?;

    Ok(Json(search_envelope(found, NO_USER_WITH_EMAIL_MATCH_MESSAGE)))
}
