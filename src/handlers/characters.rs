use crate::handlers::{actor, character_dto, service_error, HandlerError};
use crate::schemas::{
    user_cache_key, ApiResponse, AppState, CharacterDto, CreateCharacterRequest,
    TransferRequest,
};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use axum_valid::Valid;
use model::{CharacterId, UserId};
use service::ownership;
use tracing::{debug, info, instrument};

/// List the characters a user owns
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/characters",
    tag = "characters",
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "Characters retrieved successfully", body = ApiResponse<Vec<CharacterDto>>),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_user_characters(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<CharacterDto>>>, HandlerError> {
    let characters = ownership::list_characters(&state.db, UserId(user_id))
        .await
        .map_err(service_error)?;
    debug!("Retrieved {} characters for user {}", characters.len(), user_id);

    let data: Vec<CharacterDto> = characters.into_iter().map(character_dto).collect();
    Ok(Json(ApiResponse::ok(data, "Characters retrieved successfully")))
}

/// Create a character for a user
#[utoipa::path(
    post,
    path = "/api/v1/users/{user_id}/characters",
    tag = "characters",
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    request_body = CreateCharacterRequest,
    responses(
        (status = 201, description = "Character created successfully", body = ApiResponse<CharacterDto>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, headers))]
pub async fn create_character(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Valid(Json(request)): Valid<Json<CreateCharacterRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<CharacterDto>>), HandlerError> {
    let created = ownership::create_character(&state.db, UserId(user_id), &request.name, &actor(&headers))
        .await
        .map_err(service_error)?;
    state.cache.invalidate(&user_cache_key(user_id)).await;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(character_dto(created), "Character created successfully")),
    ))
}

/// Delete a character through its owner
#[utoipa::path(
    delete,
    path = "/api/v1/users/{user_id}/characters/{character_id}",
    tag = "characters",
    params(
        ("user_id" = i32, Path, description = "Owning user ID"),
        ("character_id" = i32, Path, description = "Character ID"),
    ),
    responses(
        (status = 200, description = "Character deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Character not found", body = ErrorResponse),
        (status = 409, description = "Character owned by another user", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_character(
    Path((user_id, character_id)): Path<(i32, i32)>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, HandlerError> {
    ownership::delete_character(&state.db, UserId(user_id), CharacterId(character_id))
        .await
        .map_err(service_error)?;
    state.cache.invalidate(&user_cache_key(user_id)).await;

    Ok(Json(ApiResponse::ok(
        format!("Character {} deleted", character_id),
        "Character deleted successfully",
    )))
}

/// Move a character to another user
#[utoipa::path(
    post,
    path = "/api/v1/characters/{character_id}/transfer",
    tag = "characters",
    params(
        ("character_id" = i32, Path, description = "Character ID"),
    ),
    request_body = TransferRequest,
    responses(
        (status = 200, description = "Character transferred", body = ApiResponse<CharacterDto>),
        (status = 404, description = "Character or receiving user not found", body = ErrorResponse),
        (status = 409, description = "Sender does not own the character", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, headers))]
pub async fn transfer_character(
    Path(character_id): Path<i32>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<TransferRequest>,
) -> Result<Json<ApiResponse<CharacterDto>>, HandlerError> {
    let moved = ownership::transfer_character(
        &state.db,
        CharacterId(character_id),
        UserId(request.from_user_id),
        UserId(request.to_user_id),
        &actor(&headers),
    )
    .await
    .map_err(service_error)?;

    state.cache.invalidate(&user_cache_key(request.from_user_id)).await;
    state.cache.invalidate(&user_cache_key(request.to_user_id)).await;

    info!(
        "Character {} moved from user {} to user {}",
        character_id, request.from_user_id, request.to_user_id
    );
    Ok(Json(ApiResponse::ok(character_dto(moved), "Character transferred successfully")))
}
