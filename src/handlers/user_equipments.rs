use crate::handlers::{actor, equipment_dto, service_error, HandlerError};
use crate::schemas::{
    user_cache_key, ApiResponse, AppState, GrantEquipmentRequest, UserEquipmentDto,
    TransferRequest,
};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use axum_valid::Valid;
use model::{UserEquipmentId, UserId};
use service::ownership;
use tracing::{debug, info, instrument};

/// List the equipment instances a user owns
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/equipment",
    tag = "equipment",
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "Equipment retrieved successfully", body = ApiResponse<Vec<UserEquipmentDto>>),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_user_equipments(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<UserEquipmentDto>>>, HandlerError> {
    let equipment = ownership::list_user_equipments(&state.db, UserId(user_id))
        .await
        .map_err(service_error)?;
    debug!("Retrieved {} equipment instances for user {}", equipment.len(), user_id);

    let data: Vec<UserEquipmentDto> = equipment.into_iter().map(equipment_dto).collect();
    Ok(Json(ApiResponse::ok(data, "Equipment retrieved successfully")))
}

/// Grant a user a new equipment instance
#[utoipa::path(
    post,
    path = "/api/v1/users/{user_id}/equipment",
    tag = "equipment",
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    request_body = GrantEquipmentRequest,
    responses(
        (status = 201, description = "Equipment granted successfully", body = ApiResponse<UserEquipmentDto>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, headers))]
pub async fn grant_equipment(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Valid(Json(request)): Valid<Json<GrantEquipmentRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<UserEquipmentDto>>), HandlerError> {
    let granted = ownership::grant_equipment(&state.db, UserId(user_id), &request.name, &actor(&headers))
        .await
        .map_err(service_error)?;
    state.cache.invalidate(&user_cache_key(user_id)).await;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(equipment_dto(granted), "Equipment granted successfully")),
    ))
}

/// Remove an equipment instance through its owner
#[utoipa::path(
    delete,
    path = "/api/v1/users/{user_id}/equipment/{equipment_id}",
    tag = "equipment",
    params(
        ("user_id" = i32, Path, description = "Owning user ID"),
        ("equipment_id" = i32, Path, description = "Equipment instance ID"),
    ),
    responses(
        (status = 200, description = "Equipment removed successfully", body = ApiResponse<String>),
        (status = 404, description = "Equipment instance not found", body = ErrorResponse),
        (status = 409, description = "Equipment owned by another user", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn remove_equipment(
    Path((user_id, equipment_id)): Path<(i32, i32)>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, HandlerError> {
    ownership::remove_equipment(&state.db, UserId(user_id), UserEquipmentId(equipment_id))
        .await
        .map_err(service_error)?;
    state.cache.invalidate(&user_cache_key(user_id)).await;

    Ok(Json(ApiResponse::ok(
        format!("Equipment {} removed", equipment_id),
        "Equipment removed successfully",
    )))
}

/// Move an equipment instance to another user
#[utoipa::path(
    post,
    path = "/api/v1/equipment/{equipment_id}/transfer",
    tag = "equipment",
    params(
        ("equipment_id" = i32, Path, description = "Equipment instance ID"),
    ),
    request_body = TransferRequest,
    responses(
        (status = 200, description = "Equipment transferred", body = ApiResponse<UserEquipmentDto>),
        (status = 404, description = "Equipment or receiving user not found", body = ErrorResponse),
        (status = 409, description = "Sender does not own the equipment", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, headers))]
pub async fn transfer_equipment(
    Path(equipment_id): Path<i32>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<TransferRequest>,
) -> Result<Json<ApiResponse<UserEquipmentDto>>, HandlerError> {
    let moved = ownership::transfer_equipment(
        &state.db,
        UserEquipmentId(equipment_id),
        UserId(request.from_user_id),
        UserId(request.to_user_id),
        &actor(&headers),
    )
    .await
    .map_err(service_error)?;

    state.cache.invalidate(&user_cache_key(request.from_user_id)).await;
    state.cache.invalidate(&user_cache_key(request.to_user_id)).await;

    info!(
        "Equipment {} moved from user {} to user {}",
        equipment_id, request.from_user_id, request.to_user_id
    );
    Ok(Json(ApiResponse::ok(equipment_dto(moved), "Equipment transferred successfully")))
}
