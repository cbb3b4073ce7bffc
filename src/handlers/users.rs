use crate::handlers::{actor, error_response, service_error, user_dto, HandlerError};
use crate::schemas::{
    user_cache_key, AdjustMoneyRequest, ApiResponse, AppState, CachedData, ChangeRoleRequest,
    CreateUserRequest, SteamLoginRequest, UpdateUserRequest, UserDto,
};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use axum_valid::Valid;
use model::{Role, UserId};
use service::users::{self, NewUser, ProfileUpdate};
use tracing::{debug, info, instrument, trace};

fn parse_role(raw: &str) -> Result<Role, HandlerError> {
    raw.parse::<Role>()
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string()))
}

/// Caches a freshly loaded user, then drops the entry again if the row has
/// moved on since the load. A write that committed in between may already
/// have run its invalidation, which would otherwise leave the stale payload
/// cached until it expires.
pub(crate) async fn cache_if_current(state: &AppState, dto: &UserDto) -> service::Result<()> {
    let cache_key = user_cache_key(dto.id);
    state.cache.insert(cache_key.clone(), CachedData::User(dto.clone())).await;

    let current = users::current_version(&state.db, UserId(dto.id)).await?;
    if current != Some(dto.version) {
        debug!(
            "User {} changed while loading (cached version {}), dropping cache entry",
            dto.id, dto.version
        );
        state.cache.invalidate(&cache_key).await;
    }
    Ok(())
}

/// Provision a new account
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created successfully", body = ApiResponse<UserDto>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Steam id already registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, headers))]
pub async fn create_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Valid(Json(request)): Valid<Json<CreateUserRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<UserDto>>), HandlerError> {
    trace!("Entering create_user function");
    debug!("Creating user for Steam id {}", request.steam_id);

    let role = request.role.as_deref().map(parse_role).transpose()?;
    let new_user = NewUser {
        steam_id: request.steam_id,
        user_name: request.user_name,
        role,
        avatar_small: request.avatar_small,
        avatar_medium: request.avatar_medium,
        avatar_full: request.avatar_full,
    };

    let created = users::provision_user(&state.db, new_user, &actor(&headers))
        .await
        .map_err(service_error)?;

    info!("User created successfully with ID: {}", created.id().0);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(user_dto(&created), "User created successfully")),
    ))
}

/// Log in with a Steam identity, provisioning the account on first login
#[utoipa::path(
    post,
    path = "/api/v1/users/login",
    tag = "users",
    request_body = SteamLoginRequest,
    responses(
        (status = 200, description = "User logged in", body = ApiResponse<UserDto>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, headers))]
pub async fn login_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Valid(Json(request)): Valid<Json<SteamLoginRequest>>,
) -> Result<Json<ApiResponse<UserDto>>, HandlerError> {
    trace!("Entering login_user function");

    let profile = NewUser {
        steam_id: request.steam_id,
        user_name: request.user_name,
        role: None,
        avatar_small: request.avatar_small,
        avatar_medium: request.avatar_medium,
        avatar_full: request.avatar_full,
    };

    let user = users::login(&state.db, profile, &actor(&headers))
        .await
        .map_err(service_error)?;
    state.cache.invalidate(&user_cache_key(user.id().0)).await;

    info!("User {} logged in", user.id().0);
    Ok(Json(ApiResponse::ok(user_dto(&user), "User logged in successfully")))
}

/// Get all users
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "users",
    responses(
        (status = 200, description = "Users retrieved successfully", body = ApiResponse<Vec<UserDto>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_users(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<UserDto>>>, HandlerError> {
    trace!("Entering get_users function");

    let all = users::list_users(&state.db).await.map_err(service_error)?;
    debug!("Retrieved {} users from database", all.len());

    let data: Vec<UserDto> = all.iter().map(user_dto).collect();
    Ok(Json(ApiResponse::ok(data, "Users retrieved successfully")))
}

/// Get a user by ID
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}",
    tag = "users",
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "User retrieved successfully", body = ApiResponse<UserDto>),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_user(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<UserDto>>, HandlerError> {
    trace!("Entering get_user function for user_id: {}", user_id);

    let cache_key = user_cache_key(user_id);
    if let Some(CachedData::User(dto)) = state.cache.get(&cache_key).await {
        debug!("Returning cached user {}", user_id);
        return Ok(Json(ApiResponse::ok(dto, "User retrieved successfully")));
    }

    let user = users::load_user(&state.db, UserId(user_id))
        .await
        .map_err(service_error)?;
    let dto = user_dto(&user);
    cache_if_current(&state, &dto).await.map_err(service_error)?;

    Ok(Json(ApiResponse::ok(dto, "User retrieved successfully")))
}

/// Get a user by Steam id
#[utoipa::path(
    get,
    path = "/api/v1/users/steam/{steam_id}",
    tag = "users",
    params(
        ("steam_id" = i64, Path, description = "64-bit Steam account id"),
    ),
    responses(
        (status = 200, description = "User retrieved successfully", body = ApiResponse<UserDto>),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_user_by_steam_id(
    Path(steam_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<UserDto>>, HandlerError> {
    let user = users::find_by_steam_id(&state.db, steam_id)
        .await
        .map_err(service_error)?;
    Ok(Json(ApiResponse::ok(user_dto(&user), "User retrieved successfully")))
}

/// Update a user's profile
#[utoipa::path(
    put,
    path = "/api/v1/users/{user_id}",
    tag = "users",
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated successfully", body = ApiResponse<UserDto>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Concurrent modification", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, headers))]
pub async fn update_user(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Valid(Json(request)): Valid<Json<UpdateUserRequest>>,
) -> Result<Json<ApiResponse<UserDto>>, HandlerError> {
    trace!("Entering update_user function for user_id: {}", user_id);

    let update = ProfileUpdate {
        user_name: request.user_name,
        avatar_small: request.avatar_small,
        avatar_medium: request.avatar_medium,
        avatar_full: request.avatar_full,
    };

    let user = users::update_profile(&state.db, UserId(user_id), update, &actor(&headers))
        .await
        .map_err(service_error)?;
    state.cache.invalidate(&user_cache_key(user_id)).await;

    info!("User {} updated successfully", user_id);
    Ok(Json(ApiResponse::ok(user_dto(&user), "User updated successfully")))
}

/// Delete a user together with everything it owns
#[utoipa::path(
    delete,
    path = "/api/v1/users/{user_id}",
    tag = "users",
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "User deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_user(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, HandlerError> {
    trace!("Entering delete_user function for user_id: {}", user_id);

    users::delete_user(&state.db, UserId(user_id))
        .await
        .map_err(service_error)?;
    state.cache.invalidate(&user_cache_key(user_id)).await;

    info!("User with ID {} deleted successfully", user_id);
    Ok(Json(ApiResponse::ok(
        format!("User {} deleted", user_id),
        "User deleted successfully",
    )))
}

/// Credit or debit a user's balance
#[utoipa::path(
    post,
    path = "/api/v1/users/{user_id}/money",
    tag = "users",
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    request_body = AdjustMoneyRequest,
    responses(
        (status = 200, description = "Balance adjusted", body = ApiResponse<UserDto>),
        (status = 400, description = "Balance would become negative", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Concurrent modification", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, headers))]
pub async fn adjust_user_money(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AdjustMoneyRequest>,
) -> Result<Json<ApiResponse<UserDto>>, HandlerError> {
    debug!("Adjusting balance of user {} by {}", user_id, request.delta);

    let user = users::adjust_money(&state.db, UserId(user_id), request.delta, &actor(&headers))
        .await
        .map_err(service_error)?;
    state.cache.invalidate(&user_cache_key(user_id)).await;

    Ok(Json(ApiResponse::ok(user_dto(&user), "Balance adjusted successfully")))
}

/// Change a user's role
#[utoipa::path(
    put,
    path = "/api/v1/users/{user_id}/role",
    tag = "users",
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    request_body = ChangeRoleRequest,
    responses(
        (status = 200, description = "Role changed", body = ApiResponse<UserDto>),
        (status = 400, description = "Unknown role", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, headers))]
pub async fn change_user_role(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ChangeRoleRequest>,
) -> Result<Json<ApiResponse<UserDto>>, HandlerError> {
    let role = parse_role(&request.role)?;

    let user = users::change_role(&state.db, UserId(user_id), role, &actor(&headers))
        .await
        .map_err(service_error)?;
    state.cache.invalidate(&user_cache_key(user_id)).await;

    info!("User {} now has role {}", user_id, role);
    Ok(Json(ApiResponse::ok(user_dto(&user), "Role changed successfully")))
}
