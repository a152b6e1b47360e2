//! Pharmacy accounts, inventory and the delivery ledger.
//!
//! Everything under `/api/pharmacy` is scoped to the pharmacy named by the bearer token.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};

use crate::caller::PharmacyCaller;
use crate::dto::{
    DeliveryReq, DeliveryRes, ErrorRes, InventoryItemReq, InventoryItemRes, LoginReq,
    PharmacyAuthRes, PharmacyProfileRes, PharmacyProfileUpdateReq, PharmacyRegisterReq, StatusReq,
};
use crate::error::ApiResult;
use crate::AppState;

#[utoipa::path(
    post,
    path = "/auth/pharmacy/register",
    request_body = PharmacyRegisterReq,
    responses(
        (status = 201, description = "Pharmacy registered", body = PharmacyProfileRes),
        (status = 409, description = "Email already registered", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<PharmacyRegisterReq>,
) -> ApiResult<(StatusCode, Json<PharmacyProfileRes>)> {
    let profile = state.pharmacies.register(&req.into())?;
    Ok((StatusCode::CREATED, Json(profile.into())))
}

#[utoipa::path(
    post,
    path = "/auth/pharmacy/login",
    request_body = LoginReq,
    responses(
        (status = 200, description = "Pharmacy bearer token and profile", body = PharmacyAuthRes),
        (status = 401, description = "Invalid credentials", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginReq>,
) -> ApiResult<Json<PharmacyAuthRes>> {
    let (token, profile) = state.pharmacies.login(&req.email, &req.password)?;
    Ok(Json(PharmacyAuthRes {
        token,
        pharmacy: profile.into(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/pharmacy/profile",
    responses(
        (status = 200, description = "The caller's profile", body = PharmacyProfileRes)
    )
)]
#[axum::debug_handler]
pub async fn profile(
    State(state): State<AppState>,
    PharmacyCaller(email): PharmacyCaller,
) -> ApiResult<Json<PharmacyProfileRes>> {
    Ok(Json(state.pharmacies.profile(&email)?.into()))
}

#[utoipa::path(
    put,
    path = "/api/pharmacy/profile",
    request_body = PharmacyProfileUpdateReq,
    responses(
        (status = 200, description = "Updated profile", body = PharmacyProfileRes),
        (status = 409, description = "Email already registered", body = ErrorRes)
    )
)]
/// Update the caller's profile. A changed email takes effect at the next login.
#[axum::debug_handler]
pub async fn update_profile(
    State(state): State<AppState>,
    PharmacyCaller(email): PharmacyCaller,
    Json(req): Json<PharmacyProfileUpdateReq>,
) -> ApiResult<Json<PharmacyProfileRes>> {
    let updated = state.pharmacies.update_profile(&email, &req.into())?;
    Ok(Json(updated.into()))
}

#[utoipa::path(
    get,
    path = "/api/pharmacy/inventory",
    responses(
        (status = 200, description = "Inventory, newest first", body = [InventoryItemRes])
    )
)]
#[axum::debug_handler]
pub async fn list_inventory(
    State(state): State<AppState>,
    PharmacyCaller(email): PharmacyCaller,
) -> ApiResult<Json<Vec<InventoryItemRes>>> {
    let items = state.pharmacies.list_inventory(&email)?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/api/pharmacy/inventory",
    request_body = InventoryItemReq,
    responses(
        (status = 201, description = "Item added", body = InventoryItemRes),
        (status = 400, description = "Invalid item", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn create_item(
    State(state): State<AppState>,
    PharmacyCaller(email): PharmacyCaller,
    Json(req): Json<InventoryItemReq>,
) -> ApiResult<(StatusCode, Json<InventoryItemRes>)> {
    let item = state.pharmacies.create_item(&email, &req.into())?;
    Ok((StatusCode::CREATED, Json(item.into())))
}

#[utoipa::path(
    put,
    path = "/api/pharmacy/inventory/{id}",
    params(
        ("id" = i64, Path, description = "Inventory item id")
    ),
    request_body = InventoryItemReq,
    responses(
        (status = 200, description = "Item updated", body = InventoryItemRes),
        (status = 404, description = "Item not found in this pharmacy", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn update_item(
    State(state): State<AppState>,
    PharmacyCaller(email): PharmacyCaller,
    Path(id): Path<i64>,
    Json(req): Json<InventoryItemReq>,
) -> ApiResult<Json<InventoryItemRes>> {
    let item = state.pharmacies.update_item(&email, id, &req.into())?;
    Ok(Json(item.into()))
}

#[utoipa::path(
    delete,
    path = "/api/pharmacy/inventory/{id}",
    params(
        ("id" = i64, Path, description = "Inventory item id")
    ),
    responses(
        (status = 204, description = "Item removed"),
        (status = 404, description = "Item not found in this pharmacy", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn delete_item(
    State(state): State<AppState>,
    PharmacyCaller(email): PharmacyCaller,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.pharmacies.delete_item(&email, id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/pharmacy/deliveries",
    responses(
        (status = 200, description = "Deliveries, most recent first", body = [DeliveryRes])
    )
)]
#[axum::debug_handler]
pub async fn list_deliveries(
    State(state): State<AppState>,
    PharmacyCaller(email): PharmacyCaller,
) -> ApiResult<Json<Vec<DeliveryRes>>> {
    let deliveries = state.pharmacies.list_deliveries(&email)?;
    Ok(Json(deliveries.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/api/pharmacy/deliveries",
    request_body = DeliveryReq,
    responses(
        (status = 201, description = "Delivery recorded", body = DeliveryRes),
        (status = 400, description = "Patient or medicine missing", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn create_delivery(
    State(state): State<AppState>,
    PharmacyCaller(email): PharmacyCaller,
    Json(req): Json<DeliveryReq>,
) -> ApiResult<(StatusCode, Json<DeliveryRes>)> {
    let delivery = state.pharmacies.create_delivery(&email, &req.into())?;
    Ok((StatusCode::CREATED, Json(delivery.into())))
}

#[utoipa::path(
    patch,
    path = "/api/pharmacy/deliveries/{id}",
    params(
        ("id" = i64, Path, description = "Delivery id")
    ),
    request_body = StatusReq,
    responses(
        (status = 200, description = "Status updated", body = DeliveryRes),
        (status = 404, description = "Delivery not found in this pharmacy", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn update_delivery(
    State(state): State<AppState>,
    PharmacyCaller(email): PharmacyCaller,
    Path(id): Path<i64>,
    Json(req): Json<StatusReq>,
) -> ApiResult<Json<DeliveryRes>> {
    let delivery = state
        .pharmacies
        .update_delivery_status(&email, id, &req.status)?;
    Ok(Json(delivery.into()))
}
