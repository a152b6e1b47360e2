//! Doctor onboarding by hospital admins, doctors' own profiles and stock lookup.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use medtrack_core::model::Role;
use medtrack_core::DoctorDocument;
use serde_json::Value;

use crate::caller::Caller;
use crate::dto::{AvailabilityQuery, AvailabilityRes, DoctorRegisterReq, DoctorRes, ErrorRes};
use crate::error::ApiResult;
use crate::AppState;

const ADMINS_ONLY: &str = "Only admin can manage doctors";

#[utoipa::path(
    post,
    path = "/api/admin/doctors",
    request_body = DoctorRegisterReq,
    responses(
        (status = 201, description = "Doctor onboarded and activation email sent", body = DoctorRes),
        (status = 403, description = "Caller is not an admin", body = ErrorRes),
        (status = 409, description = "Email already registered", body = ErrorRes)
    )
)]
/// Onboard a doctor from a name and email into the admin's hospital.
#[axum::debug_handler]
pub async fn admin_register(
    State(state): State<AppState>,
    Caller(admin): Caller,
    Json(req): Json<DoctorRegisterReq>,
) -> ApiResult<(StatusCode, Json<DoctorRes>)> {
    let document = state
        .doctors
        .admin_register(&admin, &req.name, &req.email)?;
    Ok((StatusCode::CREATED, Json(DoctorRes::onboarded(document))))
}

#[utoipa::path(
    get,
    path = "/api/admin/doctors",
    responses(
        (status = 200, description = "Profiles of the doctors in the admin's hospital"),
        (status = 403, description = "Caller is not an admin", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn admin_list(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Json<Vec<DoctorDocument>>> {
    let admin = caller.require(Role::Admin, ADMINS_ONLY)?;
    Ok(Json(state.doctors.list_by_hospital(admin.hospital_id)?))
}

#[utoipa::path(
    get,
    path = "/api/admin/doctors/template",
    responses(
        (status = 200, description = "Blank doctor profile document")
    )
)]
#[axum::debug_handler]
pub async fn template(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Json<DoctorDocument>> {
    caller.require(Role::Admin, ADMINS_ONLY)?;
    Ok(Json(state.doctors.template()))
}

#[utoipa::path(
    post,
    path = "/api/admin/doctors/profile",
    responses(
        (status = 201, description = "Doctor onboarded from a full profile document"),
        (status = 400, description = "Name or email missing", body = ErrorRes),
        (status = 403, description = "Caller is not an admin", body = ErrorRes),
        (status = 409, description = "Email already registered", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn admin_create(
    State(state): State<AppState>,
    Caller(admin): Caller,
    Json(payload): Json<Value>,
) -> ApiResult<(StatusCode, Json<DoctorDocument>)> {
    let document = state.doctors.admin_create(&admin, payload)?;
    Ok((StatusCode::CREATED, Json(document)))
}

#[utoipa::path(
    put,
    path = "/api/admin/doctors/{doctor_id}",
    params(
        ("doctor_id" = i64, Path, description = "Account id of the doctor")
    ),
    responses(
        (status = 200, description = "The stored profile"),
        (status = 403, description = "Not an admin, or doctor in another hospital", body = ErrorRes),
        (status = 404, description = "Unknown doctor", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn admin_update(
    State(state): State<AppState>,
    Caller(admin): Caller,
    Path(doctor_id): Path<i64>,
    Json(payload): Json<Value>,
) -> ApiResult<Json<DoctorDocument>> {
    Ok(Json(state.doctors.admin_update(&admin, doctor_id, payload)?))
}

#[utoipa::path(
    get,
    path = "/api/doctor/profile",
    responses(
        (status = 200, description = "The caller's profile"),
        (status = 403, description = "Caller is not a doctor", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn my_profile(
    State(state): State<AppState>,
    Caller(doctor): Caller,
) -> ApiResult<Json<DoctorDocument>> {
    Ok(Json(state.doctors.self_get(&doctor)?))
}

#[utoipa::path(
    put,
    path = "/api/doctor/profile",
    responses(
        (status = 200, description = "The stored profile; the login email is kept"),
        (status = 403, description = "Caller is not a doctor", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn update_my_profile(
    State(state): State<AppState>,
    Caller(doctor): Caller,
    Json(payload): Json<Value>,
) -> ApiResult<Json<DoctorDocument>> {
    Ok(Json(state.doctors.self_update(&doctor, payload)?))
}

#[utoipa::path(
    get,
    path = "/api/doctor/pharmacies/availability",
    params(AvailabilityQuery),
    responses(
        (status = 200, description = "In-stock items across pharmacies", body = [AvailabilityRes]),
        (status = 403, description = "Caller is not a doctor", body = ErrorRes)
    )
)]
/// Pharmacies that can fill a prescription for the named medicine.
#[axum::debug_handler]
pub async fn availability(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<AvailabilityQuery>,
) -> ApiResult<Json<Vec<AvailabilityRes>>> {
    caller.require(Role::Doctor, "Only doctors can look up pharmacy stock")?;
    let found = state.pharmacies.availability(&query.medicine_name)?;
    Ok(Json(found.into_iter().map(Into::into).collect()))
}
