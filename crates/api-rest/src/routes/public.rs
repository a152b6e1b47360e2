//! Unauthenticated endpoints.

use axum::{extract::State, response::Json};
use medtrack_core::DoctorDocument;

use crate::dto::{HealthRes, HospitalSummaryRes, MedicineRes};
use crate::error::ApiResult;
use crate::AppState;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks.
#[axum::debug_handler]
pub async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "MedTrack REST API is alive".into(),
    })
}

#[utoipa::path(
    get,
    path = "/public/hospitals",
    responses(
        (status = 200, description = "Active hospitals, alphabetically", body = [HospitalSummaryRes])
    )
)]
/// Hospitals a new patient or doctor can register with.
#[axum::debug_handler]
pub async fn list_hospitals(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<HospitalSummaryRes>>> {
    let hospitals = state.hospitals.list()?;
    Ok(Json(hospitals.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/public/doctors",
    responses(
        (status = 200, description = "Profile documents of every doctor")
    )
)]
/// Doctor directory across all hospitals.
#[axum::debug_handler]
pub async fn list_doctors(State(state): State<AppState>) -> ApiResult<Json<Vec<DoctorDocument>>> {
    Ok(Json(state.doctors.list_all_doctors()?))
}

#[utoipa::path(
    get,
    path = "/public/medicines",
    responses(
        (status = 200, description = "Medicine catalogue", body = [MedicineRes])
    )
)]
#[axum::debug_handler]
pub async fn list_medicines(State(state): State<AppState>) -> ApiResult<Json<Vec<MedicineRes>>> {
    let medicines = state.catalogue.list()?;
    Ok(Json(medicines.into_iter().map(Into::into).collect()))
}
