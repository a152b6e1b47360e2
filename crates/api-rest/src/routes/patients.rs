//! Patient record endpoints.
//!
//! Patients act on their own record only; doctors prescribe; admins and doctors list.

use axum::{
    extract::{Path, State},
    response::Json,
};
use medtrack_core::model::Role;
use medtrack_core::{DoctorDocument, PatientDocument, TrackerError};
use serde_json::Value;

use crate::caller::Caller;
use crate::dto::{AssignMedicineReq, DoctorRatingReq, ErrorRes, MedicineStatusReq, StatusReq};
use crate::error::ApiResult;
use crate::AppState;

const PATIENTS_ONLY: &str = "Only patients can access their record";

#[utoipa::path(
    get,
    path = "/api/patients",
    responses(
        (status = 200, description = "Records visible to the caller"),
        (status = 401, description = "Missing or invalid token", body = ErrorRes)
    )
)]
/// Records visible to the caller.
///
/// Admins see their hospital, doctors see their assigned patients and patients see their own
/// record, created on first access.
#[axum::debug_handler]
pub async fn list_records(
    State(state): State<AppState>,
    Caller(user): Caller,
) -> ApiResult<Json<Vec<PatientDocument>>> {
    let records = match user.role {
        Role::Admin => state.patients.list_by_hospital(user.hospital_id)?,
        Role::Doctor => state.patients.list_by_doctor(&user)?,
        Role::Patient => vec![state.patients.get_or_create(&user)?.into_inner()],
    };
    Ok(Json(records))
}

#[utoipa::path(
    get,
    path = "/api/patients/me",
    responses(
        (status = 200, description = "The caller's record"),
        (status = 403, description = "Caller is not a patient", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn my_record(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Json<PatientDocument>> {
    let user = caller.require(Role::Patient, PATIENTS_ONLY)?;
    let record = state.patients.get_or_create(user)?;
    if record.was_created() {
        tracing::info!(patient_id = user.id, "patient record created on first access");
    }
    Ok(Json(record.into_inner()))
}

#[utoipa::path(
    put,
    path = "/api/patients/{patient_id}",
    params(
        ("patient_id" = i64, Path, description = "Account id of the patient")
    ),
    responses(
        (status = 200, description = "The stored record"),
        (status = 403, description = "Not the caller's record", body = ErrorRes),
        (status = 404, description = "No record yet", body = ErrorRes)
    )
)]
/// Replace the caller's record with an edited copy.
#[axum::debug_handler]
pub async fn replace_record(
    State(state): State<AppState>,
    caller: Caller,
    Path(patient_id): Path<i64>,
    Json(payload): Json<Value>,
) -> ApiResult<Json<PatientDocument>> {
    let user = caller.require(Role::Patient, PATIENTS_ONLY)?;
    if user.id != patient_id {
        return Err(TrackerError::forbidden("Cannot update another patient").into());
    }
    Ok(Json(state.patients.replace(user, payload)?))
}

#[utoipa::path(
    post,
    path = "/api/patients/{patient_id}/medicines",
    params(
        ("patient_id" = i64, Path, description = "Account id of the patient")
    ),
    request_body = AssignMedicineReq,
    responses(
        (status = 200, description = "The patient's record with the new medicine"),
        (status = 400, description = "No stock, mismatch or missing selection", body = ErrorRes),
        (status = 403, description = "Caller is not a doctor", body = ErrorRes),
        (status = 404, description = "Unknown patient or inventory item", body = ErrorRes)
    )
)]
/// Prescribe a medicine from a pharmacy's stock.
#[axum::debug_handler]
pub async fn assign_medicine(
    State(state): State<AppState>,
    Caller(doctor): Caller,
    Path(patient_id): Path<i64>,
    Json(req): Json<AssignMedicineReq>,
) -> ApiResult<Json<PatientDocument>> {
    let record = state
        .patients
        .assign_medicine(&doctor, patient_id, &req.into())?;
    Ok(Json(record))
}

#[utoipa::path(
    patch,
    path = "/api/patients/medicines/status",
    request_body = MedicineStatusReq,
    responses(
        (status = 200, description = "The caller's record"),
        (status = 404, description = "No record yet", body = ErrorRes)
    )
)]
/// Mark a scheduled dose. An unknown medicine or time leaves the record untouched.
#[axum::debug_handler]
pub async fn update_medicine_status(
    State(state): State<AppState>,
    caller: Caller,
    Json(req): Json<MedicineStatusReq>,
) -> ApiResult<Json<PatientDocument>> {
    let user = caller.require(Role::Patient, PATIENTS_ONLY)?;
    let update = state.patients.update_medicine_status(user, &req.into())?;
    if update.updated == 0 {
        tracing::debug!(patient_id = user.id, "no scheduled dose matched");
    }
    Ok(Json(update.document))
}

#[utoipa::path(
    patch,
    path = "/api/patients/medicines/{medicine_id}/delivery",
    params(
        ("medicine_id" = String, Path, description = "Id of the medicine entry")
    ),
    request_body = StatusReq,
    responses(
        (status = 200, description = "The caller's record"),
        (status = 404, description = "No record yet", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn update_delivery_status(
    State(state): State<AppState>,
    caller: Caller,
    Path(medicine_id): Path<String>,
    Json(req): Json<StatusReq>,
) -> ApiResult<Json<PatientDocument>> {
    let user = caller.require(Role::Patient, PATIENTS_ONLY)?;
    let update = state
        .patients
        .update_delivery_status(user, &medicine_id, &req.status)?;
    if update.updated == 0 {
        tracing::debug!(patient_id = user.id, %medicine_id, "no medicine matched");
    }
    Ok(Json(update.document))
}

#[utoipa::path(
    post,
    path = "/api/patients/doctor-rating",
    request_body = DoctorRatingReq,
    responses(
        (status = 200, description = "The rated doctor's profile"),
        (status = 400, description = "Rating out of range or no assigned doctor", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn rate_doctor(
    State(state): State<AppState>,
    caller: Caller,
    Json(req): Json<DoctorRatingReq>,
) -> ApiResult<Json<DoctorDocument>> {
    let user = caller.require(Role::Patient, PATIENTS_ONLY)?;
    Ok(Json(state.patients.rate_doctor(user, &req.into())?))
}
