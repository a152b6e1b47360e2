//! Hospital registration, account lifecycle and the caller's own account.

use axum::{extract::State, http::StatusCode, response::Json};
use medtrack_core::model::{Role, UserProfile};

use crate::caller::Caller;
use crate::dto::{
    ErrorRes, ForgotPasswordReq, HospitalRegisterReq, HospitalRes, LoginReq, LoginRes,
    RegisterReq, ResetPasswordCodeReq, TokenPasswordReq, UserMeRes, UserProfileReq,
    VerifyResetCodeReq,
};
use crate::error::ApiResult;
use crate::AppState;

#[utoipa::path(
    post,
    path = "/api/hospitals/register",
    request_body = HospitalRegisterReq,
    responses(
        (status = 201, description = "Hospital and its first admin created", body = HospitalRes),
        (status = 400, description = "Missing or malformed field", body = ErrorRes),
        (status = 409, description = "Hospital name or email already registered", body = ErrorRes)
    )
)]
/// Register a hospital tenant together with its first admin account.
#[axum::debug_handler]
pub async fn register_hospital(
    State(state): State<AppState>,
    Json(req): Json<HospitalRegisterReq>,
) -> ApiResult<(StatusCode, Json<HospitalRes>)> {
    let (hospital, _admin) = state.hospitals.register(&req.into())?;
    Ok((StatusCode::CREATED, Json(hospital.into())))
}

#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "Patient registered"),
        (status = 400, description = "Invalid registration", body = ErrorRes),
        (status = 409, description = "Email already registered", body = ErrorRes)
    )
)]
/// Patient self-registration. The patient's record is created straight away.
#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterReq>,
) -> ApiResult<StatusCode> {
    state.accounts.register_patient(&req.into())?;
    Ok(StatusCode::CREATED)
}

#[utoipa::path(
    post,
    path = "/auth/register-doctor",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "Doctor registered"),
        (status = 400, description = "Invalid registration", body = ErrorRes),
        (status = 409, description = "Email already registered", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn register_doctor(
    State(state): State<AppState>,
    Json(req): Json<RegisterReq>,
) -> ApiResult<StatusCode> {
    state.accounts.register_doctor(&req.into())?;
    Ok(StatusCode::CREATED)
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReq,
    responses(
        (status = 200, description = "Bearer token", body = LoginRes),
        (status = 401, description = "Invalid credentials", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginReq>,
) -> ApiResult<Json<LoginRes>> {
    let (token, _user) = state.accounts.login(&req.email, &req.password)?;
    Ok(Json(LoginRes { token }))
}

#[utoipa::path(
    post,
    path = "/auth/forgot-password",
    request_body = ForgotPasswordReq,
    responses(
        (status = 200, description = "Reset code sent if the account exists")
    )
)]
/// Email a six-digit reset code. Unknown emails get the same response.
#[axum::debug_handler]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordReq>,
) -> ApiResult<StatusCode> {
    state.accounts.forgot_password(&req.email)?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/auth/reset-password",
    request_body = TokenPasswordReq,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Invalid or expired token", body = ErrorRes)
    )
)]
/// Redeem a one-time token for a new password without changing the account status.
#[axum::debug_handler]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<TokenPasswordReq>,
) -> ApiResult<StatusCode> {
    state.accounts.reset_password(&req.token, &req.new_password)?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/auth/verify-reset-code",
    request_body = VerifyResetCodeReq,
    responses(
        (status = 200, description = "Code is valid"),
        (status = 400, description = "Invalid or expired code", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn verify_reset_code(
    State(state): State<AppState>,
    Json(req): Json<VerifyResetCodeReq>,
) -> ApiResult<StatusCode> {
    state.accounts.verify_reset_code(&req.email, &req.code)?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/auth/reset-password-code",
    request_body = ResetPasswordCodeReq,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Invalid or expired code", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn reset_password_with_code(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordCodeReq>,
) -> ApiResult<StatusCode> {
    state
        .accounts
        .reset_password_with_code(&req.email, &req.code, &req.new_password)?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/auth/set-password",
    request_body = TokenPasswordReq,
    responses(
        (status = 200, description = "Account activated"),
        (status = 400, description = "Invalid or expired token", body = ErrorRes)
    )
)]
/// Activate an onboarded doctor with the token from their welcome email.
#[axum::debug_handler]
pub async fn set_password(
    State(state): State<AppState>,
    Json(req): Json<TokenPasswordReq>,
) -> ApiResult<StatusCode> {
    state.accounts.activate(&req.token, &req.new_password)?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "The caller's account", body = UserMeRes),
        (status = 401, description = "Missing or invalid token", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn me(
    State(state): State<AppState>,
    Caller(user): Caller,
) -> ApiResult<Json<UserMeRes>> {
    Ok(Json(state.accounts.me(&user)?.into()))
}

#[utoipa::path(
    post,
    path = "/api/profile/patient-profile",
    request_body = UserProfileReq,
    responses(
        (status = 201, description = "Profile saved and copied into the patient record"),
        (status = 403, description = "Caller is not a patient", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn save_patient_profile(
    State(state): State<AppState>,
    caller: Caller,
    Json(req): Json<UserProfileReq>,
) -> ApiResult<StatusCode> {
    let user = caller.require(Role::Patient, "Only patients have an intake profile")?;
    state.profiles.save(user, &UserProfile::from(req))?;
    Ok(StatusCode::CREATED)
}

#[utoipa::path(
    get,
    path = "/api/profile/patient-profile",
    responses(
        (status = 200, description = "The caller's intake profile"),
        (status = 404, description = "No profile saved yet", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn get_patient_profile(
    State(state): State<AppState>,
    Caller(user): Caller,
) -> ApiResult<Json<UserProfile>> {
    Ok(Json(state.profiles.get(&user)?))
}
