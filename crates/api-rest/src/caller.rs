//! Bearer-token extractors.
//!
//! Every protected handler names the kind of principal it serves: [`Caller`] for hospital users
//! and [`PharmacyCaller`] for pharmacies. Both read `Authorization: Bearer <token>` and validate
//! it with the state's token service.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use medtrack_core::auth::Claims;
use medtrack_core::model::{Role, User};
use medtrack_core::services::pharmacy::PHARMACY_ROLE;
use medtrack_core::TrackerError;

use crate::error::ApiError;
use crate::AppState;

/// An authenticated hospital user (admin, doctor or patient), loaded fresh from the store.
pub struct Caller(pub User);

/// An authenticated pharmacy, identified by its login email.
pub struct PharmacyCaller(pub String);

impl Caller {
    /// The caller, if they hold `role`.
    pub fn require(&self, role: Role, message: &'static str) -> Result<&User, ApiError> {
        if self.0.is(role) {
            Ok(&self.0)
        } else {
            Err(TrackerError::forbidden(message).into())
        }
    }
}

fn bearer_claims(parts: &Parts, state: &AppState) -> Result<Claims, ApiError> {
    let token = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| TrackerError::unauthorised("Missing bearer token"))?;

    Ok(state.tokens.validate(token)?)
}

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = bearer_claims(parts, state)?;
        if claims.role == PHARMACY_ROLE {
            return Err(
                TrackerError::forbidden("Pharmacy tokens cannot access hospital endpoints").into(),
            );
        }

        // A valid token whose account has since gone away.
        let user = state.accounts.resolve(&claims.sub).map_err(|err| match err {
            TrackerError::NotFound(_) => TrackerError::unauthorised("Unknown user"),
            other => other,
        })?;
        Ok(Self(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for PharmacyCaller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = bearer_claims(parts, state)?;
        if claims.role != PHARMACY_ROLE {
            return Err(TrackerError::forbidden("Pharmacy access only").into());
        }
        Ok(Self(claims.sub))
    }
}
