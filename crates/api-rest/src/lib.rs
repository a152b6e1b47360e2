//! # API REST
//!
//! REST API implementation for MedTrack.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - Bearer-token authentication of hospital users and pharmacies
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, status codes, CORS)
//!
//! All business rules live in `medtrack-core`; handlers only extract, delegate and map.

#![warn(rust_2018_idioms)]

pub mod dto;
pub mod startup;

mod caller;
mod error;
mod routes;

use std::sync::Arc;

use axum::{
    routing::{get, patch, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use medtrack_core::auth::{CredentialService, TokenService};
use medtrack_core::notifier::Notifier;
use medtrack_core::services::accounts::AccountService;
use medtrack_core::services::catalogue::MedicineCatalogue;
use medtrack_core::services::directory::HospitalService;
use medtrack_core::services::doctor_profile::DoctorProfileService;
use medtrack_core::services::patient_record::PatientRecordService;
use medtrack_core::services::pharmacy::PharmacyService;
use medtrack_core::services::user_profile::UserProfileService;
use medtrack_core::{CoreConfig, Store};

pub use error::{ApiError, ApiResult};

/// Application state for the REST API server.
///
/// Every service shares one [`Store`]; cloning the state clones handles only.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<CoreConfig>,
    pub tokens: Arc<dyn TokenService>,
    pub accounts: Arc<AccountService>,
    pub hospitals: Arc<HospitalService>,
    pub patients: Arc<PatientRecordService>,
    pub doctors: Arc<DoctorProfileService>,
    pub pharmacies: Arc<PharmacyService>,
    pub profiles: Arc<UserProfileService>,
    pub catalogue: Arc<MedicineCatalogue>,
}

impl AppState {
    pub fn new(
        store: Arc<Store>,
        cfg: Arc<CoreConfig>,
        credentials: Arc<dyn CredentialService>,
        tokens: Arc<dyn TokenService>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            accounts: Arc::new(AccountService::new(
                store.clone(),
                credentials.clone(),
                tokens.clone(),
                notifier.clone(),
                cfg.clone(),
            )),
            hospitals: Arc::new(HospitalService::new(store.clone(), credentials.clone())),
            patients: Arc::new(PatientRecordService::new(store.clone())),
            doctors: Arc::new(DoctorProfileService::new(
                store.clone(),
                credentials.clone(),
                notifier,
                cfg.clone(),
            )),
            pharmacies: Arc::new(PharmacyService::new(
                store.clone(),
                credentials,
                tokens.clone(),
            )),
            profiles: Arc::new(UserProfileService::new(store.clone())),
            catalogue: Arc::new(MedicineCatalogue::new(store)),
            tokens,
            cfg,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::public::health,
        routes::public::list_hospitals,
        routes::public::list_doctors,
        routes::public::list_medicines,
        routes::auth::register_hospital,
        routes::auth::register,
        routes::auth::register_doctor,
        routes::auth::login,
        routes::auth::forgot_password,
        routes::auth::reset_password,
        routes::auth::verify_reset_code,
        routes::auth::reset_password_with_code,
        routes::auth::set_password,
        routes::auth::me,
        routes::auth::save_patient_profile,
        routes::auth::get_patient_profile,
        routes::patients::list_records,
        routes::patients::my_record,
        routes::patients::replace_record,
        routes::patients::assign_medicine,
        routes::patients::update_medicine_status,
        routes::patients::update_delivery_status,
        routes::patients::rate_doctor,
        routes::doctors::admin_register,
        routes::doctors::admin_list,
        routes::doctors::template,
        routes::doctors::admin_create,
        routes::doctors::admin_update,
        routes::doctors::my_profile,
        routes::doctors::update_my_profile,
        routes::doctors::availability,
        routes::pharmacy::register,
        routes::pharmacy::login,
        routes::pharmacy::profile,
        routes::pharmacy::update_profile,
        routes::pharmacy::list_inventory,
        routes::pharmacy::create_item,
        routes::pharmacy::update_item,
        routes::pharmacy::delete_item,
        routes::pharmacy::list_deliveries,
        routes::pharmacy::create_delivery,
        routes::pharmacy::update_delivery,
    ),
    components(schemas(
        dto::HealthRes,
        dto::ErrorRes,
        dto::HospitalRegisterReq,
        dto::HospitalRes,
        dto::HospitalSummaryRes,
        dto::RegisterReq,
        dto::LoginReq,
        dto::LoginRes,
        dto::ForgotPasswordReq,
        dto::TokenPasswordReq,
        dto::VerifyResetCodeReq,
        dto::ResetPasswordCodeReq,
        dto::UserMeRes,
        dto::UserProfileReq,
        dto::AssignMedicineReq,
        dto::MedicineStatusReq,
        dto::StatusReq,
        dto::DoctorRatingReq,
        dto::DoctorRegisterReq,
        dto::DoctorRes,
        dto::MedicineRes,
        dto::AvailabilityRes,
        dto::PharmacyRegisterReq,
        dto::PharmacyProfileUpdateReq,
        dto::PharmacyProfileRes,
        dto::PharmacyAuthRes,
        dto::InventoryItemReq,
        dto::InventoryItemRes,
        dto::DeliveryReq,
        dto::DeliveryRes,
    ))
)]
struct ApiDoc;

/// Build the full application router with Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    use routes::{auth, doctors, patients, pharmacy, public};

    Router::new()
        .route("/health", get(public::health))
        .route("/public/hospitals", get(public::list_hospitals))
        .route("/public/doctors", get(public::list_doctors))
        .route("/public/medicines", get(public::list_medicines))
        .route("/api/hospitals/register", post(auth::register_hospital))
        .route("/auth/register", post(auth::register))
        .route("/auth/register-doctor", post(auth::register_doctor))
        .route("/auth/login", post(auth::login))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/auth/reset-password", post(auth::reset_password))
        .route("/auth/verify-reset-code", post(auth::verify_reset_code))
        .route("/auth/reset-password-code", post(auth::reset_password_with_code))
        .route("/auth/set-password", post(auth::set_password))
        .route("/api/users/me", get(auth::me))
        .route(
            "/api/profile/patient-profile",
            post(auth::save_patient_profile).get(auth::get_patient_profile),
        )
        .route("/api/patients", get(patients::list_records))
        .route("/api/patients/me", get(patients::my_record))
        .route("/api/patients/:patient_id", put(patients::replace_record))
        .route(
            "/api/patients/:patient_id/medicines",
            post(patients::assign_medicine),
        )
        .route(
            "/api/patients/medicines/status",
            patch(patients::update_medicine_status),
        )
        .route(
            "/api/patients/medicines/:medicine_id/delivery",
            patch(patients::update_delivery_status),
        )
        .route("/api/patients/doctor-rating", post(patients::rate_doctor))
        .route(
            "/api/admin/doctors",
            post(doctors::admin_register).get(doctors::admin_list),
        )
        .route("/api/admin/doctors/template", get(doctors::template))
        .route("/api/admin/doctors/profile", post(doctors::admin_create))
        .route("/api/admin/doctors/:doctor_id", put(doctors::admin_update))
        .route(
            "/api/doctor/profile",
            get(doctors::my_profile).put(doctors::update_my_profile),
        )
        .route(
            "/api/doctor/pharmacies/availability",
            get(doctors::availability),
        )
        .route("/auth/pharmacy/register", post(pharmacy::register))
        .route("/auth/pharmacy/login", post(pharmacy::login))
        .route(
            "/api/pharmacy/profile",
            get(pharmacy::profile).put(pharmacy::update_profile),
        )
        .route(
            "/api/pharmacy/inventory",
            get(pharmacy::list_inventory).post(pharmacy::create_item),
        )
        .route(
            "/api/pharmacy/inventory/:id",
            put(pharmacy::update_item).delete(pharmacy::delete_item),
        )
        .route(
            "/api/pharmacy/deliveries",
            get(pharmacy::list_deliveries).post(pharmacy::create_delivery),
        )
        .route("/api/pharmacy/deliveries/:id", patch(pharmacy::update_delivery))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use medtrack_core::auth::{Sha256Credentials, SignedTokenService};
    use medtrack_core::notifier::OutboxNotifier;
    use medtrack_core::seed::{DemoSeeder, DEMO_PASSWORD, DEMO_PHARMACY_EMAIL};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        store: Arc<Store>,
        outbox: Arc<OutboxNotifier>,
    }

    impl TestApp {
        fn new() -> Self {
            let store = Arc::new(Store::new());
            let cfg = Arc::new(CoreConfig::default());
            let outbox = Arc::new(OutboxNotifier::new(cfg.clone()));
            let tokens = Arc::new(SignedTokenService::generate(cfg.token_ttl()));
            let state = AppState::new(
                store.clone(),
                cfg,
                Arc::new(Sha256Credentials),
                tokens,
                outbox.clone(),
            );
            Self {
                router: router(state),
                store,
                outbox,
            }
        }

        fn seeded() -> Self {
            let app = Self::new();
            DemoSeeder::new(app.store.clone(), Arc::new(Sha256Credentials))
                .run()
                .unwrap();
            app
        }

        async fn send(
            &self,
            method: Method,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut request = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
            }
            let body = match body {
                Some(json) => {
                    request = request.header(header::CONTENT_TYPE, "application/json");
                    Body::from(json.to_string())
                }
                None => Body::empty(),
            };

            let response = self
                .router
                .clone()
                .oneshot(request.body(body).unwrap())
                .await
                .unwrap();
            let status = response.status();
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, value)
        }

        async fn login(&self, email: &str, password: &str) -> String {
            let (status, body) = self
                .send(
                    Method::POST,
                    "/auth/login",
                    None,
                    Some(json!({ "email": email, "password": password })),
                )
                .await;
            assert_eq!(status, StatusCode::OK, "login failed for {email}: {body}");
            body["token"].as_str().unwrap().to_string()
        }

        fn user_id(&self, email: &str) -> i64 {
            self.store
                .read(|t| t.user_by_email(email).map(|u| u.id))
                .unwrap()
                .unwrap()
        }
    }

    #[tokio::test]
    async fn test_health() {
        let app = TestApp::new();
        let (status, body) = app.send(Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], json!(true));
    }

    #[tokio::test]
    async fn test_hospital_registration_and_me() {
        let app = TestApp::new();
        let registration = json!({
            "hospitalName": "City Hospital",
            "adminName": "Alex Admin",
            "email": "Admin@City.org",
            "password": "Pass@1234"
        });

        let (status, body) = app
            .send(
                Method::POST,
                "/api/hospitals/register",
                None,
                Some(registration.clone()),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["name"], json!("City Hospital"));
        assert_eq!(body["active"], json!(true));

        let (status, body) = app
            .send(
                Method::POST,
                "/api/hospitals/register",
                None,
                Some(registration),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().is_some());

        let token = app.login("admin@city.org", "Pass@1234").await;
        let (status, me) = app
            .send(Method::GET, "/api/users/me", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["role"], json!("ADMIN"));
        assert_eq!(me["email"], json!("admin@city.org"));
        assert_eq!(me["hospitalName"], json!("City Hospital"));

        let (_, hospitals) = app.send(Method::GET, "/public/hospitals", None, None).await;
        assert_eq!(hospitals.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_or_bad_token_is_unauthorised() {
        let app = TestApp::new();
        let (status, _) = app.send(Method::GET, "/api/users/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = app
            .send(Method::GET, "/api/users/me", Some("not.a-token"), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].is_string());

        let (status, _) = app
            .send(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({ "email": "nobody@example.org", "password": "whatever1" })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_doctor_prescribes_from_pharmacy_stock() {
        let app = TestApp::seeded();
        let doctor = app.login("demo.doctor1@ompt.test", DEMO_PASSWORD).await;

        let (status, found) = app
            .send(
                Method::GET,
                "/api/doctor/pharmacies/availability?medicineName=metformin",
                Some(&doctor),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let found = found.as_array().unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["quantity"], json!(178));
        let item_id = found[0]["inventoryItemId"].as_i64().unwrap();

        let patient_id = app.user_id("demo.patient1@ompt.test");
        let (status, record) = app
            .send(
                Method::POST,
                &format!("/api/patients/{patient_id}/medicines"),
                Some(&doctor),
                Some(json!({
                    "name": "Metformin",
                    "inventoryItemId": item_id,
                    "scheduleTimes": ["08:00", "20:00"]
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{record}");
        let medicines = record["medicines"].as_array().unwrap();
        assert_eq!(medicines.len(), 3);
        assert_eq!(medicines[2]["deliveryStatus"], json!("pending"));
        assert_eq!(medicines[2]["schedule"].as_array().unwrap().len(), 2);

        let pharmacy = app
            .send(
                Method::POST,
                "/auth/pharmacy/login",
                None,
                Some(json!({ "email": DEMO_PHARMACY_EMAIL, "password": DEMO_PASSWORD })),
            )
            .await
            .1["token"]
            .as_str()
            .unwrap()
            .to_string();
        let (status, inventory) = app
            .send(Method::GET, "/api/pharmacy/inventory", Some(&pharmacy), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        let metformin = inventory
            .as_array()
            .unwrap()
            .iter()
            .find(|i| i["id"].as_i64() == Some(item_id))
            .unwrap();
        assert_eq!(metformin["quantity"], json!(177));

        let (_, deliveries) = app
            .send(Method::GET, "/api/pharmacy/deliveries", Some(&pharmacy), None)
            .await;
        assert_eq!(deliveries.as_array().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn test_patient_only_touches_own_record() {
        let app = TestApp::seeded();
        let patient = app.login("demo.patient1@ompt.test", DEMO_PASSWORD).await;

        let (status, record) = app
            .send(Method::GET, "/api/patients/me", Some(&patient), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(record["name"], json!("Ananya Rao"));

        let other = app.user_id("demo.patient2@ompt.test");
        let (status, body) = app
            .send(
                Method::PUT,
                &format!("/api/patients/{other}"),
                Some(&patient),
                Some(record.clone()),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], json!("Cannot update another patient"));

        let doctor = app.login("demo.doctor1@ompt.test", DEMO_PASSWORD).await;
        let (status, _) = app
            .send(Method::GET, "/api/patients/me", Some(&doctor), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, listed) = app
            .send(Method::GET, "/api/patients", Some(&doctor), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_pharmacy_and_hospital_tokens_do_not_mix() {
        let app = TestApp::seeded();
        let patient = app.login("demo.patient1@ompt.test", DEMO_PASSWORD).await;
        let (status, _) = app
            .send(Method::GET, "/api/pharmacy/inventory", Some(&patient), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (_, auth) = app
            .send(
                Method::POST,
                "/auth/pharmacy/login",
                None,
                Some(json!({ "email": DEMO_PHARMACY_EMAIL, "password": DEMO_PASSWORD })),
            )
            .await;
        assert_eq!(auth["pharmacy"]["email"], json!(DEMO_PHARMACY_EMAIL));
        let pharmacy = auth["token"].as_str().unwrap();
        let (status, _) = app
            .send(Method::GET, "/api/users/me", Some(pharmacy), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_admin_onboards_doctor_who_then_activates() {
        let app = TestApp::seeded();
        let admin = app.login("demo.admin@ompt.test", DEMO_PASSWORD).await;

        let (status, created) = app
            .send(
                Method::POST,
                "/api/admin/doctors",
                Some(&admin),
                Some(json!({ "name": "Dr. New", "email": "new.doctor@ompt.test" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{created}");
        assert_eq!(created["active"], json!(false));
        assert_eq!(created["hospitalName"], json!("OMPT Demo Hospital"));

        let (status, _) = app
            .send(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({ "email": "new.doctor@ompt.test", "password": "Secret@123" })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let token = app
            .outbox
            .activation_token_for("new.doctor@ompt.test")
            .unwrap();
        let (status, _) = app
            .send(
                Method::POST,
                "/auth/set-password",
                None,
                Some(json!({ "token": token, "newPassword": "Secret@123" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let doctor = app.login("new.doctor@ompt.test", "Secret@123").await;
        let (status, profile) = app
            .send(Method::GET, "/api/doctor/profile", Some(&doctor), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(profile["personal"]["email"], json!("new.doctor@ompt.test"));

        let (_, listed) = app
            .send(Method::GET, "/api/admin/doctors", Some(&admin), None)
            .await;
        assert_eq!(listed.as_array().unwrap().len(), 3);

        let (status, _) = app
            .send(Method::GET, "/api/admin/doctors", Some(&doctor), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
