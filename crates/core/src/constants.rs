//! Constants used throughout the MedTrack core crate.

/// Inventory quantities strictly below this value are flagged as low stock.
pub const LOW_STOCK_THRESHOLD: u32 = 50;

/// Default medicine type when a doctor does not specify one.
pub const DEFAULT_MEDICINE_TYPE: &str = "Tablet";

/// Default instructions when a doctor does not specify any.
pub const DEFAULT_INSTRUCTIONS: &str = "As advised";

/// Status given to new deliveries, medicine entries and schedule slots.
pub const STATUS_PENDING: &str = "pending";

/// Delivery status that stamps `deliveredAt`.
pub const STATUS_DELIVERED: &str = "delivered";

/// Dose status that clears `takenAt`.
pub const STATUS_MISSED: &str = "missed";

/// Placeholder for unknown gender / blood group in new patient records.
pub const NOT_AVAILABLE: &str = "N/A";

/// Diagnosis shown on a freshly created patient record.
pub const NEW_PATIENT_DIAGNOSIS: &str = "New Patient";

/// Lifetime of an emailed doctor activation token, in hours.
pub const DEFAULT_ACTIVATION_TTL_HOURS: i64 = 24;

/// Lifetime of an emailed password reset code, in minutes.
pub const DEFAULT_RESET_CODE_TTL_MINUTES: i64 = 15;

/// Lifetime of issued bearer tokens, in minutes.
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 600;

/// Default frontend base URL used to render activation links.
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Accepted doctor rating range (inclusive).
pub const MIN_RATING: f64 = 1.0;
pub const MAX_RATING: f64 = 5.0;
