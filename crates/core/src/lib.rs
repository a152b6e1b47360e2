//! # MedTrack Core
//!
//! Core business logic for the MedTrack multi-tenant medication tracker.
//!
//! This crate contains the data model and every workflow:
//! - Patient records and doctor profiles stored as JSON documents
//! - Pharmacy inventory and the delivery ledger
//! - Hospital registration, user accounts and one-time activation/reset secrets
//! - Demo data seeding
//!
//! **No API concerns**: HTTP routing, request extraction and status codes belong in `api-rest`.
//! Configuration is resolved by the binaries and passed in as a [`CoreConfig`].

pub mod auth;
pub mod config;
pub mod constants;
pub mod document;
pub mod error;
pub mod model;
pub mod notifier;
pub mod records;
pub mod seed;
pub mod services;
pub mod store;

pub use config::CoreConfig;
pub use error::{ErrorKind, TrackerError, TrackerResult};
pub use records::{DoctorDocument, PatientDocument};
pub use services::{DocumentUpdate, Materialised};
pub use store::Store;
