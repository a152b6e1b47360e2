//! Opaque random identifiers.
//!
//! MedTrack mints UUIDs wherever an identifier must be unguessable or must be created without
//! consulting the store: medicine entries inside patient documents, and one-time activation
//! tokens handed to newly onboarded doctors.
//!
//! Identifiers render as **32 lowercase hexadecimal characters** (no hyphens), the same value
//! as `Uuid::new_v4().simple().to_string()`.

mod service;

pub use service::UuidService;
