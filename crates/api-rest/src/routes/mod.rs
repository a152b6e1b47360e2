//! Request handlers, grouped by the caller they serve.

pub mod auth;
pub mod doctors;
pub mod patients;
pub mod pharmacy;
pub mod public;
