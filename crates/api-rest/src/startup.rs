//! Application state built from the process environment.
//!
//! # Environment Variables
//! - `MEDTRACK_FRONTEND_URL`: base URL for activation links (default: `http://localhost:5173`)
//! - `MEDTRACK_TOKEN_TTL_MINUTES`: bearer token lifetime (default: 600)
//! - `MEDTRACK_TOKEN_KEY_PEM`: path to a PKCS#8 P-256 signing key; a fresh key is generated if unset
//! - `MEDTRACK_SEED_DEMO`: seed the demo hospital and pharmacy (default: on; `false`/`0`/`no`/`off` disables)

use std::path::Path;
use std::sync::Arc;

use medtrack_core::auth::{CredentialService, Sha256Credentials, SignedTokenService, TokenService};
use medtrack_core::config::{frontend_url_from_env_value, token_ttl_from_env_value};
use medtrack_core::notifier::LogNotifier;
use medtrack_core::seed::DemoSeeder;
use medtrack_core::{CoreConfig, Store};

use crate::AppState;

/// Resolve configuration, collaborators and the store, seeding demo data if enabled.
///
/// # Errors
///
/// Returns an error if a variable is malformed, the signing key cannot be read or seeding fails.
pub fn state_from_env() -> anyhow::Result<AppState> {
    let token_ttl = token_ttl_from_env_value(std::env::var("MEDTRACK_TOKEN_TTL_MINUTES").ok())?;
    let frontend_url = frontend_url_from_env_value(std::env::var("MEDTRACK_FRONTEND_URL").ok());
    let defaults = CoreConfig::default();
    let cfg = Arc::new(CoreConfig::new(
        frontend_url,
        defaults.activation_ttl(),
        defaults.reset_code_ttl(),
        token_ttl,
    )?);

    let tokens: Arc<dyn TokenService> = match std::env::var("MEDTRACK_TOKEN_KEY_PEM")
        .ok()
        .filter(|p| !p.trim().is_empty())
    {
        Some(path) => Arc::new(SignedTokenService::from_pkcs8_file(
            Path::new(path.trim()),
            token_ttl,
        )?),
        None => {
            tracing::warn!("MEDTRACK_TOKEN_KEY_PEM not set, tokens will not survive a restart");
            Arc::new(SignedTokenService::generate(token_ttl))
        }
    };

    let store = Arc::new(Store::new());
    let credentials: Arc<dyn CredentialService> = Arc::new(Sha256Credentials);

    if seed_demo_from_env_value(std::env::var("MEDTRACK_SEED_DEMO").ok()) {
        let report = DemoSeeder::new(store.clone(), credentials.clone()).run()?;
        tracing::info!(prescriptions = report.prescriptions, "demo data ready");
    }

    let notifier = Arc::new(LogNotifier::new(cfg.clone()));
    Ok(AppState::new(store, cfg, credentials, tokens, notifier))
}

/// Whether demo seeding is on. Unset or blank means on.
pub fn seed_demo_from_env_value(value: Option<String>) -> bool {
    match value.as_deref().map(str::trim) {
        None | Some("") => true,
        Some(v) => !matches!(
            v.to_ascii_lowercase().as_str(),
            "false" | "0" | "no" | "off"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_demo_from_env_value() {
        assert!(seed_demo_from_env_value(None));
        assert!(seed_demo_from_env_value(Some("  ".into())));
        assert!(seed_demo_from_env_value(Some("true".into())));
        assert!(!seed_demo_from_env_value(Some("False".into())));
        assert!(!seed_demo_from_env_value(Some(" 0 ".into())));
        assert!(!seed_demo_from_env_value(Some("off".into())));
    }
}
