//! Deterministic naming for remote deployments.

use uuid::Uuid;

/// Prefix carried by every modelmart-managed deployment name.
pub const DEPLOYMENT_NAME_PREFIX: &str = "mmart";

/// Derive the remote deployment name for an (app, user) pair.
///
/// Uses the first 8 hex characters of each id so the name is short
/// enough for the provider, stable across retries, and traceable back
/// to its owners when debugging from the provider's dashboard.
pub fn deployment_name(app_id: Uuid, user_id: Uuid) -> String {
    let app = app_id.simple().to_string();
    let user = user_id.simple().to_string();
    format!("{DEPLOYMENT_NAME_PREFIX}-{}-{}", &app[..8], &user[..8])
}
