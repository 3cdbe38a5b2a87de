//! Read-only lookups against the `app_versions` catalog table.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::app::AppVersion;

const COLUMNS: &str = "id, app_id, replicate_model, version_id, default_hardware, created_at";

pub struct AppVersionRepo;

impl AppVersionRepo {
    /// The app's current published version: most recent by creation
    /// time. `None` when the app has never been published.
    pub async fn latest_for_app(
        pool: &PgPool,
        app_id: Uuid,
    ) -> Result<Option<AppVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM app_versions \
             WHERE app_id = $1 \
             ORDER BY created_at DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, AppVersion>(&query)
            .bind(app_id)
            .fetch_optional(pool)
            .await
    }
}
