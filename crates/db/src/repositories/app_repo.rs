//! Read-only lookups against the `apps` catalog table.

use sqlx::PgPool;
use uuid::Uuid;

pub struct AppRepo;

impl AppRepo {
    /// Resolve an app id from its public slug.
    pub async fn find_id_by_slug(
        pool: &PgPool,
        slug: &str,
    ) -> Result<Option<Uuid>, sqlx::Error> {
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM apps WHERE slug = $1")
            .bind(slug)
            .fetch_optional(pool)
            .await
    }
}
