use async_trait::async_trait;
use profiler_domain::entities::{Bundle, ProfileKind, TargetsCount};
use profiler_domain::repositories::BundleRepository;
use profiler_errors::{ProfilerError, ProfilerResult};
use sqlx::{Row, SqlitePool};
use tracing::debug;

pub struct SqliteBundleRepository {
    pool: SqlitePool,
}

impl SqliteBundleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_bundle(row: &sqlx::sqlite::SqliteRow) -> ProfilerResult<Bundle> {
        let profile_kinds: Vec<ProfileKind> =
            serde_json::from_str(row.try_get::<&str, _>("profile_kinds")?)?;
        let requested_kinds: Vec<ProfileKind> =
            serde_json::from_str(row.try_get::<&str, _>("requested_kinds")?)?;
        let targets_count: TargetsCount =
            serde_json::from_str(row.try_get::<&str, _>("targets_count")?)?;

        Ok(Bundle {
            id: row.try_get("id")?,
            duration_secs: row.try_get::<i64, _>("duration_secs")? as u32,
            profile_kinds,
            requested_kinds,
            targets_count,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl BundleRepository for SqliteBundleRepository {
    async fn create(&self, bundle: &Bundle) -> ProfilerResult<Bundle> {
        let row = sqlx::query(
            r#"
            INSERT INTO bundles (duration_secs, profile_kinds, requested_kinds, targets_count, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, duration_secs, profile_kinds, requested_kinds, targets_count, created_at
            "#,
        )
        .bind(bundle.duration_secs as i64)
        .bind(serde_json::to_string(&bundle.profile_kinds)?)
        .bind(serde_json::to_string(&bundle.requested_kinds)?)
        .bind(serde_json::to_string(&bundle.targets_count)?)
        .bind(bundle.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(ProfilerError::Database)?;

        let created = Self::row_to_bundle(&row)?;
        debug!("创建 bundle 成功: ID {}", created.id);
        Ok(created)
    }

    async fn get_by_id(&self, id: i64) -> ProfilerResult<Option<Bundle>> {
        let row = sqlx::query(
            "SELECT id, duration_secs, profile_kinds, requested_kinds, targets_count, created_at
             FROM bundles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(ProfilerError::Database)?;

        match row {
            Some(row) => Ok(Some(Self::row_to_bundle(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_newest_first(&self) -> ProfilerResult<Vec<Bundle>> {
        let rows = sqlx::query(
            "SELECT id, duration_secs, profile_kinds, requested_kinds, targets_count, created_at
             FROM bundles ORDER BY id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(ProfilerError::Database)?;

        rows.iter().map(Self::row_to_bundle).collect()
    }
}
