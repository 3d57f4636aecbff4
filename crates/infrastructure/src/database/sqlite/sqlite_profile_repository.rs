use async_trait::async_trait;
use chrono::Utc;
use profiler_domain::entities::{ComponentDescriptor, Profile, ProfileState};
use profiler_domain::repositories::ProfileRepository;
use profiler_errors::{ProfilerError, ProfilerResult};
use sqlx::{Row, SqlitePool};
use tracing::debug;

pub struct SqliteProfileRepository {
    pool: SqlitePool,
}

impl SqliteProfileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_profile(row: &sqlx::sqlite::SqliteRow) -> ProfilerResult<Profile> {
        Ok(Profile {
            id: row.try_get("id")?,
            bundle_id: row.try_get("bundle_id")?,
            target: ComponentDescriptor {
                ip: row.try_get("target_ip")?,
                port: row.try_get::<i64, _>("target_port")? as u16,
                status_port: row.try_get::<i64, _>("target_status_port")? as u16,
                kind: row.try_get("component_kind")?,
            },
            kind: row.try_get("kind")?,
            state: row.try_get("state")?,
            progress: row.try_get("progress")?,
            error: row.try_get("error")?,
            data: row.try_get("data")?,
            started_at: row.try_get("started_at")?,
            finished_at: row.try_get("finished_at")?,
        })
    }
}

const PROFILE_COLUMNS: &str = "id, bundle_id, target_ip, target_port, target_status_port, \
     component_kind, kind, state, progress, error, data, started_at, finished_at";

#[async_trait]
impl ProfileRepository for SqliteProfileRepository {
    async fn create_batch(&self, profiles: &[Profile]) -> ProfilerResult<Vec<Profile>> {
        // 同一事务内逐行插入，保证任务启动前所有行可见
        let mut tx = self.pool.begin().await.map_err(ProfilerError::Database)?;
        let mut created = Vec::with_capacity(profiles.len());

        for profile in profiles {
            let row = sqlx::query(&format!(
                r#"
                INSERT INTO profiles (bundle_id, target_ip, target_port, target_status_port,
                                      component_kind, kind, state, progress, error, data,
                                      started_at, finished_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                RETURNING {PROFILE_COLUMNS}
                "#
            ))
            .bind(profile.bundle_id)
            .bind(&profile.target.ip)
            .bind(profile.target.port as i64)
            .bind(profile.target.status_port as i64)
            .bind(profile.target.kind)
            .bind(profile.kind)
            .bind(profile.state)
            .bind(profile.progress)
            .bind(&profile.error)
            .bind(&profile.data)
            .bind(profile.started_at)
            .bind(profile.finished_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(ProfilerError::Database)?;

            created.push(Self::row_to_profile(&row)?);
        }

        tx.commit().await.map_err(ProfilerError::Database)?;
        debug!("批量创建 profile 成功: {} 行", created.len());
        Ok(created)
    }

    async fn get_by_id(&self, id: i64) -> ProfilerResult<Option<Profile>> {
        let row = sqlx::query(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(ProfilerError::Database)?;

        match row {
            Some(row) => Ok(Some(Self::row_to_profile(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_by_bundle(&self, bundle_id: i64) -> ProfilerResult<Vec<Profile>> {
        let rows = sqlx::query(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE bundle_id = $1 ORDER BY id ASC"
        ))
        .bind(bundle_id)
        .fetch_all(&self.pool)
        .await
        .map_err(ProfilerError::Database)?;

        rows.iter().map(Self::row_to_profile).collect()
    }

    async fn update_progress(&self, id: i64, progress: f64) -> ProfilerResult<()> {
        // 条件更新：行已进入终态时进度心跳直接落空
        sqlx::query("UPDATE profiles SET progress = $2 WHERE id = $1 AND state = 'running'")
            .bind(id)
            .bind(progress)
            .execute(&self.pool)
            .await
            .map_err(ProfilerError::Database)?;
        Ok(())
    }

    async fn finish(
        &self,
        id: i64,
        state: ProfileState,
        error: Option<String>,
        data: Option<Vec<u8>>,
    ) -> ProfilerResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE profiles
            SET state = $2, error = $3, data = $4, progress = 1.0, finished_at = $5
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(state)
        .bind(&error)
        .bind(&data)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(ProfilerError::Database)?;

        if result.rows_affected() == 0 {
            return Err(ProfilerError::ProfileNotFound { id });
        }

        debug!("profile {} 进入终态: {}", id, state);
        Ok(())
    }

    async fn fail_all_running(&self, error: &str) -> ProfilerResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE profiles
            SET state = 'error', error = $1, progress = 1.0, finished_at = $2
            WHERE state = 'running'
            "#,
        )
        .bind(error)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(ProfilerError::Database)?;

        Ok(result.rows_affected())
    }
}
