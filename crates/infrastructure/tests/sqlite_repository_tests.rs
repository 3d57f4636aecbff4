//! SQLite 仓储集成测试
//!
//! 使用临时文件数据库，覆盖 §4.3 存储契约：id 分配、排序、
//! 条件进度更新与终态写入的先后关系、孤儿清理。

use profiler_config::StorageConfig;
use profiler_domain::entities::{
    Bundle, ComponentDescriptor, ComponentKind, Profile, ProfileKind, ProfileState,
};
use profiler_domain::repositories::{BundleRepository, ProfileRepository};
use profiler_infrastructure::{DatabaseManager, SqliteBundleRepository, SqliteProfileRepository};

async fn setup() -> (
    tempfile::TempDir,
    SqliteBundleRepository,
    SqliteProfileRepository,
) {
    let dir = tempfile::tempdir().unwrap();
    let config = StorageConfig {
        db_path: dir
            .path()
            .join("profiler.sqlite")
            .to_str()
            .unwrap()
            .to_string(),
        max_connections: 2,
        connection_timeout_seconds: 5,
    };
    let manager = DatabaseManager::new(&config).await.unwrap();
    manager.health_check().await.unwrap();
    let pool = manager.pool();
    (
        dir,
        SqliteBundleRepository::new(pool.clone()),
        SqliteProfileRepository::new(pool),
    )
}

fn tidb_desc(ip: &str) -> ComponentDescriptor {
    ComponentDescriptor {
        ip: ip.to_string(),
        port: 4000,
        status_port: 10080,
        kind: ComponentKind::Tidb,
    }
}

#[tokio::test]
async fn test_bundle_create_assigns_monotonic_ids() {
    let (_dir, bundles, _profiles) = setup().await;

    let targets = vec![tidb_desc("tidb-1.internal")];
    let first = bundles
        .create(&Bundle::new(10, vec![ProfileKind::Cpu], &targets))
        .await
        .unwrap();
    let second = bundles
        .create(&Bundle::new(20, vec![ProfileKind::Heap], &targets))
        .await
        .unwrap();

    assert!(first.id > 0);
    assert!(second.id > first.id);

    let loaded = bundles.get_by_id(first.id).await.unwrap().unwrap();
    assert_eq!(loaded.duration_secs, 10);
    assert_eq!(loaded.profile_kinds, vec![ProfileKind::Cpu]);
    assert_eq!(loaded.targets_count.get(&ComponentKind::Tidb), Some(&1));

    assert!(bundles.get_by_id(9999).await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_bundles_newest_first() {
    let (_dir, bundles, _profiles) = setup().await;
    let targets = vec![tidb_desc("tidb-1.internal")];

    let first = bundles
        .create(&Bundle::new(10, vec![ProfileKind::Cpu], &targets))
        .await
        .unwrap();
    let second = bundles
        .create(&Bundle::new(10, vec![ProfileKind::Cpu], &targets))
        .await
        .unwrap();

    let listed = bundles.list_newest_first().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, second.id);
    assert_eq!(listed[1].id, first.id);
}

#[tokio::test]
async fn test_profile_batch_create_preserves_order() {
    let (_dir, bundles, profiles) = setup().await;

    let targets = vec![tidb_desc("tidb-1.internal"), tidb_desc("tidb-2.internal")];
    let bundle = bundles
        .create(&Bundle::new(
            10,
            vec![ProfileKind::Cpu, ProfileKind::Mutex],
            &targets,
        ))
        .await
        .unwrap();

    // target 优先、kind 次之的确定性顺序
    let mut rows = Vec::new();
    for target in &targets {
        for kind in &bundle.profile_kinds {
            rows.push(Profile::new(bundle.id, target.clone(), *kind));
        }
    }
    let created = profiles.create_batch(&rows).await.unwrap();
    assert_eq!(created.len(), 4);
    assert!(created.windows(2).all(|w| w[0].id < w[1].id));

    let loaded = profiles.get_by_bundle(bundle.id).await.unwrap();
    assert_eq!(loaded.len(), 4);
    assert_eq!(loaded[0].target.ip, "tidb-1.internal");
    assert_eq!(loaded[0].kind, ProfileKind::Cpu);
    assert_eq!(loaded[1].kind, ProfileKind::Mutex);
    assert_eq!(loaded[2].target.ip, "tidb-2.internal");
    assert!(loaded.iter().all(|p| p.state == ProfileState::Running));
}

#[tokio::test]
async fn test_progress_update_is_conditional_on_running() {
    let (_dir, bundles, profiles) = setup().await;

    let targets = vec![tidb_desc("tidb-1.internal")];
    let bundle = bundles
        .create(&Bundle::new(10, vec![ProfileKind::Cpu], &targets))
        .await
        .unwrap();
    let created = profiles
        .create_batch(&[Profile::new(bundle.id, targets[0].clone(), ProfileKind::Cpu)])
        .await
        .unwrap();
    let id = created[0].id;

    profiles.update_progress(id, 0.4).await.unwrap();
    let row = profiles.get_by_id(id).await.unwrap().unwrap();
    assert_eq!(row.state, ProfileState::Running);
    assert!((row.progress - 0.4).abs() < f64::EPSILON);
    assert!(row.finished_at.is_none());

    profiles
        .finish(id, ProfileState::Succeeded, None, Some(b"foobar".to_vec()))
        .await
        .unwrap();

    // 终态写入之后进度心跳不再生效
    profiles.update_progress(id, 0.5).await.unwrap();
    let row = profiles.get_by_id(id).await.unwrap().unwrap();
    assert_eq!(row.state, ProfileState::Succeeded);
    assert_eq!(row.progress, 1.0);
    assert_eq!(row.data.as_deref(), Some(b"foobar".as_ref()));
    assert!(row.finished_at.is_some());
}

#[tokio::test]
async fn test_finish_unknown_profile_is_not_found() {
    let (_dir, _bundles, profiles) = setup().await;
    let err = profiles
        .finish(42, ProfileState::Error, Some("boom".to_string()), None)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_fail_all_running_marks_orphans() {
    let (_dir, bundles, profiles) = setup().await;

    let targets = vec![tidb_desc("tidb-1.internal"), tidb_desc("tidb-2.internal")];
    let bundle = bundles
        .create(&Bundle::new(10, vec![ProfileKind::Cpu], &targets))
        .await
        .unwrap();
    let created = profiles
        .create_batch(&[
            Profile::new(bundle.id, targets[0].clone(), ProfileKind::Cpu),
            Profile::new(bundle.id, targets[1].clone(), ProfileKind::Cpu),
        ])
        .await
        .unwrap();

    // 一行已到终态，不应被孤儿清理覆盖
    profiles
        .finish(created[0].id, ProfileState::Succeeded, None, Some(b"x".to_vec()))
        .await
        .unwrap();

    let affected = profiles.fail_all_running("profiling is interrupted").await.unwrap();
    assert_eq!(affected, 1);

    let rows = profiles.get_by_bundle(bundle.id).await.unwrap();
    assert_eq!(rows[0].state, ProfileState::Succeeded);
    assert_eq!(rows[1].state, ProfileState::Error);
    assert_eq!(rows[1].error.as_deref(), Some("profiling is interrupted"));
    assert_eq!(rows[1].progress, 1.0);
}
