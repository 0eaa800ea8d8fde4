//! SQLite-backed runtime settings tests

use erm_common::db::init_database_pool;
use erm_common::settings::{EngineSettings, SettingsHandle, SettingsSource, SqliteSettings};
use tempfile::TempDir;

#[tokio::test]
async fn test_missing_settings_are_written_back_with_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let pool = init_database_pool(&temp_dir.path().join("erm.db")).await.unwrap();
    let source = SqliteSettings::new(pool.clone());

    let settings = source.load().await.unwrap();
    assert_eq!(settings, EngineSettings::default());

    let (stored,): (String,) =
        sqlx::query_as("SELECT value FROM settings WHERE key = 'review_threshold'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(stored, "70");
}

#[tokio::test]
async fn test_reload_picks_up_changed_rows() {
    let temp_dir = TempDir::new().unwrap();
    let pool = init_database_pool(&temp_dir.path().join("erm.db")).await.unwrap();
    let source = SqliteSettings::new(pool.clone());

    let handle = SettingsHandle::new(source.load().await.unwrap());
    assert!(handle.snapshot().await.shadow_enabled);

    sqlx::query("UPDATE settings SET value = 'false' WHERE key = 'shadow_enabled'")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("UPDATE settings SET value = '65' WHERE key = 'review_threshold'")
        .execute(&pool)
        .await
        .unwrap();

    handle.reload(&source).await.unwrap();
    let snapshot = handle.snapshot().await;
    assert!(!snapshot.shadow_enabled);
    assert_eq!(snapshot.review_threshold, 65);
}

#[tokio::test]
async fn test_invalid_value_keeps_previous_snapshot() {
    let temp_dir = TempDir::new().unwrap();
    let pool = init_database_pool(&temp_dir.path().join("erm.db")).await.unwrap();
    let source = SqliteSettings::new(pool.clone());
    let handle = SettingsHandle::new(source.load().await.unwrap());

    sqlx::query("UPDATE settings SET value = 'lots' WHERE key = 'display_floor'")
        .execute(&pool)
        .await
        .unwrap();

    assert!(handle.reload(&source).await.is_err());
    assert_eq!(handle.snapshot().await.display_floor, 40);
}

#[tokio::test]
async fn test_save_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let pool = init_database_pool(&temp_dir.path().join("erm.db")).await.unwrap();
    let source = SqliteSettings::new(pool);

    let custom = EngineSettings {
        review_threshold: 75,
        display_floor: 50,
        shadow_enabled: false,
        shadow_timeout_ms: 750,
    };
    source.save(&custom).await.unwrap();

    assert_eq!(source.load().await.unwrap(), custom);
}
