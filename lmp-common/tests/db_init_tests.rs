//! Database bootstrap

use lmp_common::db::init_database;
use tempfile::TempDir;

#[tokio::test]
async fn test_database_created_with_parent_folders() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("nested").join("lmp.db");

    let pool = init_database(&db_path).await.unwrap();
    assert!(db_path.exists());

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM settings")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_existing_database_keeps_settings() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("lmp.db");

    let pool = init_database(&db_path).await.unwrap();
    sqlx::query("INSERT INTO settings (key, value) VALUES ('loop_mode', 'all')")
        .execute(&pool)
        .await
        .unwrap();
    pool.close().await;

    let pool = init_database(&db_path).await.unwrap();
    let (value,): (String,) = sqlx::query_as("SELECT value FROM settings WHERE key = 'loop_mode'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(value, "all");
}
