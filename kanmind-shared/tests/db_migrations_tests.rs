/// Integration tests for database migrations
///
/// These tests require a running PostgreSQL database named by DATABASE_URL.
/// Without it every test returns early.

use kanmind_shared::db::migrations::{ensure_database_exists, get_migration_status, run_migrations};
use kanmind_shared::db::pool::{close_pool, create_pool, DatabaseConfig};
use sqlx::PgPool;
use std::env;

async fn migrated_pool() -> Option<PgPool> {
    let Ok(url) = env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping database test");
        return None;
    };

    ensure_database_exists(&url).await.expect("Failed to create database");
    let pool = create_pool(DatabaseConfig::new(url)).await.expect("Failed to create pool");
    run_migrations(&pool).await.expect("Migrations failed");

    Some(pool)
}

#[tokio::test]
async fn test_run_migrations_records_status() {
    let Some(pool) = migrated_pool().await else { return };

    let status = get_migration_status(&pool).await.expect("Failed to get migration status");
    assert!(status.applied_migrations > 0, "No migrations were applied");
    assert!(status.latest_version.is_some(), "Latest version should be set");

    close_pool(pool).await;
}

#[tokio::test]
async fn test_migrations_are_idempotent() {
    let Some(pool) = migrated_pool().await else { return };

    let before = get_migration_status(&pool).await.expect("Failed to get status");
    run_migrations(&pool).await.expect("Second migration run failed");
    let after = get_migration_status(&pool).await.expect("Failed to get status");

    assert_eq!(before.applied_migrations, after.applied_migrations);
    assert_eq!(before.latest_version, after.latest_version);

    close_pool(pool).await;
}

#[tokio::test]
async fn test_migration_creates_all_tables() {
    let Some(pool) = migrated_pool().await else { return };

    for table_name in ["users", "auth_tokens", "boards", "board_members", "tasks", "comments"] {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (
                SELECT FROM information_schema.tables
                WHERE table_schema = 'public'
                AND table_name = $1
            )",
        )
        .bind(table_name)
        .fetch_one(&pool)
        .await
        .unwrap_or_else(|e| panic!("Failed to check for table {table_name}: {e}"));

        assert!(exists, "Table '{}' should exist after migrations", table_name);
    }

    close_pool(pool).await;
}

#[tokio::test]
async fn test_migration_creates_enums() {
    let Some(pool) = migrated_pool().await else { return };

    for enum_name in ["task_status", "task_priority"] {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT FROM pg_type WHERE typname = $1)")
            .bind(enum_name)
            .fetch_one(&pool)
            .await
            .unwrap_or_else(|e| panic!("Failed to check for enum {enum_name}: {e}"));

        assert!(exists, "Enum '{}' should exist after migrations", enum_name);
    }

    close_pool(pool).await;
}
