use super::*;
use crate::database::sqlite::models::{FileFormat, NewGenome};
use tempfile::TempDir;

#[tokio::test]
async fn creates_database_file_and_schema() {
    let temp_dir = TempDir::new().expect("can create temp dir");
    let db_path = temp_dir.path().join("annotations.db");

    let database = Database::new(&db_path).await.expect("can create database");
    assert!(db_path.exists());

    let genomes = database.list_genomes().await.expect("can list genomes");
    assert!(genomes.is_empty());
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let temp_dir = TempDir::new().expect("can create temp dir");
    let db_path = temp_dir.path().join("annotations.db");

    let database = Database::new(&db_path).await.expect("can create database");
    database
        .run_migrations()
        .await
        .expect("re-running migrations is a no-op");

    // Reopening the same file must not attempt to recreate tables.
    drop(database);
    let reopened = Database::new(&db_path).await.expect("can reopen database");
    reopened.optimize().await.expect("can optimize");
}

#[tokio::test]
async fn foreign_keys_are_enforced() {
    let temp_dir = TempDir::new().expect("can create temp dir");
    let database = Database::new(&temp_dir.path().join("test.db"))
        .await
        .expect("can create database");

    let result = sqlx::query(
        "INSERT INTO features (genome_id, seq_id, feature_type, start_position, stop_position) \
         VALUES (9999, 'contig_1', 'cds', 1, 10)",
    )
    .execute(database.pool())
    .await;

    assert!(result.is_err(), "orphan feature rows must be rejected");
}

#[tokio::test]
async fn statistics_start_at_zero() {
    let temp_dir = TempDir::new().expect("can create temp dir");
    let database = Database::new(&temp_dir.path().join("test.db"))
        .await
        .expect("can create database");

    let mut tx = database.pool().begin().await.expect("can begin tx");
    queries::GenomeQueries::upsert(
        &mut tx,
        &NewGenome {
            sample_id: "empty".to_string(),
            file_name: "empty.tsv".to_string(),
            file_path: "/data/empty.tsv".to_string(),
            file_size: 0,
            file_format: FileFormat::Tsv,
        },
    )
    .await
    .expect("can create genome");
    tx.commit().await.expect("can commit");

    let genome = database
        .get_genome("empty")
        .await
        .expect("can fetch")
        .expect("genome exists");
    let stats = database
        .genome_statistics(genome)
        .await
        .expect("can compute statistics");

    assert_eq!(stats.feature_count, 0);
    assert_eq!(stats.annotation_count, 0);
    assert_eq!(stats.sequence_region_count, 0);
}
