use super::*;
use crate::database::sqlite::Database;
use crate::database::sqlite::models::{FileFormat, NewGenome, NewSequenceRegion};
use crate::database::sqlite::queries::GenomeQueries;
use tempfile::TempDir;

async fn create_test_database() -> (Database, TempDir) {
    let temp_dir = TempDir::new().expect("can create temp dir");
    let database = Database::new(&temp_dir.path().join("test.db"))
        .await
        .expect("can create database");
    (database, temp_dir)
}

fn test_genome(sample_id: &str) -> NewGenome {
    NewGenome {
        sample_id: sample_id.to_string(),
        file_name: format!("{sample_id}.gff3"),
        file_path: format!("/data/{sample_id}.gff3"),
        file_size: 0,
        file_format: FileFormat::Gff3,
    }
}

fn region(genome_id: i64, seq_id: &str, end: i64) -> NewSequenceRegion {
    NewSequenceRegion {
        genome_id,
        seq_id: seq_id.to_string(),
        start_position: 1,
        end_position: end,
        species: None,
    }
}

#[tokio::test]
async fn empty_slice_is_a_no_op() {
    let (database, _temp_dir) = create_test_database().await;
    let mut tx = database.pool().begin().await.expect("can begin tx");

    let inserted = bulk_insert::<NewSequenceRegion>(&mut tx, &[])
        .await
        .expect("empty insert succeeds");
    assert_eq!(inserted, 0);
}

#[tokio::test]
async fn rows_are_inserted_in_one_statement() {
    let (database, _temp_dir) = create_test_database().await;
    let mut tx = database.pool().begin().await.expect("can begin tx");

    let genome_id = GenomeQueries::upsert(&mut tx, &test_genome("sample1"))
        .await
        .expect("can create genome");

    let rows = vec![
        region(genome_id, "contig_1", 1000),
        region(genome_id, "contig_2", 2000),
        region(genome_id, "contig_3", 3000),
    ];
    let inserted = bulk_insert(&mut tx, &rows).await.expect("can bulk insert");
    assert_eq!(inserted, 3);

    tx.commit().await.expect("can commit");

    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM sequence_regions WHERE genome_id = ?")
            .bind(genome_id)
            .fetch_one(database.pool())
            .await
            .expect("can count regions");
    assert_eq!(count, 3);
}

#[tokio::test]
async fn oversized_batches_are_chunked() {
    let (database, _temp_dir) = create_test_database().await;
    let mut tx = database.pool().begin().await.expect("can begin tx");

    let genome_id = GenomeQueries::upsert(&mut tx, &test_genome("sample2"))
        .await
        .expect("can create genome");

    // More rows than fit under the bind limit for a 5-column row shape.
    let rows: Vec<NewSequenceRegion> = (0..7000)
        .map(|i| region(genome_id, &format!("contig_{i}"), i + 1))
        .collect();
    let inserted = bulk_insert(&mut tx, &rows).await.expect("can bulk insert");
    assert_eq!(inserted, 7000);

    tx.commit().await.expect("can commit");

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sequence_regions")
        .fetch_one(database.pool())
        .await
        .expect("can count regions");
    assert_eq!(count, 7000);
}
