use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::config::Config;
use crate::database::sqlite::Database;
use crate::import::{ImportSummary, gff, json, tsv};
use crate::llm::{self, LlmClient};

/// Import Bakta TSV annotation files from a folder.
#[inline]
pub async fn import_tsv(folder: &Path, pattern: &str, db_path: Option<&Path>) -> Result<()> {
    let config = Config::load()?;
    let database = open_database(&config, db_path).await?;

    let summary = tsv::import_folder(
        &database,
        folder,
        pattern,
        config.import.tsv_batch_size,
    )
    .await?;

    report_summary(&database, &summary, "annotations").await;
    Ok(())
}

/// Import GFF3 annotation files from a folder.
#[inline]
pub async fn import_gff(folder: &Path, pattern: &str, db_path: Option<&Path>) -> Result<()> {
    let config = Config::load()?;
    let database = open_database(&config, db_path).await?;

    let summary = gff::import_folder(
        &database,
        folder,
        pattern,
        config.import.gff_batch_size,
    )
    .await?;

    report_summary(&database, &summary, "features").await;
    Ok(())
}

/// Import annotation JSON documents from a folder with bounded concurrency.
#[inline]
pub async fn import_json(folder: &Path, pattern: &str, db_path: Option<&Path>) -> Result<()> {
    let config = Config::load()?;
    let database = open_database(&config, db_path).await?;

    let summary = json::import_folder(
        &database,
        folder,
        pattern,
        config.import.json_concurrency,
    )
    .await?;

    report_summary(&database, &summary, "features").await;
    Ok(())
}

/// Execute a SQL script file inside one transaction.
#[inline]
pub async fn run_sql(script: &Path, db_path: Option<&Path>) -> Result<()> {
    if !script.exists() {
        bail!("SQL file '{}' not found", script.display());
    }

    let sql = tokio::fs::read_to_string(script)
        .await
        .with_context(|| format!("Failed to read SQL file: {}", script.display()))?;

    let config = Config::load()?;
    let database = open_database(&config, db_path).await?;

    println!("Executing SQL from file: {}", script.display());

    let mut tx = database
        .pool()
        .begin()
        .await
        .context("Failed to begin transaction")?;
    sqlx::raw_sql(&sql)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("SQL script failed: {}", script.display()))?;
    tx.commit().await.context("Failed to commit SQL script")?;

    println!("SQL script executed successfully.");
    Ok(())
}

/// Answer a natural-language question by generating and executing SQL.
#[inline]
pub async fn ask(question: &str, db_path: Option<&Path>) -> Result<()> {
    let config = Config::load()?;
    let database = open_database(&config, db_path).await?;

    let client = LlmClient::new(&config.llm)?;
    let table_info = llm::schema_overview(database.pool()).await?;

    info!("Generating SQL for question: {}", question);
    let query = client
        .write_query(question, &table_info)
        .context("Failed to generate SQL for the question")?;
    println!("Query:\n{query}\n");

    let result = llm::execute_query(database.pool(), &query).await?;
    println!("Result:\n{result}\n");

    let answer = client
        .generate_answer(question, &query, &result)
        .context("Failed to generate an answer")?;
    println!("Answer:\n{answer}");

    Ok(())
}

/// List imported genomes with their per-table row counts.
#[inline]
pub async fn list_genomes(db_path: Option<&Path>) -> Result<()> {
    let config = Config::load()?;
    let database = open_database(&config, db_path).await?;

    let genomes = database.list_genomes().await.context("Failed to list genomes")?;

    if genomes.is_empty() {
        println!("No annotation files have been imported yet.");
        println!("Use 'bakta-db import-tsv <folder>' (or import-gff / import-json) to import a folder.");
        return Ok(());
    }

    println!("Imported genomes ({} total):", genomes.len());
    println!();

    let mut total_records: i64 = 0;
    for genome in genomes {
        println!("{} (ID: {})", genome.sample_id, genome.id);
        println!("   File: {} [{}]", genome.file_name, genome.file_format);
        if let Some(organism) = &genome.organism {
            println!("   Organism: {organism}");
        }
        if let Some(software) = &genome.software_version {
            println!("   Software: {software}");
        }
        if let Some(build) = &genome.genome_build {
            println!("   Genome build: {build}");
        }

        match database.genome_statistics(genome).await {
            Ok(stats) => {
                if stats.feature_count > 0 {
                    println!("   Features: {}", stats.feature_count);
                }
                if stats.annotation_count > 0 {
                    println!("   Annotations: {}", stats.annotation_count);
                }
                if stats.sequence_region_count > 0 {
                    println!("   Sequence regions: {}", stats.sequence_region_count);
                }
                println!(
                    "   Imported: {}",
                    stats.genome.imported_date.format("%Y-%m-%d %H:%M:%S")
                );
                total_records += stats.feature_count + stats.annotation_count;
            }
            Err(e) => println!("   Statistics: Error - {e}"),
        }

        println!();
    }

    println!("Total records: {total_records}");
    Ok(())
}

async fn open_database(config: &Config, db_path: Option<&Path>) -> Result<Database> {
    let path: PathBuf = config.database_path(db_path);
    Database::new(&path)
        .await
        .with_context(|| format!("Failed to initialize database at {}", path.display()))
}

/// Final tally, matching the wording of the importer scripts this replaces.
async fn report_summary(database: &Database, summary: &ImportSummary, noun: &str) {
    println!(
        "Import completed. Successfully processed {} files. Failed: {} files.",
        summary.succeeded, summary.failed
    );
    println!("Imported {} {noun} in total.", summary.records);

    if summary.succeeded > 0 {
        if let Err(e) = database.optimize().await {
            warn!("Failed to optimize database after import: {:#}", e);
        }
    }
}
