use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::database::sqlite::models::{Genome, GenomeStatistics};
use crate::database::sqlite::queries::{
    AnnotationQueries, FeatureQueries, GenomeQueries, SequenceRegionQueries,
};

#[cfg(test)]
mod tests;

pub mod bulk;
pub mod models;
pub mod queries;

pub type DbPool = Pool<Sqlite>;

#[derive(Debug, Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Open (creating if missing) the database at `path` and bring the
    /// schema up to date. WAL plus a generous busy timeout lets the JSON
    /// importer's concurrent per-file transactions queue instead of failing.
    #[inline]
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await
            .context("Failed to create database connection pool")?;

        let database = Self { pool };
        database.run_migrations().await?;

        Ok(database)
    }

    #[inline]
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    #[inline]
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");

        sqlx::migrate!("src/database/sqlite/migrations")
            .run(&self.pool)
            .await
            .context("Failed to run schema migration")?;

        debug!("Database migrations completed successfully");
        Ok(())
    }

    #[inline]
    pub async fn list_genomes(&self) -> Result<Vec<Genome>> {
        GenomeQueries::list_all(&self.pool).await
    }

    #[inline]
    pub async fn get_genome(&self, sample_id: &str) -> Result<Option<Genome>> {
        GenomeQueries::get_by_sample_id(&self.pool, sample_id).await
    }

    #[inline]
    pub async fn genome_statistics(&self, genome: Genome) -> Result<GenomeStatistics> {
        let feature_count = FeatureQueries::count_for_genome(&self.pool, genome.id).await?;
        let annotation_count = AnnotationQueries::count_for_genome(&self.pool, genome.id).await?;
        let sequence_region_count =
            SequenceRegionQueries::count_for_genome(&self.pool, genome.id).await?;

        Ok(GenomeStatistics {
            genome,
            feature_count,
            annotation_count,
            sequence_region_count,
        })
    }

    /// Reclaim space and refresh planner statistics after bulk loads.
    #[inline]
    pub async fn optimize(&self) -> Result<()> {
        info!("Optimizing database");

        sqlx::query("VACUUM")
            .execute(&self.pool)
            .await
            .context("Failed to vacuum database")?;

        sqlx::query("ANALYZE")
            .execute(&self.pool)
            .await
            .context("Failed to analyze database")?;

        debug!("Database optimization completed");
        Ok(())
    }
}
