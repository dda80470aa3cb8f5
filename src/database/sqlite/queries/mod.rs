
use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};

use super::models::{
    Annotation, Feature, Genome, GenomeMetadata, NewFeature, NewGenome, NewIps, NewPsc, NewPscc,
    NewUps, SequenceRegion,
};

const GENOME_COLUMNS: &str = "id, sample_id, file_name, file_path, file_size, file_format, \
     format_version, software_version, database_version, database_type, doi, url, \
     genome_build, genome_version, annotation_date, annotation_source, organism, imported_date";

pub struct GenomeQueries;

impl GenomeQueries {
    /// Insert-or-replace keyed on sample_id; returns the genome id either
    /// way. On the re-import path all dependent rows are wiped (the
    /// feature/annotation child tables empty themselves through the CASCADE
    /// foreign keys) and previously recorded header metadata is cleared.
    /// The INSERT runs as the transaction's first statement so concurrent
    /// file imports queue on the write lock instead of failing a later lock
    /// upgrade.
    #[inline]
    pub async fn upsert(tx: &mut Transaction<'_, Sqlite>, new_genome: &NewGenome) -> Result<i64> {
        let now = Utc::now().naive_utc();
        sqlx::query(
            "INSERT INTO genomes (sample_id, file_name, file_path, file_size, file_format, imported_date) \
             VALUES (?, ?, ?, ?, ?, ?) \
             ON CONFLICT(sample_id) DO UPDATE SET \
                 file_name = excluded.file_name, \
                 file_path = excluded.file_path, \
                 file_size = excluded.file_size, \
                 file_format = excluded.file_format, \
                 format_version = NULL, software_version = NULL, database_version = NULL, \
                 database_type = NULL, doi = NULL, url = NULL, genome_build = NULL, \
                 genome_version = NULL, annotation_date = NULL, annotation_source = NULL, \
                 organism = NULL, \
                 imported_date = excluded.imported_date",
        )
        .bind(&new_genome.sample_id)
        .bind(&new_genome.file_name)
        .bind(&new_genome.file_path)
        .bind(new_genome.file_size)
        .bind(new_genome.file_format)
        .bind(now)
        .execute(&mut **tx)
        .await
        .context("Failed to upsert genome record")?;

        let genome_id: i64 = sqlx::query_scalar("SELECT id FROM genomes WHERE sample_id = ?")
            .bind(&new_genome.sample_id)
            .fetch_one(&mut **tx)
            .await
            .context("Failed to fetch genome id after upsert")?;

        for table in ["features", "annotations", "sequence_regions"] {
            sqlx::query(&format!("DELETE FROM {table} WHERE genome_id = ?"))
                .bind(genome_id)
                .execute(&mut **tx)
                .await
                .with_context(|| format!("Failed to delete {table} for re-import"))?;
        }

        Ok(genome_id)
    }

    #[inline]
    pub async fn update_metadata(
        tx: &mut Transaction<'_, Sqlite>,
        genome_id: i64,
        metadata: &GenomeMetadata,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE genomes SET format_version = ?, software_version = ?, database_version = ?, \
             database_type = ?, doi = ?, url = ?, genome_build = ?, genome_version = ?, \
             annotation_date = ?, annotation_source = ?, organism = ? \
             WHERE id = ?",
        )
        .bind(&metadata.format_version)
        .bind(&metadata.software_version)
        .bind(&metadata.database_version)
        .bind(&metadata.database_type)
        .bind(&metadata.doi)
        .bind(&metadata.url)
        .bind(&metadata.genome_build)
        .bind(&metadata.genome_version)
        .bind(&metadata.annotation_date)
        .bind(&metadata.annotation_source)
        .bind(&metadata.organism)
        .bind(genome_id)
        .execute(&mut **tx)
        .await
        .context("Failed to update genome metadata")?;

        Ok(())
    }

    #[inline]
    pub async fn get_by_sample_id(pool: &SqlitePool, sample_id: &str) -> Result<Option<Genome>> {
        sqlx::query_as::<_, Genome>(&format!(
            "SELECT {GENOME_COLUMNS} FROM genomes WHERE sample_id = ?"
        ))
        .bind(sample_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get genome by sample id")
    }

    #[inline]
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Genome>> {
        sqlx::query_as::<_, Genome>(&format!(
            "SELECT {GENOME_COLUMNS} FROM genomes ORDER BY imported_date DESC, sample_id ASC"
        ))
        .fetch_all(pool)
        .await
        .context("Failed to list genomes")
    }
}

pub struct SequenceRegionQueries;

impl SequenceRegionQueries {
    #[inline]
    pub async fn list_for_genome(pool: &SqlitePool, genome_id: i64) -> Result<Vec<SequenceRegion>> {
        sqlx::query_as::<_, SequenceRegion>(
            "SELECT id, genome_id, seq_id, start_position, end_position, species \
             FROM sequence_regions WHERE genome_id = ? ORDER BY id",
        )
        .bind(genome_id)
        .fetch_all(pool)
        .await
        .context("Failed to list sequence regions")
    }

    #[inline]
    pub async fn count_for_genome(pool: &SqlitePool, genome_id: i64) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM sequence_regions WHERE genome_id = ?")
            .bind(genome_id)
            .fetch_one(pool)
            .await
            .context("Failed to count sequence regions")
    }
}

pub struct FeatureQueries;

impl FeatureQueries {
    /// Single-row insert returning the new feature id, used by the JSON
    /// importer which fans out into the cross-reference child tables.
    #[inline]
    pub async fn create(tx: &mut Transaction<'_, Sqlite>, feature: &NewFeature) -> Result<i64> {
        let id = sqlx::query(
            "INSERT INTO features (genome_id, seq_id, source, feature_type, start_position, \
             stop_position, score, strand, phase, locus_tag, gene, product, attributes) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(feature.genome_id)
        .bind(&feature.seq_id)
        .bind(&feature.source)
        .bind(&feature.feature_type)
        .bind(feature.start_position)
        .bind(feature.stop_position)
        .bind(feature.score)
        .bind(&feature.strand)
        .bind(feature.phase)
        .bind(&feature.locus_tag)
        .bind(&feature.gene)
        .bind(&feature.product)
        .bind(&feature.attributes)
        .execute(&mut **tx)
        .await
        .context("Failed to insert feature")?
        .last_insert_rowid();

        Ok(id)
    }

    #[inline]
    pub async fn list_for_genome(pool: &SqlitePool, genome_id: i64) -> Result<Vec<Feature>> {
        sqlx::query_as::<_, Feature>(
            "SELECT id, genome_id, seq_id, source, feature_type, start_position, stop_position, \
             score, strand, phase, locus_tag, gene, product, attributes \
             FROM features WHERE genome_id = ? ORDER BY id",
        )
        .bind(genome_id)
        .fetch_all(pool)
        .await
        .context("Failed to list features")
    }

    #[inline]
    pub async fn count_for_genome(pool: &SqlitePool, genome_id: i64) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM features WHERE genome_id = ?")
            .bind(genome_id)
            .fetch_one(pool)
            .await
            .context("Failed to count features")
    }
}

pub struct AnnotationQueries;

impl AnnotationQueries {
    #[inline]
    pub async fn list_for_genome(pool: &SqlitePool, genome_id: i64) -> Result<Vec<Annotation>> {
        sqlx::query_as::<_, Annotation>(
            "SELECT id, genome_id, sequence_id, feature_type, start_position, stop_position, \
             strand, locus_tag, gene, product, dbxrefs \
             FROM annotations WHERE genome_id = ? ORDER BY id",
        )
        .bind(genome_id)
        .fetch_all(pool)
        .await
        .context("Failed to list annotations")
    }

    #[inline]
    pub async fn count_for_genome(pool: &SqlitePool, genome_id: i64) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM annotations WHERE genome_id = ?")
            .bind(genome_id)
            .fetch_one(pool)
            .await
            .context("Failed to count annotations")
    }
}

/// Inserts for the per-feature protein cross-reference blocks written by the
/// JSON importer. All run on the importing file's transaction.
pub struct ProteinBlockQueries;

impl ProteinBlockQueries {
    #[inline]
    pub async fn insert_db_xref(
        tx: &mut Transaction<'_, Sqlite>,
        feature_id: i64,
        db_xref: &str,
    ) -> Result<()> {
        sqlx::query("INSERT INTO db_xrefs (feature_id, db_xref) VALUES (?, ?)")
            .bind(feature_id)
            .bind(db_xref)
            .execute(&mut **tx)
            .await
            .context("Failed to insert db_xref")?;
        Ok(())
    }

    #[inline]
    pub async fn insert_gene(
        tx: &mut Transaction<'_, Sqlite>,
        feature_id: i64,
        gene: &str,
    ) -> Result<()> {
        sqlx::query("INSERT INTO genes (feature_id, gene) VALUES (?, ?)")
            .bind(feature_id)
            .bind(gene)
            .execute(&mut **tx)
            .await
            .context("Failed to insert gene")?;
        Ok(())
    }

    #[inline]
    pub async fn insert_ups(
        tx: &mut Transaction<'_, Sqlite>,
        feature_id: i64,
        ups: &NewUps,
    ) -> Result<i64> {
        let id = sqlx::query(
            "INSERT INTO ups (feature_id, ncbi_nrp_id, uniparc_id, uniref100_id) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(feature_id)
        .bind(&ups.ncbi_nrp_id)
        .bind(&ups.uniparc_id)
        .bind(&ups.uniref100_id)
        .execute(&mut **tx)
        .await
        .context("Failed to insert ups block")?
        .last_insert_rowid();
        Ok(id)
    }

    #[inline]
    pub async fn insert_ups_db_xref(
        tx: &mut Transaction<'_, Sqlite>,
        ups_id: i64,
        db_xref: &str,
    ) -> Result<()> {
        sqlx::query("INSERT INTO ups_db_xrefs (ups_id, db_xref) VALUES (?, ?)")
            .bind(ups_id)
            .bind(db_xref)
            .execute(&mut **tx)
            .await
            .context("Failed to insert ups db_xref")?;
        Ok(())
    }

    #[inline]
    pub async fn insert_ips(
        tx: &mut Transaction<'_, Sqlite>,
        feature_id: i64,
        ips: &NewIps,
    ) -> Result<i64> {
        let id = sqlx::query(
            "INSERT INTO ips (feature_id, uniref90_id, uniparc_id) VALUES (?, ?, ?)",
        )
        .bind(feature_id)
        .bind(&ips.uniref90_id)
        .bind(&ips.uniparc_id)
        .execute(&mut **tx)
        .await
        .context("Failed to insert ips block")?
        .last_insert_rowid();
        Ok(id)
    }

    #[inline]
    pub async fn insert_ips_db_xref(
        tx: &mut Transaction<'_, Sqlite>,
        ips_id: i64,
        db_xref: &str,
    ) -> Result<()> {
        sqlx::query("INSERT INTO ips_db_xrefs (ips_id, db_xref) VALUES (?, ?)")
            .bind(ips_id)
            .bind(db_xref)
            .execute(&mut **tx)
            .await
            .context("Failed to insert ips db_xref")?;
        Ok(())
    }

    #[inline]
    pub async fn insert_psc(
        tx: &mut Transaction<'_, Sqlite>,
        feature_id: i64,
        psc: &NewPsc,
    ) -> Result<i64> {
        let id = sqlx::query(
            "INSERT INTO psc (feature_id, uniref90_id, cog_id, cog_category, gene, product) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(feature_id)
        .bind(&psc.uniref90_id)
        .bind(&psc.cog_id)
        .bind(&psc.cog_category)
        .bind(&psc.gene)
        .bind(&psc.product)
        .execute(&mut **tx)
        .await
        .context("Failed to insert psc block")?
        .last_insert_rowid();
        Ok(id)
    }

    #[inline]
    pub async fn insert_psc_db_xref(
        tx: &mut Transaction<'_, Sqlite>,
        psc_id: i64,
        db_xref: &str,
    ) -> Result<()> {
        sqlx::query("INSERT INTO psc_db_xrefs (psc_id, db_xref) VALUES (?, ?)")
            .bind(psc_id)
            .bind(db_xref)
            .execute(&mut **tx)
            .await
            .context("Failed to insert psc db_xref")?;
        Ok(())
    }

    #[inline]
    pub async fn insert_psc_go_term(
        tx: &mut Transaction<'_, Sqlite>,
        psc_id: i64,
        go_id: &str,
    ) -> Result<()> {
        sqlx::query("INSERT INTO psc_go_terms (psc_id, go_id) VALUES (?, ?)")
            .bind(psc_id)
            .bind(go_id)
            .execute(&mut **tx)
            .await
            .context("Failed to insert psc GO term")?;
        Ok(())
    }

    #[inline]
    pub async fn insert_psc_ec_number(
        tx: &mut Transaction<'_, Sqlite>,
        psc_id: i64,
        ec_number: &str,
    ) -> Result<()> {
        sqlx::query("INSERT INTO psc_ec_numbers (psc_id, ec_number) VALUES (?, ?)")
            .bind(psc_id)
            .bind(ec_number)
            .execute(&mut **tx)
            .await
            .context("Failed to insert psc EC number")?;
        Ok(())
    }

    #[inline]
    pub async fn insert_pscc(
        tx: &mut Transaction<'_, Sqlite>,
        feature_id: i64,
        pscc: &NewPscc,
    ) -> Result<i64> {
        let id = sqlx::query(
            "INSERT INTO pscc (feature_id, uniref50_id, product) VALUES (?, ?, ?)",
        )
        .bind(feature_id)
        .bind(&pscc.uniref50_id)
        .bind(&pscc.product)
        .execute(&mut **tx)
        .await
        .context("Failed to insert pscc block")?
        .last_insert_rowid();
        Ok(id)
    }

    #[inline]
    pub async fn insert_pscc_db_xref(
        tx: &mut Transaction<'_, Sqlite>,
        pscc_id: i64,
        db_xref: &str,
    ) -> Result<()> {
        sqlx::query("INSERT INTO pscc_db_xrefs (pscc_id, db_xref) VALUES (?, ?)")
            .bind(pscc_id)
            .bind(db_xref)
            .execute(&mut **tx)
            .await
            .context("Failed to insert pscc db_xref")?;
        Ok(())
    }

    #[inline]
    pub async fn count_in(pool: &SqlitePool, table: &str) -> Result<i64> {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(pool)
            .await
            .with_context(|| format!("Failed to count rows in {table}"))
    }
}
