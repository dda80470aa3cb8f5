#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use crate::database::sqlite::Database;
use crate::database::sqlite::bulk::bulk_insert;
use crate::database::sqlite::models::{FileFormat, GenomeMetadata, NewAnnotation, NewGenome};
use crate::database::sqlite::queries::GenomeQueries;
use crate::import::{self, ImportSummary};

/// Import every matching Bakta TSV file under `folder`, one file per
/// transaction. An empty match set is an error so the caller exits non-zero
/// without touching the database.
#[inline]
pub async fn import_folder(
    database: &Database,
    folder: &Path,
    pattern: &str,
    batch_size: usize,
) -> Result<ImportSummary> {
    let files = import::discover_files(folder, pattern)?;
    if files.is_empty() {
        bail!(
            "No TSV files found in {} matching pattern {}",
            folder.display(),
            pattern
        );
    }

    info!("Found {} TSV files to import", files.len());
    let summary = import::run_sequential(&files, |file| {
        import_file(database.clone(), file, batch_size)
    })
    .await;

    Ok(summary)
}

/// Import one Bakta TSV annotation file. Returns the number of annotation
/// rows written.
#[inline]
pub async fn import_file(database: Database, path: PathBuf, batch_size: usize) -> Result<u64> {
    let file_size = tokio::fs::metadata(&path)
        .await
        .with_context(|| format!("Failed to stat {}", path.display()))?
        .len();
    let file = File::open(&path)
        .await
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let mut lines = BufReader::new(file).lines();

    let sample_id = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let new_genome = NewGenome {
        sample_id,
        file_name: path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string()),
        file_path: path.display().to_string(),
        file_size: i64::try_from(file_size).unwrap_or(i64::MAX),
        file_format: FileFormat::Tsv,
    };

    let mut tx = database
        .pool()
        .begin()
        .await
        .context("Failed to begin import transaction")?;
    let genome_id = GenomeQueries::upsert(&mut tx, &new_genome).await?;

    let mut metadata = GenomeMetadata::default();
    let mut batch: Vec<NewAnnotation> = Vec::with_capacity(batch_size);
    let mut annotation_count: u64 = 0;

    while let Some(line) = lines
        .next_line()
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?
    {
        if line.starts_with('#') {
            collect_metadata(&mut metadata, &line);
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }

        let Some(annotation) = parse_annotation_line(genome_id, &line) else {
            debug!("Skipping malformed line in {}", path.display());
            continue;
        };
        batch.push(annotation);

        if batch.len() >= batch_size {
            annotation_count += bulk_insert(&mut tx, &batch).await?;
            batch.clear();
        }
    }

    annotation_count += bulk_insert(&mut tx, &batch).await?;
    GenomeQueries::update_metadata(&mut tx, genome_id, &metadata).await?;

    tx.commit().await.context("Failed to commit import")?;

    info!(
        "Imported {} annotations from {}",
        annotation_count,
        path.display()
    );
    Ok(annotation_count)
}

/// Exact-prefix header matching; repeated keys keep the last value.
fn collect_metadata(metadata: &mut GenomeMetadata, line: &str) {
    if let Some(rest) = line.strip_prefix("# Software:") {
        metadata.software_version = non_empty(rest);
    } else if let Some(rest) = line.strip_prefix("# Database:") {
        let mut parts = rest.split(',');
        metadata.database_version = parts.next().and_then(non_empty);
        metadata.database_type = parts.next().and_then(non_empty);
    } else if let Some(rest) = line.strip_prefix("# DOI:") {
        metadata.doi = non_empty(rest);
    } else if let Some(rest) = line.strip_prefix("# URL:") {
        metadata.url = non_empty(rest);
    }
}

/// Columns: sequence id, type, start, stop, strand, locus tag, gene,
/// product, dbxrefs. At least the first eight must be present; blank
/// optional fields persist as NULL.
fn parse_annotation_line(genome_id: i64, line: &str) -> Option<NewAnnotation> {
    let fields: Vec<&str> = line.trim_end_matches(['\r', '\n']).split('\t').collect();
    if fields.len() < 8 {
        return None;
    }

    Some(NewAnnotation {
        genome_id,
        sequence_id: fields[0].to_string(),
        feature_type: fields[1].to_string(),
        start_position: parse_position(fields[2]),
        stop_position: parse_position(fields[3]),
        strand: optional_field(fields[4]),
        locus_tag: optional_field(fields[5]),
        gene: optional_field(fields[6]),
        product: optional_field(fields[7]),
        dbxrefs: fields.get(8).copied().and_then(optional_field),
    })
}

/// Positions are 1-based; anything unparsable clamps to 1.
fn parse_position(raw: &str) -> i64 {
    raw.trim().parse::<i64>().unwrap_or(1).max(1)
}

/// Blank fields and the `.` sentinel persist as NULL.
fn optional_field(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "." {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
