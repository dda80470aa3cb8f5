
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use crate::database::sqlite::Database;
use crate::database::sqlite::bulk::bulk_insert;
use crate::database::sqlite::models::{
    FileFormat, GenomeMetadata, NewFeature, NewGenome, NewSequenceRegion,
};
use crate::database::sqlite::queries::GenomeQueries;
use crate::import::{self, ImportSummary};

/// Import every matching GFF3 file under `folder`, one file per transaction.
/// An empty match set is an error so the caller exits non-zero without
/// touching the database.
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
            "No GFF files found in {} matching pattern {}",
            folder.display(),
            pattern
        );
    }

    info!("Found {} GFF files to import", files.len());
    let summary = import::run_sequential(&files, |file| {
        import_file(database.clone(), file, batch_size)
    })
    .await;

    Ok(summary)
}

/// Import a single GFF3 file. Header pragmas may appear anywhere in the
/// file; the genome row is created up front and its metadata columns filled
/// in just before commit. Returns the number of feature rows written.
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

    let new_genome = NewGenome {
        sample_id: sample_id_for(&path),
        file_name: file_name_for(&path),
        file_path: path.display().to_string(),
        file_size: i64::try_from(file_size).unwrap_or(i64::MAX),
        file_format: FileFormat::Gff3,
    };

    let mut tx = database
        .pool()
        .begin()
        .await
        .context("Failed to begin import transaction")?;
    let genome_id = GenomeQueries::upsert(&mut tx, &new_genome).await?;

    let mut header = GffHeader::default();
    let mut batch: Vec<NewFeature> = Vec::with_capacity(batch_size);
    let mut feature_count: u64 = 0;

    while let Some(line) = lines
        .next_line()
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?
    {
        if line.starts_with('#') {
            header.collect(&line);
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }

        let Some(feature) = parse_feature_line(genome_id, &line) else {
            debug!("Skipping malformed line in {}", path.display());
            continue;
        };
        batch.push(feature);

        if batch.len() >= batch_size {
            feature_count += bulk_insert(&mut tx, &batch).await?;
            batch.clear();
        }
    }

    feature_count += bulk_insert(&mut tx, &batch).await?;

    GenomeQueries::update_metadata(&mut tx, genome_id, &header.metadata).await?;
    let regions = header.into_regions(genome_id);
    bulk_insert(&mut tx, &regions).await?;

    tx.commit().await.context("Failed to commit import")?;

    info!("Imported {} features from {}", feature_count, path.display());
    Ok(feature_count)
}

fn sample_id_for(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn file_name_for(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Header state accumulated while streaming a file. Repeated pragmas
/// overwrite earlier values (last write wins).
#[derive(Debug, Default)]
struct GffHeader {
    metadata: GenomeMetadata,
    regions: Vec<(String, i64, i64, Option<String>)>,
    species: Option<String>,
}

impl GffHeader {
    fn collect(&mut self, line: &str) {
        // Bakta writes TSV-style annotated comments into its GFF3 output.
        if let Some(rest) = line.strip_prefix("# Software:") {
            self.metadata.software_version = non_empty(rest);
            return;
        }
        if let Some(rest) = line.strip_prefix("# Database:") {
            let mut parts = rest.split(',');
            self.metadata.database_version = parts.next().and_then(non_empty);
            self.metadata.database_type = parts.next().and_then(non_empty);
            return;
        }
        if let Some(rest) = line.strip_prefix("# DOI:") {
            self.metadata.doi = non_empty(rest);
            return;
        }
        if let Some(rest) = line.strip_prefix("# URL:") {
            self.metadata.url = non_empty(rest);
            return;
        }

        // Pragma keyword is the first whitespace-delimited token, so
        // "#!genome-build-accession" cannot shadow "#!genome-build".
        let (key, rest) = line
            .split_once(char::is_whitespace)
            .unwrap_or((line, ""));
        match key {
            "##gff-version" => self.metadata.format_version = non_empty(rest),
            "##sequence-region" => self.collect_region(rest),
            "##species" => self.species = non_empty(rest),
            "#!genome-build" => self.metadata.genome_build = non_empty(rest),
            "#!genome-version" => self.metadata.genome_version = non_empty(rest),
            "#!genome-date" => self.metadata.annotation_date = non_empty(rest),
            "#!annotation-source" => self.metadata.annotation_source = non_empty(rest),
            _ => {}
        }
    }

    fn collect_region(&mut self, rest: &str) {
        let mut tokens = rest.split_whitespace();
        let (Some(seq_id), Some(start), Some(end)) =
            (tokens.next(), tokens.next(), tokens.next())
        else {
            return;
        };
        let (Ok(start), Ok(end)) = (start.parse::<i64>(), end.parse::<i64>()) else {
            return;
        };
        self.regions
            .push((seq_id.to_string(), start, end, self.species.clone()));
    }

    fn into_regions(self, genome_id: i64) -> Vec<NewSequenceRegion> {
        self.regions
            .into_iter()
            .map(
                |(seq_id, start_position, end_position, species)| NewSequenceRegion {
                    genome_id,
                    seq_id,
                    start_position,
                    end_position,
                    species,
                },
            )
            .collect()
    }
}

/// Parse one tab-separated data line. Lines with fewer than eight columns
/// are rejected; the ninth (attributes) column is optional.
fn parse_feature_line(genome_id: i64, line: &str) -> Option<NewFeature> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 8 {
        return None;
    }

    let attributes = fields.get(8).map(|raw| parse_attributes(raw)).and_then(|map| {
        if map.is_empty() {
            None
        } else {
            Some(Value::Object(map).to_string())
        }
    });

    Some(NewFeature {
        genome_id,
        seq_id: fields[0].to_string(),
        source: optional_field(fields[1]),
        feature_type: fields[2].to_string(),
        start_position: parse_position(fields[3]),
        stop_position: parse_position(fields[4]),
        score: optional_field(fields[5]).and_then(|raw| raw.parse().ok()),
        strand: optional_field(fields[6]),
        phase: optional_field(fields[7]).and_then(|raw| raw.parse().ok()),
        locus_tag: None,
        gene: None,
        product: None,
        attributes,
    })
}

/// Parse a `key=value;key=value` attribute string. A `key:value` pair is
/// accepted as a legacy fallback when `=` is absent; pairs missing a key or
/// value are dropped. Duplicate keys keep the last value.
#[inline]
pub fn parse_attributes(raw: &str) -> Map<String, Value> {
    let mut attributes = Map::new();

    for pair in raw.split(';') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }

        let Some((key, value)) = pair
            .split_once('=')
            .or_else(|| pair.split_once(':'))
        else {
            continue;
        };

        let (key, value) = (key.trim(), value.trim());
        if key.is_empty() || value.is_empty() {
            continue;
        }
        attributes.insert(key.to_string(), Value::String(value.to_string()));
    }

    attributes
}

/// Positions are 1-based; anything unparsable clamps to 1.
fn parse_position(raw: &str) -> i64 {
    raw.trim().parse::<i64>().unwrap_or(1).max(1)
}

/// The `.` sentinel and blank fields persist as NULL.
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
