
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::query_builder::Separated;
use sqlx::{FromRow, Sqlite, Type};

use crate::database::sqlite::bulk::BulkRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Genome {
    pub id: i64,
    pub sample_id: String,
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub file_format: FileFormat,
    pub format_version: Option<String>,
    pub software_version: Option<String>,
    pub database_version: Option<String>,
    pub database_type: Option<String>,
    pub doi: Option<String>,
    pub url: Option<String>,
    pub genome_build: Option<String>,
    pub genome_version: Option<String>,
    pub annotation_date: Option<String>,
    pub annotation_source: Option<String>,
    pub organism: Option<String>,
    pub imported_date: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(rename_all = "lowercase")]
pub enum FileFormat {
    Tsv,
    Gff3,
    Json,
}

impl std::fmt::Display for FileFormat {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            FileFormat::Tsv => write!(f, "tsv"),
            FileFormat::Gff3 => write!(f, "gff3"),
            FileFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewGenome {
    pub sample_id: String,
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub file_format: FileFormat,
}

/// Header metadata collected while reading a file. All fields default to
/// None; repeated header keys overwrite earlier values (last write wins).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GenomeMetadata {
    pub format_version: Option<String>,
    pub software_version: Option<String>,
    pub database_version: Option<String>,
    pub database_type: Option<String>,
    pub doi: Option<String>,
    pub url: Option<String>,
    pub genome_build: Option<String>,
    pub genome_version: Option<String>,
    pub annotation_date: Option<String>,
    pub annotation_source: Option<String>,
    pub organism: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct SequenceRegion {
    pub id: i64,
    pub genome_id: i64,
    pub seq_id: String,
    pub start_position: i64,
    pub end_position: i64,
    pub species: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSequenceRegion {
    pub genome_id: i64,
    pub seq_id: String,
    pub start_position: i64,
    pub end_position: i64,
    pub species: Option<String>,
}

impl BulkRow for NewSequenceRegion {
    const TABLE: &'static str = "sequence_regions";
    const COLUMNS: &'static [&'static str] = &[
        "genome_id",
        "seq_id",
        "start_position",
        "end_position",
        "species",
    ];

    #[inline]
    fn bind(&self, row: &mut Separated<'_, '_, Sqlite, &'static str>) {
        row.push_bind(self.genome_id)
            .push_bind(self.seq_id.clone())
            .push_bind(self.start_position)
            .push_bind(self.end_position)
            .push_bind(self.species.clone());
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Feature {
    pub id: i64,
    pub genome_id: i64,
    pub seq_id: String,
    pub source: Option<String>,
    pub feature_type: String,
    pub start_position: i64,
    pub stop_position: i64,
    pub score: Option<f64>,
    pub strand: Option<String>,
    pub phase: Option<i64>,
    pub locus_tag: Option<String>,
    pub gene: Option<String>,
    pub product: Option<String>,
    pub attributes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFeature {
    pub genome_id: i64,
    pub seq_id: String,
    pub source: Option<String>,
    pub feature_type: String,
    pub start_position: i64,
    pub stop_position: i64,
    pub score: Option<f64>,
    pub strand: Option<String>,
    pub phase: Option<i64>,
    pub locus_tag: Option<String>,
    pub gene: Option<String>,
    pub product: Option<String>,
    pub attributes: Option<String>,
}

impl BulkRow for NewFeature {
    const TABLE: &'static str = "features";
    const COLUMNS: &'static [&'static str] = &[
        "genome_id",
        "seq_id",
        "source",
        "feature_type",
        "start_position",
        "stop_position",
        "score",
        "strand",
        "phase",
        "locus_tag",
        "gene",
        "product",
        "attributes",
    ];

    #[inline]
    fn bind(&self, row: &mut Separated<'_, '_, Sqlite, &'static str>) {
        row.push_bind(self.genome_id)
            .push_bind(self.seq_id.clone())
            .push_bind(self.source.clone())
            .push_bind(self.feature_type.clone())
            .push_bind(self.start_position)
            .push_bind(self.stop_position)
            .push_bind(self.score)
            .push_bind(self.strand.clone())
            .push_bind(self.phase)
            .push_bind(self.locus_tag.clone())
            .push_bind(self.gene.clone())
            .push_bind(self.product.clone())
            .push_bind(self.attributes.clone());
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Annotation {
    pub id: i64,
    pub genome_id: i64,
    pub sequence_id: String,
    pub feature_type: String,
    pub start_position: i64,
    pub stop_position: i64,
    pub strand: Option<String>,
    pub locus_tag: Option<String>,
    pub gene: Option<String>,
    pub product: Option<String>,
    pub dbxrefs: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAnnotation {
    pub genome_id: i64,
    pub sequence_id: String,
    pub feature_type: String,
    pub start_position: i64,
    pub stop_position: i64,
    pub strand: Option<String>,
    pub locus_tag: Option<String>,
    pub gene: Option<String>,
    pub product: Option<String>,
    pub dbxrefs: Option<String>,
}

impl BulkRow for NewAnnotation {
    const TABLE: &'static str = "annotations";
    const COLUMNS: &'static [&'static str] = &[
        "genome_id",
        "sequence_id",
        "feature_type",
        "start_position",
        "stop_position",
        "strand",
        "locus_tag",
        "gene",
        "product",
        "dbxrefs",
    ];

    #[inline]
    fn bind(&self, row: &mut Separated<'_, '_, Sqlite, &'static str>) {
        row.push_bind(self.genome_id)
            .push_bind(self.sequence_id.clone())
            .push_bind(self.feature_type.clone())
            .push_bind(self.start_position)
            .push_bind(self.stop_position)
            .push_bind(self.strand.clone())
            .push_bind(self.locus_tag.clone())
            .push_bind(self.gene.clone())
            .push_bind(self.product.clone())
            .push_bind(self.dbxrefs.clone());
    }
}

/// Unique protein sequence cross-reference block.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewUps {
    pub ncbi_nrp_id: Option<String>,
    pub uniparc_id: Option<String>,
    pub uniref100_id: Option<String>,
}

/// Identical protein sequence cross-reference block.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewIps {
    pub uniref90_id: Option<String>,
    pub uniparc_id: Option<String>,
}

/// Protein sequence cluster block.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewPsc {
    pub uniref90_id: Option<String>,
    pub cog_id: Option<String>,
    pub cog_category: Option<String>,
    pub gene: Option<String>,
    pub product: Option<String>,
}

/// Protein sequence cluster-of-clusters block.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewPscc {
    pub uniref50_id: Option<String>,
    pub product: Option<String>,
}

/// Per-genome row counts reported by the list command.
#[derive(Debug, Clone, PartialEq)]
pub struct GenomeStatistics {
    pub genome: Genome,
    pub feature_count: i64,
    pub annotation_count: i64,
    pub sequence_region_count: i64,
}
