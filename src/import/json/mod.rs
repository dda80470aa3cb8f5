
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use crate::database::sqlite::Database;
use crate::database::sqlite::bulk::bulk_insert;
use crate::database::sqlite::models::{
    FileFormat, GenomeMetadata, NewFeature, NewGenome, NewIps, NewPsc, NewPscc, NewSequenceRegion,
    NewUps,
};
use crate::database::sqlite::queries::{FeatureQueries, GenomeQueries, ProteinBlockQueries};
use crate::import::{self, ImportSummary};

/// Import every matching JSON document under `folder` with a fixed number of
/// files in flight. An empty match set is reported as a zero-count
/// completion rather than an error.
#[inline]
pub async fn import_folder(
    database: &Database,
    folder: &Path,
    pattern: &str,
    concurrency: usize,
) -> Result<ImportSummary> {
    let files = import::discover_files(folder, pattern)?;
    if files.is_empty() {
        info!(
            "No JSON files found in {} matching pattern {}; nothing to import",
            folder.display(),
            pattern
        );
        return Ok(ImportSummary::new(0));
    }

    info!(
        "Found {} JSON files to import ({} in flight)",
        files.len(),
        concurrency
    );
    let summary = import::run_bounded(&files, concurrency, |file| {
        import_file(database.clone(), file)
    })
    .await;

    Ok(summary)
}

/// Import one annotation document. The whole document is deserialized up
/// front (a malformed document fails the file); features fan out into the
/// cross-reference child tables inside the same transaction. Returns the
/// number of feature rows written.
#[inline]
pub async fn import_file(database: Database, path: PathBuf) -> Result<u64> {
    let content = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let document: AnnotationDocument = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON document {}", path.display()))?;

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
        file_size: i64::try_from(content.len()).unwrap_or(i64::MAX),
        file_format: FileFormat::Json,
    };

    let mut tx = database
        .pool()
        .begin()
        .await
        .context("Failed to begin import transaction")?;
    let genome_id = GenomeQueries::upsert(&mut tx, &new_genome).await?;

    let regions: Vec<NewSequenceRegion> = document
        .sequences
        .iter()
        .filter_map(|sequence| sequence.to_region(genome_id))
        .collect();
    bulk_insert(&mut tx, &regions).await?;

    let mut feature_count: u64 = 0;
    for feature in &document.features {
        let Some(new_feature) = feature.to_feature(genome_id) else {
            debug!("Skipping feature without type in {}", path.display());
            continue;
        };
        let feature_id = FeatureQueries::create(&mut tx, &new_feature).await?;

        for db_xref in &feature.db_xrefs {
            ProteinBlockQueries::insert_db_xref(&mut tx, feature_id, db_xref).await?;
        }
        for gene in &feature.genes {
            ProteinBlockQueries::insert_gene(&mut tx, feature_id, gene).await?;
        }

        if let Some(ups) = &feature.ups {
            let ups_id = ProteinBlockQueries::insert_ups(&mut tx, feature_id, &ups.to_row()).await?;
            for db_xref in &ups.db_xrefs {
                ProteinBlockQueries::insert_ups_db_xref(&mut tx, ups_id, db_xref).await?;
            }
        }

        if let Some(ips) = &feature.ips {
            let ips_id = ProteinBlockQueries::insert_ips(&mut tx, feature_id, &ips.to_row()).await?;
            for db_xref in &ips.db_xrefs {
                ProteinBlockQueries::insert_ips_db_xref(&mut tx, ips_id, db_xref).await?;
            }
        }

        if let Some(psc) = &feature.psc {
            let psc_id = ProteinBlockQueries::insert_psc(&mut tx, feature_id, &psc.to_row()).await?;
            for db_xref in &psc.db_xrefs {
                ProteinBlockQueries::insert_psc_db_xref(&mut tx, psc_id, db_xref).await?;
            }
            for go_id in &psc.go_ids {
                ProteinBlockQueries::insert_psc_go_term(&mut tx, psc_id, go_id).await?;
            }
            for ec_number in &psc.ec_ids {
                ProteinBlockQueries::insert_psc_ec_number(&mut tx, psc_id, ec_number).await?;
            }
        }

        if let Some(pscc) = &feature.pscc {
            let pscc_id =
                ProteinBlockQueries::insert_pscc(&mut tx, feature_id, &pscc.to_row()).await?;
            for db_xref in &pscc.db_xrefs {
                ProteinBlockQueries::insert_pscc_db_xref(&mut tx, pscc_id, db_xref).await?;
            }
        }

        feature_count += 1;
    }

    GenomeQueries::update_metadata(&mut tx, genome_id, &document.metadata()).await?;

    tx.commit().await.context("Failed to commit import")?;

    info!("Imported {} features from {}", feature_count, path.display());
    Ok(feature_count)
}

/// Top-level annotation document. Field names follow the upstream tool's
/// JSON output; anything unknown is ignored.
#[derive(Debug, Default, Deserialize)]
pub struct AnnotationDocument {
    #[serde(default)]
    pub genome: GenomeBlock,
    #[serde(default)]
    pub sequences: Vec<SequenceBlock>,
    #[serde(default)]
    pub features: Vec<FeatureBlock>,
    #[serde(default)]
    pub version: VersionBlock,
}

impl AnnotationDocument {
    fn metadata(&self) -> GenomeMetadata {
        GenomeMetadata {
            software_version: self.version.bakta.clone(),
            database_version: self.version.database_version(),
            database_type: self.version.database_type(),
            organism: self.genome.organism(),
            ..GenomeMetadata::default()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct GenomeBlock {
    pub genus: Option<String>,
    pub species: Option<String>,
    pub strain: Option<String>,
}

impl GenomeBlock {
    fn organism(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.genus, &self.species, &self.strain]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .filter(|part| !part.trim().is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SequenceBlock {
    pub id: Option<String>,
    pub length: Option<i64>,
}

impl SequenceBlock {
    fn to_region(&self, genome_id: i64) -> Option<NewSequenceRegion> {
        let id = self.id.as_deref()?.trim();
        if id.is_empty() {
            return None;
        }
        Some(NewSequenceRegion {
            genome_id,
            seq_id: id.to_string(),
            start_position: 1,
            end_position: self.length.unwrap_or(1).max(1),
            species: None,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct FeatureBlock {
    #[serde(rename = "type")]
    pub feature_type: Option<String>,
    /// Sequence identifier; older tool versions call this `contig`.
    #[serde(default, alias = "sequence")]
    pub contig: Option<String>,
    pub start: Option<i64>,
    pub stop: Option<i64>,
    pub strand: Option<String>,
    pub locus: Option<String>,
    pub gene: Option<String>,
    pub product: Option<String>,
    #[serde(default)]
    pub db_xrefs: Vec<String>,
    #[serde(default)]
    pub genes: Vec<String>,
    pub ups: Option<UpsBlock>,
    pub ips: Option<IpsBlock>,
    pub psc: Option<PscBlock>,
    pub pscc: Option<PsccBlock>,
}

impl FeatureBlock {
    fn to_feature(&self, genome_id: i64) -> Option<NewFeature> {
        let feature_type = self.feature_type.as_deref()?.trim();
        if feature_type.is_empty() {
            return None;
        }

        Some(NewFeature {
            genome_id,
            seq_id: self.contig.clone().unwrap_or_else(|| "unknown".to_string()),
            source: None,
            feature_type: feature_type.to_string(),
            start_position: self.start.unwrap_or(1).max(1),
            stop_position: self.stop.unwrap_or(1).max(1),
            score: None,
            strand: self
                .strand
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty() && *s != ".")
                .map(str::to_string),
            phase: None,
            locus_tag: self.locus.clone(),
            gene: self.gene.clone(),
            product: self.product.clone(),
            attributes: None,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpsBlock {
    pub ncbi_nrp_id: Option<String>,
    pub uniparc_id: Option<String>,
    pub uniref100_id: Option<String>,
    #[serde(default)]
    pub db_xrefs: Vec<String>,
}

impl UpsBlock {
    fn to_row(&self) -> NewUps {
        NewUps {
            ncbi_nrp_id: self.ncbi_nrp_id.clone(),
            uniparc_id: self.uniparc_id.clone(),
            uniref100_id: self.uniref100_id.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct IpsBlock {
    pub uniref90_id: Option<String>,
    pub uniparc_id: Option<String>,
    #[serde(default)]
    pub db_xrefs: Vec<String>,
}

impl IpsBlock {
    fn to_row(&self) -> NewIps {
        NewIps {
            uniref90_id: self.uniref90_id.clone(),
            uniparc_id: self.uniparc_id.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PscBlock {
    pub uniref90_id: Option<String>,
    pub cog_id: Option<String>,
    pub cog_category: Option<String>,
    pub gene: Option<String>,
    pub product: Option<String>,
    #[serde(default)]
    pub ec_ids: Vec<String>,
    #[serde(default)]
    pub go_ids: Vec<String>,
    #[serde(default)]
    pub db_xrefs: Vec<String>,
}

impl PscBlock {
    fn to_row(&self) -> NewPsc {
        NewPsc {
            uniref90_id: self.uniref90_id.clone(),
            cog_id: self.cog_id.clone(),
            cog_category: self.cog_category.clone(),
            gene: self.gene.clone(),
            product: self.product.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PsccBlock {
    pub uniref50_id: Option<String>,
    pub product: Option<String>,
    #[serde(default)]
    pub db_xrefs: Vec<String>,
}

impl PsccBlock {
    fn to_row(&self) -> NewPscc {
        NewPscc {
            uniref50_id: self.uniref50_id.clone(),
            product: self.product.clone(),
        }
    }
}

/// The version block's `db` entry is a bare string in old documents and a
/// `{version, type}` object in newer ones.
#[derive(Debug, Default, Deserialize)]
pub struct VersionBlock {
    pub bakta: Option<String>,
    pub db: Option<DbVersion>,
}

impl VersionBlock {
    fn database_version(&self) -> Option<String> {
        match &self.db {
            Some(DbVersion::Text(text)) => Some(text.clone()),
            Some(DbVersion::Block { version, .. }) => version.clone(),
            None => None,
        }
    }

    fn database_type(&self) -> Option<String> {
        match &self.db {
            Some(DbVersion::Block { db_type, .. }) => db_type.clone(),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum DbVersion {
    Text(String),
    Block {
        version: Option<String>,
        #[serde(rename = "type")]
        db_type: Option<String>,
    },
}
