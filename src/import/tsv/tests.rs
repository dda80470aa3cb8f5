use super::*;
use crate::database::sqlite::queries::AnnotationQueries;
use tempfile::TempDir;

#[test]
fn metadata_header_lines_parse() {
    let mut metadata = GenomeMetadata::default();
    collect_metadata(&mut metadata, "# Software: v1.9.2");
    collect_metadata(&mut metadata, "# Database: v5.1, full");
    collect_metadata(&mut metadata, "# DOI: 10.1099/mgen.0.000685");
    collect_metadata(&mut metadata, "# URL: github.com/oschwengers/bakta");
    collect_metadata(&mut metadata, "# Sequence(s): 1 unrecognized header");

    assert_eq!(metadata.software_version.as_deref(), Some("v1.9.2"));
    assert_eq!(metadata.database_version.as_deref(), Some("v5.1"));
    assert_eq!(metadata.database_type.as_deref(), Some("full"));
    assert_eq!(metadata.doi.as_deref(), Some("10.1099/mgen.0.000685"));
    assert_eq!(metadata.url.as_deref(), Some("github.com/oschwengers/bakta"));
}

#[test]
fn duplicate_metadata_keys_keep_last_value() {
    let mut metadata = GenomeMetadata::default();
    collect_metadata(&mut metadata, "# Software: v1.8.0");
    collect_metadata(&mut metadata, "# Software: v1.9.2");
    assert_eq!(metadata.software_version.as_deref(), Some("v1.9.2"));
}

#[test]
fn database_header_without_type_leaves_type_null() {
    let mut metadata = GenomeMetadata::default();
    collect_metadata(&mut metadata, "# Database: v5.1");
    assert_eq!(metadata.database_version.as_deref(), Some("v5.1"));
    assert_eq!(metadata.database_type, None);
}

#[test]
fn annotation_line_parses() {
    let line = "contig_1\tcds\t256\t1041\t+\tBAKTA_0001\tdnaA\tchromosomal replication initiator protein DnaA\tSO:0001217, UniRef:UniRef50_P03004";
    let annotation = parse_annotation_line(3, line).expect("line parses");

    assert_eq!(annotation.genome_id, 3);
    assert_eq!(annotation.sequence_id, "contig_1");
    assert_eq!(annotation.feature_type, "cds");
    assert_eq!(annotation.start_position, 256);
    assert_eq!(annotation.stop_position, 1041);
    assert_eq!(annotation.strand.as_deref(), Some("+"));
    assert_eq!(annotation.locus_tag.as_deref(), Some("BAKTA_0001"));
    assert_eq!(annotation.gene.as_deref(), Some("dnaA"));
    assert_eq!(
        annotation.dbxrefs.as_deref(),
        Some("SO:0001217, UniRef:UniRef50_P03004")
    );
}

#[test]
fn blank_optional_fields_become_null() {
    let line = "contig_1\tcds\t256\t1041\t+\t\t\thypothetical protein";
    let annotation = parse_annotation_line(1, line).expect("line parses");

    assert_eq!(annotation.locus_tag, None);
    assert_eq!(annotation.gene, None);
    assert_eq!(annotation.product.as_deref(), Some("hypothetical protein"));
    assert_eq!(annotation.dbxrefs, None);
}

#[test]
fn short_lines_are_rejected() {
    assert!(parse_annotation_line(1, "contig_1\tcds\t1\t10").is_none());
    assert!(parse_annotation_line(1, "").is_none());
}

#[test]
fn unparsable_positions_clamp_to_one() {
    let line = "contig_1\tcds\tnotanumber\t-7\t+\tL1\tg1\tp1";
    let annotation = parse_annotation_line(1, line).expect("line parses");
    assert_eq!(annotation.start_position, 1);
    assert_eq!(annotation.stop_position, 1);
}

#[tokio::test]
async fn import_file_loads_annotations_and_metadata() {
    let temp_dir = TempDir::new().expect("can create temp dir");
    let database = Database::new(&temp_dir.path().join("test.db"))
        .await
        .expect("can create database");

    let tsv_path = temp_dir.path().join("GCF_000005845.tsv");
    let content = "\
# Software: v1.9.2
# Database: v5.1, full
# DOI: 10.1099/mgen.0.000685
# URL: github.com/oschwengers/bakta
#Sequence Id\tType\tStart\tStop\tStrand\tLocus Tag\tGene\tProduct\tDbXrefs
contig_1\tcds\t256\t1041\t+\tBAKTA_0001\tdnaA\treplication initiator\tSO:0001217
contig_1\tcds\t1200\t1500\t-\tBAKTA_0002\t\thypothetical protein\t

contig_1\tbroken
";
    std::fs::write(&tsv_path, content).expect("can write fixture");

    let count = import_file(database.clone(), tsv_path, 1000)
        .await
        .expect("import succeeds");
    assert_eq!(count, 2);

    let genome = database
        .get_genome("GCF_000005845")
        .await
        .expect("can fetch genome")
        .expect("genome exists");
    assert_eq!(genome.file_format, FileFormat::Tsv);
    assert_eq!(genome.software_version.as_deref(), Some("v1.9.2"));
    assert_eq!(genome.database_type.as_deref(), Some("full"));

    let annotations = AnnotationQueries::list_for_genome(database.pool(), genome.id)
        .await
        .expect("can list annotations");
    assert_eq!(annotations.len(), 2);
    assert_eq!(annotations[0].gene.as_deref(), Some("dnaA"));
    assert_eq!(annotations[1].gene, None);
    assert_eq!(annotations[1].dbxrefs, None);
}

#[tokio::test]
async fn reimport_replaces_annotations() {
    let temp_dir = TempDir::new().expect("can create temp dir");
    let database = Database::new(&temp_dir.path().join("test.db"))
        .await
        .expect("can create database");

    let tsv_path = temp_dir.path().join("sample.tsv");
    std::fs::write(
        &tsv_path,
        "contig_1\tcds\t1\t90\t+\tL1\tg1\tp1\n\
         contig_1\tcds\t100\t190\t+\tL2\tg2\tp2\n",
    )
    .expect("can write fixture");

    let first = import_file(database.clone(), tsv_path.clone(), 1000)
        .await
        .expect("first import succeeds");
    assert_eq!(first, 2);

    // Shrink the file and re-import: the annotation set must be replaced,
    // not appended to.
    std::fs::write(&tsv_path, "contig_1\tcds\t1\t90\t+\tL1\tg1\tp1\n")
        .expect("can rewrite fixture");

    let second = import_file(database.clone(), tsv_path, 1000)
        .await
        .expect("second import succeeds");
    assert_eq!(second, 1);

    let genome = database
        .get_genome("sample")
        .await
        .expect("can fetch genome")
        .expect("genome exists");
    assert_eq!(
        AnnotationQueries::count_for_genome(database.pool(), genome.id)
            .await
            .expect("can count"),
        1
    );
}
