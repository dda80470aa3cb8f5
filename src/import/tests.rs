use super::*;
use anyhow::anyhow;
use tempfile::TempDir;

#[test]
fn wildcard_patterns() {
    assert!(matches_pattern("sample1.tsv", "*.tsv"));
    assert!(matches_pattern("sample1.gff3", "*.gff3"));
    assert!(!matches_pattern("sample1.tsv", "*.gff3"));
    assert!(!matches_pattern("sample1.tsv.bak", "*.tsv"));

    assert!(matches_pattern("exact.json", "exact.json"));
    assert!(!matches_pattern("other.json", "exact.json"));

    assert!(matches_pattern("GCF_000005845.2.tsv", "GCF_*.tsv"));
    assert!(!matches_pattern("GCA_000005845.2.tsv", "GCF_*.tsv"));

    assert!(matches_pattern("anything-at-all", "*"));
    assert!(matches_pattern("a_sample_b.tsv", "*sample*.tsv"));

    // Case-sensitive, like the rest of the header matching.
    assert!(!matches_pattern("SAMPLE.TSV", "*.tsv"));
}

#[test]
fn discover_filters_and_sorts() {
    let temp_dir = TempDir::new().expect("can create temp dir");
    for name in ["b.tsv", "a.tsv", "c.gff3", "notes.txt"] {
        std::fs::write(temp_dir.path().join(name), "").expect("can write file");
    }
    std::fs::create_dir(temp_dir.path().join("nested.tsv")).expect("can create dir");

    let files = discover_files(temp_dir.path(), "*.tsv").expect("can discover");
    let names: Vec<_> = files
        .iter()
        .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
        .collect();
    assert_eq!(names, vec!["a.tsv", "b.tsv"]);
}

#[test]
fn discover_unreadable_folder_errors() {
    let temp_dir = TempDir::new().expect("can create temp dir");
    let missing = temp_dir.path().join("does-not-exist");
    assert!(discover_files(&missing, "*.tsv").is_err());
}

#[tokio::test]
async fn sequential_tally_counts_failures() {
    let files = vec![
        PathBuf::from("ok1.tsv"),
        PathBuf::from("bad.tsv"),
        PathBuf::from("ok2.tsv"),
    ];

    let summary = run_sequential(&files, |file| async move {
        if file.to_string_lossy().contains("bad") {
            Err(anyhow!("simulated failure"))
        } else {
            Ok(10)
        }
    })
    .await;

    assert_eq!(summary.files_found, 3);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.records, 20);
}

#[tokio::test]
async fn bounded_runs_complete_all_files() {
    let files: Vec<PathBuf> = (0..20).map(|i| PathBuf::from(format!("f{i}.json"))).collect();

    let summary = run_bounded(&files, 4, |file| async move {
        tokio::task::yield_now().await;
        if file.to_string_lossy().contains("f13") {
            Err(anyhow!("simulated failure"))
        } else {
            Ok(1)
        }
    })
    .await;

    assert_eq!(summary.files_found, 20);
    assert_eq!(summary.succeeded, 19);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.records, 19);
}
