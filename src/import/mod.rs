// Importers for the annotation formats written by the upstream pipeline.
// Each format owns its parsing and per-file driver; only the folder driver,
// the database session, and the bulk-insert builder are shared.

#[cfg(test)]
mod tests;

pub mod gff;
pub mod json;
pub mod tsv;

use std::future::Future;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use futures::StreamExt;
use indicatif::ProgressBar;
use tracing::{debug, error, info};

/// Outcome tally for one folder run. Per-file failures are logged and
/// counted; they never abort the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportSummary {
    pub files_found: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub records: u64,
}

impl ImportSummary {
    #[inline]
    pub fn new(files_found: usize) -> Self {
        Self {
            files_found,
            ..Self::default()
        }
    }
}

/// List files in `folder` whose names match `pattern` (shell-style `*`
/// wildcards), sorted by name. Subdirectories are not descended into.
#[inline]
pub fn discover_files(folder: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(folder)
        .with_context(|| format!("Failed to read folder: {}", folder.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to read entry in {}", folder.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if matches_pattern(name, pattern) {
            files.push(path);
        } else {
            debug!("Skipping {} (does not match {})", name, pattern);
        }
    }

    files.sort();
    Ok(files)
}

/// Shell-style wildcard match: `*` matches any run of characters, everything
/// else matches literally and case-sensitively.
#[inline]
pub fn matches_pattern(name: &str, pattern: &str) -> bool {
    if !pattern.contains('*') {
        return name == pattern;
    }

    let segments: Vec<&str> = pattern.split('*').collect();
    let mut remainder = name;

    for (i, segment) in segments.iter().enumerate() {
        if segment.is_empty() {
            continue;
        }
        if i == 0 {
            // Pattern does not start with '*': anchor at the beginning.
            match remainder.strip_prefix(segment) {
                Some(rest) => remainder = rest,
                None => return false,
            }
        } else if i == segments.len() - 1 {
            // Pattern does not end with '*': anchor at the end.
            return remainder.ends_with(segment);
        } else {
            match remainder.find(segment) {
                Some(pos) => remainder = &remainder[pos + segment.len()..],
                None => return false,
            }
        }
    }

    true
}

/// Process files one at a time. `import_file` returns the number of records
/// loaded for a committed file; an error means that file's transaction was
/// rolled back.
#[inline]
pub async fn run_sequential<F, Fut>(files: &[PathBuf], mut import_file: F) -> ImportSummary
where
    F: FnMut(PathBuf) -> Fut,
    Fut: Future<Output = Result<u64>>,
{
    let progress = ProgressBar::new(files.len() as u64);
    let mut summary = ImportSummary::new(files.len());

    for (i, file) in files.iter().enumerate() {
        info!(
            "[{}/{}] Processing {}",
            i + 1,
            files.len(),
            file.display()
        );
        record_outcome(&mut summary, file, import_file(file.clone()).await);
        progress.inc(1);
    }

    progress.finish_and_clear();
    summary
}

/// Process files with a fixed number in flight, joining on completion order.
#[inline]
pub async fn run_bounded<F, Fut>(
    files: &[PathBuf],
    concurrency: usize,
    import_file: F,
) -> ImportSummary
where
    F: Fn(PathBuf) -> Fut,
    Fut: Future<Output = Result<u64>>,
{
    let progress = ProgressBar::new(files.len() as u64);
    let mut summary = ImportSummary::new(files.len());

    let mut outcomes = futures::stream::iter(files.iter().cloned().map(|file| {
        let fut = import_file(file.clone());
        async move { (file, fut.await) }
    }))
    .buffer_unordered(concurrency.max(1));

    while let Some((file, result)) = outcomes.next().await {
        record_outcome(&mut summary, &file, result);
        progress.inc(1);
    }

    progress.finish_and_clear();
    summary
}

fn record_outcome(summary: &mut ImportSummary, file: &Path, result: Result<u64>) {
    match result {
        Ok(records) => {
            summary.succeeded += 1;
            summary.records += records;
        }
        Err(e) => {
            error!("Error processing {}: {:#}", file.display(), e);
            summary.failed += 1;
        }
    }
}
