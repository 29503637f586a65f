//! Batch processing: bounded fan-out over discovered files, then a
//! single-writer fold into the lookup table.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::error::PipelineError;
use crate::types::{ImageRecord, ImageTable, ProcessingStats};

use super::discovery::DiscoveredFile;
use super::processor::ImageProcessor;

/// Process every file with at most `parallel` in flight and build the table.
///
/// Fail-fast: the first error aborts the remaining tasks and is returned.
pub async fn process_batch(
    processor: &ImageProcessor,
    files: Vec<DiscoveredFile>,
    parallel: usize,
) -> Result<(ImageTable, ProcessingStats), PipelineError> {
    let start = Instant::now();
    let outcomes = run_bounded(files, parallel, |path| {
        let processor = processor.clone();
        async move { processor.process(&path).await }
    })
    .await?;

    let mut stats = ProcessingStats::default();
    let mut results: Vec<(PathBuf, ImageRecord)> = Vec::with_capacity(outcomes.len());
    for (path, (record, size)) in outcomes {
        stats.total_bytes += size;
        results.push((path, record));
    }

    // Completion order is arbitrary; fold in path order so a duplicate key
    // always resolves the same way.
    results.sort_by(|a, b| a.0.cmp(&b.0));
    let table = fold_records(results, &mut stats);

    stats.images = table.len();
    stats.elapsed = start.elapsed();
    Ok((table, stats))
}

/// Run `work` once per file on spawned tasks, holding one of `parallel`
/// semaphore permits for the whole of each call.
///
/// Outputs come back in completion order. The first error aborts every
/// task still queued or running.
async fn run_bounded<T, F, Fut>(
    files: Vec<DiscoveredFile>,
    parallel: usize,
    work: F,
) -> Result<Vec<(PathBuf, T)>, PipelineError>
where
    F: Fn(PathBuf) -> Fut,
    Fut: Future<Output = Result<T, PipelineError>> + Send + 'static,
    T: Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(parallel.max(1)));
    let mut tasks = JoinSet::new();

    for file in files {
        let semaphore = Arc::clone(&semaphore);
        let job = work(file.path.clone());
        tasks.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|e| PipelineError::Task(format!("semaphore closed: {e}")))?;
            let output = job.await?;
            Ok::<_, PipelineError>((file.path, output))
        });
    }

    let mut outputs = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        let outcome = joined.map_err(|e| PipelineError::Task(e.to_string()));
        match outcome.and_then(|inner| inner) {
            Ok(output) => outputs.push(output),
            Err(e) => {
                tracing::error!("Failed: {e}");
                tasks.abort_all();
                return Err(e);
            }
        }
    }
    Ok(outputs)
}

/// Insert records into a fresh table; later records win on duplicate keys.
fn fold_records(
    results: Vec<(PathBuf, ImageRecord)>,
    stats: &mut ProcessingStats,
) -> ImageTable {
    let mut table = ImageTable::new();
    for (path, record) in results {
        let key = record.asset_file_name.clone();
        if let Some(previous) = table.insert(record) {
            stats.duplicate_keys += 1;
            tracing::warn!(
                "Duplicate key {:?}: {:?} replaces the record for {:?}",
                key,
                path,
                previous.asset_full_file_name
            );
        }
    }
    table
}
